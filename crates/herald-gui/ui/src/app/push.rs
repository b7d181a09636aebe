use gloo::events::EventListener;
use herald_core::feed::PushEvent;
use wasm_bindgen::JsCast;
use web_sys::{
  EventSource,
  MessageEvent
};
use yew::Callback;

/// Open server-sent events stream. Closing happens on drop.
pub struct PushSubscription {
  source:    EventSource,
  _message:  EventListener,
  _error:    EventListener
}

impl Drop for PushSubscription {
  fn drop(&mut self) {
    self.source.close();
    tracing::debug!("closed push feed");
  }
}

pub fn subscribe(
  url: &str,
  on_event: Callback<PushEvent>
) -> Option<PushSubscription> {
  let source = match EventSource::new(url) {
    | Ok(source) => source,
    | Err(error) => {
      tracing::error!(
        error = ?error,
        "failed opening push feed"
      );
      return None;
    }
  };

  let message = EventListener::new(
    &source,
    "message",
    move |event| {
      let Some(body) = event
        .dyn_ref::<MessageEvent>()
        .and_then(|message| {
          message.data().as_string()
        })
      else {
        return;
      };

      match PushEvent::parse(&body) {
        | Ok(push) => on_event.emit(push),
        | Err(error) => {
          tracing::warn!(
            error = %format!("{error:#}"),
            "ignoring unparsable push event"
          );
        }
      }
    }
  );

  // EventSource reconnects by itself.
  let error = EventListener::new(
    &source,
    "error",
    |_| {
      tracing::warn!(
        "push feed connection error"
      );
    }
  );

  tracing::info!("subscribed to push feed");
  Some(PushSubscription {
    source,
    _message: message,
    _error: error
  })
}
