use herald_core::reschedule::ConfirmRequest;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct ConfirmModalProps {
  pub request:   Option<ConfirmRequest>,
  pub busy:      bool,
  pub on_accept: Callback<MouseEvent>,
  pub on_cancel: Callback<MouseEvent>
}

#[function_component(ConfirmModal)]
pub fn confirm_modal(
  props: &ConfirmModalProps
) -> Html {
  let Some(request) = props.request.as_ref()
  else {
    return html! {};
  };

  html! {
      <div class="modal-backdrop" onclick={props.on_cancel.clone()}>
          <div class="modal modal-sm confirm-dialog" onclick={Callback::from(|e: MouseEvent| e.stop_propagation())}>
              <div class="header">{ &request.title }</div>
              <div class="content">
                  {
                      for request.message.split('\n').map(|line| html! {
                          <div class="confirm-line">{ line }</div>
                      })
                  }
              </div>
              <div class="footer">
                  <button
                      class="btn"
                      type="button"
                      disabled={props.busy}
                      onclick={props.on_cancel.clone()}
                  >
                      { &request.cancel_label }
                  </button>
                  <button
                      class="btn primary"
                      type="button"
                      disabled={props.busy}
                      onclick={props.on_accept.clone()}
                  >
                      { &request.accept_label }
                  </button>
              </div>
          </div>
      </div>
  }
}
