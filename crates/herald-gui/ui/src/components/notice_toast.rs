use herald_core::notice::Notice;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

/// A notice plus the sequence number its dismiss timer is keyed on.
#[derive(Clone, PartialEq)]
pub struct Toast {
  pub id:     u64,
  pub notice: Notice
}

#[derive(Properties, PartialEq)]
pub struct NoticeToastProps {
  pub toast:      Option<Toast>,
  pub on_dismiss: Callback<u64>
}

#[function_component(NoticeToast)]
pub fn notice_toast(
  props: &NoticeToastProps
) -> Html {
  let Some(toast) = props.toast.as_ref()
  else {
    return html! {};
  };

  let id = toast.id;
  let on_dismiss = props.on_dismiss.clone();

  html! {
      <div
          class={classes!("notification", toast.notice.kind.as_class())}
          onclick={Callback::from(move |_| on_dismiss.emit(id))}
      >
          { &toast.notice.message }
      </div>
  }
}
