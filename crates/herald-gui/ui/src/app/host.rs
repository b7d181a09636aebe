use herald_core::reschedule::ConfirmRequest;
use wasm_bindgen::{
  JsCast,
  JsValue
};

/// Global the host page registers its task editor under.
const EDITOR_HOOK: &str = "openEditTaskModal";

/// Hands a task id to the page's edit dialog. Returns false when the
/// page has no editor.
pub fn open_task_editor(task_id: &str) -> bool {
  let Some(window) = web_sys::window() else {
    return false;
  };

  let hook = js_sys::Reflect::get(
    window.as_ref(),
    &JsValue::from_str(EDITOR_HOOK)
  )
  .ok()
  .and_then(|value| {
    value
      .dyn_into::<js_sys::Function>()
      .ok()
  });

  let Some(hook) = hook else {
    tracing::warn!(
      task_id,
      "no task editor registered on the \
       host page"
    );
    return false;
  };

  match hook.call1(
    &JsValue::NULL,
    &JsValue::from_str(task_id)
  ) {
    | Ok(_) => true,
    | Err(error) => {
      tracing::error!(
        task_id,
        error = ?error,
        "task editor hook threw"
      );
      false
    }
  }
}

/// Blocking `window.confirm` with the request's message.
pub fn native_confirm(
  request: &ConfirmRequest
) -> bool {
  gloo::dialogs::confirm(&request.message)
}
