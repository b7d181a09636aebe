use herald_core::reschedule::DragStart;
use herald_core::task::CanonicalTask;
use web_sys::DragEvent;
use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  classes,
  function_component,
  html
};

/// What a preview entry reports when the user starts dragging it.
#[derive(Clone, PartialEq)]
pub struct DragRequest {
  pub task_id:          String,
  pub marked_draggable: bool,
  pub element_key:      String
}

#[derive(Properties, PartialEq)]
pub struct TaskPreviewProps {
  pub task:          CanonicalTask,
  pub element_key:   String,
  pub is_dragging:   bool,
  pub on_drag_start:
    Callback<DragRequest, DragStart>,
  pub on_drag_end:   Callback<()>
}

#[function_component(TaskPreview)]
pub fn task_preview(
  props: &TaskPreviewProps
) -> Html {
  let draggable = props.task.is_draggable();
  let request = DragRequest {
    task_id:          props
      .task
      .id
      .to_string(),
    marked_draggable: draggable,
    element_key:      props
      .element_key
      .clone()
  };

  let ondragstart = {
    let on_drag_start =
      props.on_drag_start.clone();
    Callback::from(
      move |event: DragEvent| {
        event.stop_propagation();
        match on_drag_start
          .emit(request.clone())
        {
          | DragStart::Started { token } => {
            if let Some(data_transfer) =
              event.data_transfer()
            {
              let _ = data_transfer
                .set_data(
                  "text/plain",
                  &token
                );
              data_transfer
                .set_effect_allowed("move");
            }
          }
          | DragStart::Refused(_) => {
            event.prevent_default();
          }
        }
      }
    )
  };

  let ondragend = {
    let on_drag_end =
      props.on_drag_end.clone();
    Callback::from(move |_| {
      on_drag_end.emit(());
    })
  };

  // Grabbing a movable entry must not select the day underneath.
  let onclick =
    Callback::from(move |event: MouseEvent| {
      if draggable {
        event.stop_propagation();
      }
    });

  html! {
      <div
          class={classes!(
              "task-item",
              props.task.status.css_class(),
              props.task.is_recurring.then_some("recurring"),
              draggable.then_some("draggable"),
              props.is_dragging.then_some("dragging")
          )}
          title={props.task.title.clone()}
          draggable={if draggable { "true" } else { "false" }}
          data-task-id={props.task.id.to_string()}
          {ondragstart}
          {ondragend}
          {onclick}
      >
          { &props.task.title }
      </div>
  }
}
