use chrono::{
  Datelike,
  NaiveDate
};
use herald_core::grid::CalendarCell;
use herald_core::reschedule::{
  DragStart,
  DropTarget
};
use web_sys::DragEvent;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

use super::{
  DragRequest,
  TaskPreview
};

/// Reads the transfer token written by the preview on drag start.
pub(super) fn transfer_token(
  event: &DragEvent
) -> Option<String> {
  event
    .data_transfer()
    .and_then(|data_transfer| {
      data_transfer
        .get_data("text/plain")
        .ok()
    })
    .map(|raw| raw.trim().to_string())
    .filter(|raw| !raw.is_empty())
}

#[derive(Properties, PartialEq)]
pub struct DayCellProps {
  pub cell:             CalendarCell,
  pub preview_limit:    usize,
  pub dragging_element: Option<String>,
  pub is_drop_hint:     bool,
  pub on_select:        Callback<NaiveDate>,
  pub on_drag_over:     Callback<NaiveDate>,
  pub on_drop: Callback<(
    DropTarget,
    Option<String>
  )>,
  pub on_drag_start:
    Callback<DragRequest, DragStart>,
  pub on_drag_end:      Callback<()>
}

#[function_component(DayCell)]
pub fn day_cell(
  props: &DayCellProps
) -> Html {
  let date = props.cell.date;

  let onclick = {
    let on_select =
      props.on_select.clone();
    Callback::from(move |_| {
      on_select.emit(date);
    })
  };

  let ondragover = {
    let on_drag_over =
      props.on_drag_over.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        if let Some(data_transfer) =
          event.data_transfer()
        {
          data_transfer
            .set_drop_effect("move");
        }
        on_drag_over.emit(date);
      }
    )
  };

  let ondragenter = {
    let on_drag_over =
      props.on_drag_over.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        on_drag_over.emit(date);
      }
    )
  };

  let ondrop = {
    let on_drop = props.on_drop.clone();
    Callback::from(
      move |event: DragEvent| {
        event.prevent_default();
        event.stop_propagation();
        on_drop.emit((
          DropTarget::Day(date),
          transfer_token(&event)
        ));
      }
    )
  };

  let count = props.cell.count();

  html! {
      <div
          class={classes!(
              "calendar-day",
              props.cell.is_today.then_some("today"),
              props.cell.is_selected.then_some("selected"),
              (count > 0).then_some("has-tasks"),
              props.is_drop_hint.then_some("drag-over")
          )}
          data-date={props.cell.iso.clone()}
          {onclick}
          {ondragover}
          {ondragenter}
          {ondrop}
      >
          <div class="calendar-day-number">{ date.day() }</div>
          {
              if count > 0 {
                  html! { <div class="calendar-day-count">{ count }</div> }
              } else {
                  html! {}
              }
          }
          {
              if count > 0 {
                  html! {
                      <div class="calendar-day-preview">
                          {
                              for props.cell.preview(props.preview_limit).iter().cloned().map(|task| {
                                  let element_key = format!("preview-{}-{}", props.cell.iso, task.id);
                                  html! {
                                      <TaskPreview
                                          key={element_key.clone()}
                                          is_dragging={props.dragging_element.as_deref() == Some(element_key.as_str())}
                                          element_key={element_key.clone()}
                                          task={task}
                                          on_drag_start={props.on_drag_start.clone()}
                                          on_drag_end={props.on_drag_end.clone()}
                                      />
                                  }
                              })
                          }
                      </div>
                  }
              } else {
                  html! {}
              }
          }
      </div>
  }
}
