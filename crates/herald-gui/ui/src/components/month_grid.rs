use chrono::NaiveDate;
use herald_core::grid::{
  GridCell,
  MonthGrid
};
use herald_core::reschedule::{
  DragStart,
  DropTarget
};
use web_sys::DragEvent;
use yew::{
  Callback,
  Html,
  Properties,
  function_component,
  html
};

use super::day_cell::transfer_token;
use super::{
  DayCell,
  DragRequest
};

#[derive(Properties, PartialEq)]
pub struct MonthGridViewProps {
  pub grid:             MonthGrid,
  pub dragging_element: Option<String>,
  pub drag_over:        Option<NaiveDate>,
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

fn render_blank(
  on_drop: Callback<(
    DropTarget,
    Option<String>
  )>
) -> Html {
  let ondragover =
    Callback::from(|event: DragEvent| {
      event.prevent_default();
    });
  let ondrop = Callback::from(
    move |event: DragEvent| {
      event.prevent_default();
      event.stop_propagation();
      on_drop.emit((
        DropTarget::Blank,
        transfer_token(&event)
      ));
    }
  );

  html! {
      <div class="calendar-day empty" {ondragover} {ondrop}></div>
  }
}

#[function_component(MonthGridView)]
pub fn month_grid_view(
  props: &MonthGridViewProps
) -> Html {
  let grid = &props.grid;

  html! {
      <div class="calendar-grid">
          <div class="calendar-row calendar-weekdays">
              {
                  for grid.weekdays.iter().map(|label| html! {
                      <div class="calendar-weekday">{ label }</div>
                  })
              }
          </div>
          {
              for grid.rows().map(|row| html! {
                  <div class="calendar-row">
                      {
                          for row.iter().map(|cell| match cell {
                              | GridCell::Blank => render_blank(props.on_drop.clone()),
                              | GridCell::Day(day) => html! {
                                  <DayCell
                                      cell={day.clone()}
                                      preview_limit={grid.preview_limit}
                                      dragging_element={props.dragging_element.clone()}
                                      is_drop_hint={props.drag_over == Some(day.date)}
                                      on_select={props.on_select.clone()}
                                      on_drag_over={props.on_drag_over.clone()}
                                      on_drop={props.on_drop.clone()}
                                      on_drag_start={props.on_drag_start.clone()}
                                      on_drag_end={props.on_drag_end.clone()}
                                  />
                              }
                          })
                      }
                  </div>
              })
          }
      </div>
  }
}
