use herald_core::grid::DayDetail;
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct DayPanelProps {
  pub detail:  Option<DayDetail>,
  pub on_open: Callback<String>
}

#[function_component(DayPanel)]
pub fn day_panel(
  props: &DayPanelProps
) -> Html {
  let Some(detail) = props.detail.as_ref()
  else {
    return html! {};
  };

  html! {
      <div class="calendar-day-list">
          <h4>{ &detail.heading }</h4>
          {
              match detail.empty.as_ref() {
                  | Some(message) => html! {
                      <div class="empty-state">{ message }</div>
                  },
                  | None => html! {
                      <ul class="day-task-list">
                          {
                              for detail.rows.iter().map(|row| {
                                  let task_id = row.task.id.to_string();
                                  let on_open = props.on_open.clone();
                                  html! {
                                      <li
                                          class={classes!("day-task", row.task.status.css_class())}
                                          onclick={Callback::from(move |_| on_open.emit(task_id.clone()))}
                                      >
                                          <span class="day-task-time">{ &row.time }</span>
                                          <span class="day-task-title">{ &row.task.title }</span>
                                          <span class="day-task-status">{ &row.status_label }</span>
                                          {
                                              if row.task.is_recurring {
                                                  html! { <span class="badge recurring">{ "↻" }</span> }
                                              } else {
                                                  html! {}
                                              }
                                          }
                                      </li>
                                  }
                              })
                          }
                      </ul>
                  }
              }
          }
      </div>
  }
}
