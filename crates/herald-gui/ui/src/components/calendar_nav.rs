use yew::{
  Callback,
  Html,
  MouseEvent,
  Properties,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct CalendarNavProps {
  pub label:      String,
  pub loading:    bool,
  pub on_prev:    Callback<MouseEvent>,
  pub on_next:    Callback<MouseEvent>,
  pub on_refresh: Callback<MouseEvent>
}

#[function_component(CalendarNav)]
pub fn calendar_nav(
  props: &CalendarNavProps
) -> Html {
  html! {
      <div class="calendar-header">
          <button class="btn calendar-nav-btn" type="button" onclick={props.on_prev.clone()}>{ "‹" }</button>
          <div class="calendar-month-label">{ &props.label }</div>
          <button class="btn calendar-nav-btn" type="button" onclick={props.on_next.clone()}>{ "›" }</button>
          <button
              class="btn calendar-refresh-btn"
              type="button"
              disabled={props.loading}
              onclick={props.on_refresh.clone()}
          >
              { "⟳" }
          </button>
      </div>
  }
}
