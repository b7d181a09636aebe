use chrono::NaiveDate;
use herald_core::config::CalendarConfig;
use herald_core::grid::{
  DayDetail,
  MonthCursor,
  MonthGrid,
  build_day_detail,
  initial_selection
};

const CALENDAR_CONFIG_TOML: &str =
  include_str!("../../assets/calendar.toml");

pub fn load_calendar_config()
-> CalendarConfig {
  CalendarConfig::from_toml_str(
    CALENDAR_CONFIG_TOML
  )
}

/// Detail panel for the selected day, if it is on the grid.
pub fn selected_detail(
  grid: &MonthGrid,
  config: &CalendarConfig
) -> Option<DayDetail> {
  grid
    .selected()
    .map(|cell| build_day_detail(cell, config))
}

/// Month and selection after navigating by `step` months. Today is
/// re-selected when it falls in the new month.
pub fn navigate(
  cursor: MonthCursor,
  step: i32,
  today: NaiveDate
) -> (MonthCursor, Option<NaiveDate>) {
  let next = if step < 0 {
    cursor.previous()
  } else {
    cursor.next()
  };
  (next, initial_selection(next, today))
}
