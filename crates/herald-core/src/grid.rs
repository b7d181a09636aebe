use std::collections::BTreeMap;

use chrono::{
  Datelike,
  Duration,
  NaiveDate
};
use tracing::debug;

use crate::config::{
  CalendarConfig,
  fill_template
};
use crate::datetime::{
  format_clock,
  format_iso_day
};
use crate::task::CanonicalTask;

/// Displayed month, with a zero-based month index.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct MonthCursor {
  year:   i32,
  month0: u32
}

impl MonthCursor {
  pub fn new(
    year: i32,
    month0: u32
  ) -> Option<Self> {
    (month0 < 12).then_some(Self {
      year,
      month0
    })
  }

  pub fn containing(day: NaiveDate) -> Self {
    Self {
      year:   day.year(),
      month0: day.month0()
    }
  }

  pub fn year(&self) -> i32 {
    self.year
  }

  pub fn month0(&self) -> u32 {
    self.month0
  }

  /// One-based month number.
  pub fn month(&self) -> u32 {
    self.month0 + 1
  }

  pub fn first_day(&self) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      self.year,
      self.month0 + 1,
      1
    )
    .unwrap_or(NaiveDate::MIN)
  }

  pub fn days_in_month(&self) -> u32 {
    let next = self.next().first_day();
    next
      .checked_sub_signed(Duration::days(1))
      .map(|last| last.day())
      .unwrap_or(28)
  }

  #[must_use]
  pub fn previous(self) -> Self {
    if self.month0 == 0 {
      Self {
        year:   self.year.saturating_sub(1),
        month0: 11
      }
    } else {
      Self {
        year:   self.year,
        month0: self.month0 - 1
      }
    }
  }

  #[must_use]
  pub fn next(self) -> Self {
    if self.month0 == 11 {
      Self {
        year:   self.year.saturating_add(1),
        month0: 0
      }
    } else {
      Self {
        year:   self.year,
        month0: self.month0 + 1
      }
    }
  }

  pub fn contains(
    &self,
    day: NaiveDate
  ) -> bool {
    day.year() == self.year
      && day.month0() == self.month0
  }
}

/// One day of the month with the tasks that fall on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell {
  pub date:        NaiveDate,
  pub iso:         String,
  pub tasks:       Vec<CanonicalTask>,
  pub is_today:    bool,
  pub is_selected: bool
}

impl CalendarCell {
  pub fn count(&self) -> usize {
    self.tasks.len()
  }

  /// The first `limit` tasks; the cell keeps the full list for the
  /// detail panel.
  pub fn preview(
    &self,
    limit: usize
  ) -> &[CanonicalTask] {
    &self.tasks
      [..self.tasks.len().min(limit)]
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GridCell {
  Blank,
  Day(CalendarCell)
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid {
  pub cursor:        MonthCursor,
  pub label:         String,
  pub weekdays:      Vec<String>,
  pub cells:         Vec<GridCell>,
  pub preview_limit: usize
}

impl MonthGrid {
  pub fn rows(
    &self
  ) -> impl Iterator<Item = &[GridCell]> {
    self.cells.chunks(7)
  }

  pub fn leading_blanks(&self) -> usize {
    self
      .cells
      .iter()
      .take_while(|cell| {
        matches!(cell, GridCell::Blank)
      })
      .count()
  }

  pub fn day(
    &self,
    date: NaiveDate
  ) -> Option<&CalendarCell> {
    self.cells.iter().find_map(|cell| {
      match cell {
        | GridCell::Day(day)
          if day.date == date =>
        {
          Some(day)
        }
        | _ => None
      }
    })
  }

  pub fn selected(
    &self
  ) -> Option<&CalendarCell> {
    self.cells.iter().find_map(|cell| {
      match cell {
        | GridCell::Day(day)
          if day.is_selected =>
        {
          Some(day)
        }
        | _ => None
      }
    })
  }
}

/// Day the view should open on: today, when it is inside the month.
pub fn initial_selection(
  cursor: MonthCursor,
  today: NaiveDate
) -> Option<NaiveDate> {
  cursor
    .contains(today)
    .then_some(today)
}

/// Lays out `cursor`'s month as a Sunday-first grid of whole weeks.
pub fn build_month_grid(
  cursor: MonthCursor,
  tasks: &[CanonicalTask],
  today: NaiveDate,
  selected: Option<NaiveDate>,
  config: &CalendarConfig
) -> MonthGrid {
  let first = cursor.first_day();
  let leading = first
    .weekday()
    .num_days_from_sunday()
    as usize;
  let total = cursor.days_in_month();

  let mut by_day: BTreeMap<
    NaiveDate,
    Vec<CanonicalTask>
  > = BTreeMap::new();
  for task in tasks {
    if cursor.contains(task.day()) {
      by_day
        .entry(task.day())
        .or_default()
        .push(task.clone());
    }
  }

  let mut cells = Vec::with_capacity(42);
  cells.extend(
    std::iter::repeat_n(
      GridCell::Blank,
      leading
    )
  );

  for offset in 0..total {
    let date = first
      + Duration::days(i64::from(offset));
    cells.push(GridCell::Day(
      CalendarCell {
        iso: format_iso_day(date),
        tasks: by_day
          .remove(&date)
          .unwrap_or_default(),
        is_today: date == today,
        is_selected: selected
          == Some(date),
        date
      }
    ));
  }

  while cells.len() % 7 != 0 {
    cells.push(GridCell::Blank);
  }

  debug!(
    year = cursor.year(),
    month = cursor.month0() + 1,
    cells = cells.len(),
    leading,
    tasks = tasks.len(),
    "built month grid"
  );

  MonthGrid {
    cursor,
    label: first
      .format(&config.labels.month_format)
      .to_string(),
    weekdays: config.labels.weekdays.clone(),
    cells,
    preview_limit: config
      .policies
      .preview_limit
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailRow {
  pub task:         CanonicalTask,
  pub time:         String,
  pub status_label: String
}

/// Contents of the day detail panel.
#[derive(Debug, Clone, PartialEq)]
pub struct DayDetail {
  pub date:    NaiveDate,
  pub heading: String,
  pub rows:    Vec<DetailRow>,
  /// Shown instead of rows when the day has no tasks.
  pub empty:   Option<String>
}

pub fn build_day_detail(
  cell: &CalendarCell,
  config: &CalendarConfig
) -> DayDetail {
  let mut tasks = cell.tasks.clone();
  tasks.sort_by_key(|task| {
    task.scheduled_at
  });

  let rows = tasks
    .into_iter()
    .map(|task| DetailRow {
      time:         format_clock(
        task.scheduled_at
      ),
      status_label: config
        .status_label(task.status.as_str())
        .to_string(),
      task
    })
    .collect::<Vec<_>>();

  DayDetail {
    date: cell.date,
    heading: fill_template(
      &config.labels.day_heading,
      &[("date", cell.iso.as_str())]
    ),
    empty: rows
      .is_empty()
      .then(|| config.labels.empty_day.clone()),
    rows
  }
}
