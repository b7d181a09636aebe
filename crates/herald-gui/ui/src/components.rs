mod calendar_nav;
mod confirm_modal;
mod day_cell;
mod day_panel;
mod month_grid;
mod notice_toast;
mod task_preview;

pub use calendar_nav::CalendarNav;
pub use confirm_modal::ConfirmModal;
pub use day_cell::DayCell;
pub use day_panel::DayPanel;
pub use month_grid::MonthGridView;
pub use notice_toast::{
  NoticeToast,
  Toast
};
pub use task_preview::{
  DragRequest,
  TaskPreview
};
