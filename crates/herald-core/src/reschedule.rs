use std::fmt;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use tracing::{
  debug,
  info,
  warn
};

use crate::config::{
  CalendarConfig,
  fill_template
};
use crate::datetime::{
  format_clock,
  format_iso_day
};
use crate::task::{
  CanonicalTask,
  find_task
};

const TOKEN_PREFIX: &str = "herald-drag";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default,
)]
pub enum DragPhase {
  #[default]
  Idle,
  Dragging,
  AwaitingConfirmation,
  Submitting
}

/// Immutable record of one drag gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
  pub id:          u64,
  pub task:        CanonicalTask,
  pub element_key: String
}

impl DragSession {
  /// Payload written to the `DataTransfer` on drag start.
  pub fn token(&self) -> String {
    format!(
      "{TOKEN_PREFIX}:{}:{}",
      self.id, self.task.id
    )
  }
}

/// Splits a transfer token into session id and task id.
pub fn parse_token(
  raw: &str
) -> Option<(u64, &str)> {
  let mut parts = raw.splitn(3, ':');
  if parts.next()? != TOKEN_PREFIX {
    return None;
  }
  let session = parts.next()?.parse().ok()?;
  let task_id = parts.next()?;
  Some((session, task_id))
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DragRefusal {
  NotMarkedDraggable,
  UnknownTask,
  NotReschedulable,
  Busy
}

impl fmt::Display for DragRefusal {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let text = match self {
      | Self::NotMarkedDraggable => {
        "element is not draggable"
      }
      | Self::UnknownTask => {
        "task is not in the snapshot"
      }
      | Self::NotReschedulable => {
        "task is recurring or not pending"
      }
      | Self::Busy => {
        "another reschedule is in flight"
      }
    };
    f.write_str(text)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragStart {
  Started { token: String },
  Refused(DragRefusal)
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DropTarget {
  Day(NaiveDate),
  Blank
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum InvalidDrop {
  NoSession,
  BlankCell,
  Busy
}

#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
  Proposed(RescheduleProposal),
  SameDay,
  Invalid(InvalidDrop),
  /// The transfer token names a session this controller no longer
  /// holds; the page needs a refresh.
  MissingTaskData
}

/// A move waiting for the user's confirmation.
#[derive(Debug, Clone, PartialEq)]
pub struct RescheduleProposal {
  pub session_id: u64,
  pub task:       CanonicalTask,
  pub from:       NaiveDateTime,
  pub to:         NaiveDateTime
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmRequest {
  pub title:        String,
  pub message:      String,
  pub accept_label: String,
  pub cancel_label: String
}

impl RescheduleProposal {
  fn new(
    session: &DragSession,
    target: NaiveDate
  ) -> Self {
    let from = session.task.scheduled_at;
    Self {
      session_id: session.id,
      task: session.task.clone(),
      from,
      to: target.and_time(from.time())
    }
  }

  pub fn confirm_request(
    &self,
    config: &CalendarConfig
  ) -> ConfirmRequest {
    let labels = &config.labels;
    let from = format_iso_day(self.from.date());
    let to = format_iso_day(self.to.date());
    let time = format_clock(self.to);

    ConfirmRequest {
      title:        labels.confirm_title.clone(),
      message:      fill_template(
        &labels.confirm_message,
        &[
          ("title", self.task.title.as_str()),
          ("from", from.as_str()),
          ("to", to.as_str()),
          ("time", time.as_str())
        ]
      ),
      accept_label: labels
        .confirm_accept
        .clone(),
      cancel_label: labels
        .confirm_cancel
        .clone()
    }
  }
}

/// State machine for one drag-to-reschedule gesture at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RescheduleController {
  phase:           DragPhase,
  session:         Option<DragSession>,
  active:          bool,
  dragged_element: Option<String>,
  pending:         Option<RescheduleProposal>,
  next_session:    u64
}

impl RescheduleController {
  pub fn phase(&self) -> DragPhase {
    self.phase
  }

  pub fn session(
    &self
  ) -> Option<&DragSession> {
    self.session.as_ref()
  }

  /// True between drag start and drag end.
  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn dragged_element(
    &self
  ) -> Option<&str> {
    self.dragged_element.as_deref()
  }

  pub fn pending(
    &self
  ) -> Option<&RescheduleProposal> {
    self.pending.as_ref()
  }

  fn is_busy(&self) -> bool {
    matches!(
      self.phase,
      DragPhase::AwaitingConfirmation
        | DragPhase::Submitting
    )
  }

  fn admit<'a>(
    &self,
    task_id: &str,
    marked_draggable: bool,
    snapshot: &'a [CanonicalTask]
  ) -> Result<&'a CanonicalTask, DragRefusal> {
    if self.is_busy() {
      return Err(DragRefusal::Busy);
    }
    if !marked_draggable {
      return Err(
        DragRefusal::NotMarkedDraggable
      );
    }
    let task = find_task(snapshot, task_id)
      .ok_or(DragRefusal::UnknownTask)?;
    if !task.is_draggable() {
      return Err(
        DragRefusal::NotReschedulable
      );
    }
    Ok(task)
  }

  pub fn begin_drag(
    &mut self,
    task_id: &str,
    marked_draggable: bool,
    element_key: &str,
    snapshot: &[CanonicalTask]
  ) -> DragStart {
    let task = match self.admit(
      task_id,
      marked_draggable,
      snapshot
    ) {
      | Ok(task) => task,
      | Err(refusal) => {
        debug!(
          task_id,
          %refusal,
          "drag refused"
        );
        return DragStart::Refused(refusal);
      }
    };

    self.next_session =
      self.next_session.wrapping_add(1);
    let session = DragSession {
      id:          self.next_session,
      task:        task.clone(),
      element_key: element_key.to_string()
    };
    let token = session.token();
    debug!(
      task_id,
      session = session.id,
      "drag started"
    );

    self.phase = DragPhase::Dragging;
    self.active = true;
    self.dragged_element =
      Some(element_key.to_string());
    self.session = Some(session);
    self.pending = None;
    DragStart::Started { token }
  }

  /// Drag end clears the visual markers only. The session stays so a
  /// drop delivered after drag end still resolves; `cancel` retires it
  /// when none arrives.
  pub fn end_drag(
    &mut self
  ) -> Option<String> {
    self.active = false;
    self.dragged_element.take()
  }

  pub fn drop_on(
    &mut self,
    target: DropTarget,
    transfer_token: Option<&str>
  ) -> DropOutcome {
    if self.is_busy() {
      return DropOutcome::Invalid(
        InvalidDrop::Busy
      );
    }

    let held = self.session.clone();
    let parsed = match transfer_token {
      | Some(raw) => match parse_token(raw) {
        | Some(parsed) => Some(parsed),
        | None => {
          debug!("drop carries a foreign payload");
          self.settle();
          return DropOutcome::Invalid(
            InvalidDrop::NoSession
          );
        }
      },
      | None => None
    };
    let session = match parsed {
      | Some((id, task_id)) => match held {
        | Some(held) if held.id == id => held,
        | _ => {
          warn!(
            session = id,
            task_id,
            "drop names an unknown drag \
             session"
          );
          self.settle();
          return DropOutcome::MissingTaskData;
        }
      },
      | None => match held {
        | Some(held) => held,
        | None => {
          self.settle();
          return DropOutcome::Invalid(
            InvalidDrop::NoSession
          );
        }
      }
    };

    let target = match target {
      | DropTarget::Day(day) => day,
      | DropTarget::Blank => {
        self.settle();
        return DropOutcome::Invalid(
          InvalidDrop::BlankCell
        );
      }
    };

    if target == session.task.day() {
      debug!(
        task_id = %session.task.id,
        "dropped on the same day"
      );
      self.settle();
      return DropOutcome::SameDay;
    }

    let proposal =
      RescheduleProposal::new(&session, target);
    info!(
      task_id = %proposal.task.id,
      from = %proposal.from,
      to = %proposal.to,
      "reschedule proposed"
    );
    self.phase =
      DragPhase::AwaitingConfirmation;
    self.pending = Some(proposal.clone());
    DropOutcome::Proposed(proposal)
  }

  /// Cancels the gesture `session` if no drop moved it past dragging.
  /// Called once the drag-end event has been followed by every drop it
  /// could produce.
  pub fn cancel(
    &mut self,
    session: u64
  ) -> bool {
    let held = self
      .session
      .as_ref()
      .map(|held| held.id);
    if self.phase != DragPhase::Dragging
      || held != Some(session)
    {
      return false;
    }
    debug!(session, "drag cancelled");
    self.settle();
    true
  }

  /// User declined the confirmation.
  pub fn decline(&mut self) -> bool {
    if self.phase
      != DragPhase::AwaitingConfirmation
    {
      return false;
    }
    debug!("reschedule declined");
    self.settle();
    true
  }

  /// User accepted; the returned proposal goes to the update endpoint.
  pub fn confirm(
    &mut self
  ) -> Option<RescheduleProposal> {
    if self.phase
      != DragPhase::AwaitingConfirmation
    {
      return None;
    }
    let proposal = self.pending.clone()?;
    self.phase = DragPhase::Submitting;
    Some(proposal)
  }

  /// Returns to idle whatever the outcome.
  pub fn settle(&mut self) {
    self.phase = DragPhase::Idle;
    self.session = None;
    self.active = false;
    self.dragged_element = None;
    self.pending = None;
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::task::{
    TaskId,
    TaskStatus
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn task(
    id: &str,
    status: TaskStatus,
    is_recurring: bool
  ) -> CanonicalTask {
    CanonicalTask {
      id: TaskId::new(id),
      title: "周报提醒".to_string(),
      scheduled_at: date(2024, 3, 5)
        .and_hms_opt(9, 30, 0)
        .expect("valid time"),
      status,
      is_recurring,
      raw_source: json!({ "id": id })
    }
  }

  fn snapshot() -> Vec<CanonicalTask> {
    vec![
      task("1", TaskStatus::Pending, false),
      task("2", TaskStatus::Sent, false),
      task("3", TaskStatus::Pending, true),
    ]
  }

  fn started(
    controller: &mut RescheduleController
  ) -> String {
    match controller.begin_drag(
      "1",
      true,
      "preview-1",
      &snapshot()
    ) {
      | DragStart::Started { token } => token,
      | other => {
        panic!("expected start, got {other:?}")
      }
    }
  }

  #[test]
  fn drag_end_before_drop_still_resolves() {
    let mut controller =
      RescheduleController::default();
    let token = started(&mut controller);

    assert_eq!(
      controller.end_drag().as_deref(),
      Some("preview-1")
    );
    assert!(!controller.is_active());
    assert!(controller.session().is_some());

    let outcome = controller.drop_on(
      DropTarget::Day(date(2024, 3, 9)),
      Some(&token)
    );
    let DropOutcome::Proposed(proposal) =
      outcome
    else {
      panic!("expected proposal, got {outcome:?}");
    };
    assert_eq!(proposal.task.id.as_str(), "1");
    assert_eq!(
      proposal.to,
      date(2024, 3, 9)
        .and_hms_opt(9, 30, 0)
        .expect("valid time")
    );
    assert_eq!(
      controller.phase(),
      DragPhase::AwaitingConfirmation
    );
  }

  #[test]
  fn cancelled_drag_ignores_foreign_drops() {
    let mut controller =
      RescheduleController::default();
    started(&mut controller);
    controller.end_drag();

    assert_eq!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some("hello world")
      ),
      DropOutcome::Invalid(
        InvalidDrop::NoSession
      )
    );
    assert_eq!(
      controller.phase(),
      DragPhase::Idle
    );
    assert!(controller.session().is_none());
  }

  #[test]
  fn drag_end_without_drop_cancels_to_idle() {
    let mut controller =
      RescheduleController::default();
    started(&mut controller);
    let session = controller
      .session()
      .map(|session| session.id)
      .expect("held session");
    controller.end_drag();

    assert!(controller.cancel(session));
    assert_eq!(
      controller.phase(),
      DragPhase::Idle
    );
    assert!(!controller.cancel(session));
    assert_eq!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        None
      ),
      DropOutcome::Invalid(
        InvalidDrop::NoSession
      )
    );

    let token = started(&mut controller);
    assert!(!controller.cancel(session));
    assert!(matches!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some(&token)
      ),
      DropOutcome::Proposed(_)
    ));
  }

  #[test]
  fn cancel_after_a_proposal_is_ignored() {
    let mut controller =
      RescheduleController::default();
    let token = started(&mut controller);
    let session = controller
      .session()
      .map(|session| session.id)
      .expect("held session");
    controller.drop_on(
      DropTarget::Day(date(2024, 3, 9)),
      Some(&token)
    );
    controller.end_drag();

    assert!(!controller.cancel(session));
    assert_eq!(
      controller.phase(),
      DragPhase::AwaitingConfirmation
    );
  }

  #[test]
  fn drop_without_token_uses_held_session() {
    let mut controller =
      RescheduleController::default();
    started(&mut controller);
    assert!(matches!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 7)),
        None
      ),
      DropOutcome::Proposed(_)
    ));
  }

  #[test]
  fn refusals_leave_controller_idle() {
    let mut controller =
      RescheduleController::default();
    let cases = [
      ("1", false, DragRefusal::NotMarkedDraggable),
      ("9", true, DragRefusal::UnknownTask),
      ("2", true, DragRefusal::NotReschedulable),
      ("3", true, DragRefusal::NotReschedulable)
    ];
    for (id, marked, refusal) in cases {
      assert_eq!(
        controller.begin_drag(
          id,
          marked,
          "el",
          &snapshot()
        ),
        DragStart::Refused(refusal)
      );
      assert_eq!(
        controller.phase(),
        DragPhase::Idle
      );
    }
  }

  #[test]
  fn same_day_and_blank_drops_reset() {
    let mut controller =
      RescheduleController::default();
    let token = started(&mut controller);
    assert_eq!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 5)),
        Some(&token)
      ),
      DropOutcome::SameDay
    );
    assert_eq!(
      controller,
      RescheduleController {
        next_session: 1,
        ..RescheduleController::default()
      }
    );

    let token = started(&mut controller);
    assert_eq!(
      controller.drop_on(
        DropTarget::Blank,
        Some(&token)
      ),
      DropOutcome::Invalid(
        InvalidDrop::BlankCell
      )
    );
    assert!(controller.session().is_none());
  }

  #[test]
  fn foreign_session_token_is_missing_data() {
    let mut controller =
      RescheduleController::default();
    let stale = started(&mut controller);
    controller.settle();
    let _fresh = started(&mut controller);

    assert_eq!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some(&stale)
      ),
      DropOutcome::MissingTaskData
    );
    assert_eq!(
      controller.phase(),
      DragPhase::Idle
    );
  }

  #[test]
  fn drop_with_nothing_held_is_invalid() {
    let mut controller =
      RescheduleController::default();
    assert_eq!(
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some("plain text")
      ),
      DropOutcome::Invalid(
        InvalidDrop::NoSession
      )
    );
  }

  #[test]
  fn confirmation_flow() {
    let config = CalendarConfig::default();
    let mut controller =
      RescheduleController::default();
    let token = started(&mut controller);
    let DropOutcome::Proposed(proposal) =
      controller.drop_on(
        DropTarget::Day(date(2024, 3, 9)),
        Some(&token)
      )
    else {
      panic!("expected proposal");
    };

    let request =
      proposal.confirm_request(&config);
    assert_eq!(
      request.title,
      "确认调整任务日期"
    );
    assert_eq!(
      request.message,
      "将任务「周报提醒」\n\n从 2024-03-05 → \
       2024-03-09\n\n⏰ 时间保持：09:30"
    );
    assert_eq!(request.accept_label, "确认调整");
    assert_eq!(request.cancel_label, "取消");

    assert_eq!(
      controller.begin_drag(
        "1",
        true,
        "preview-1",
        &snapshot()
      ),
      DragStart::Refused(DragRefusal::Busy)
    );

    assert_eq!(
      controller.confirm(),
      Some(proposal)
    );
    assert_eq!(
      controller.phase(),
      DragPhase::Submitting
    );
    assert!(!controller.decline());
    controller.settle();
    assert_eq!(
      controller.phase(),
      DragPhase::Idle
    );
  }

  #[test]
  fn declining_returns_to_idle() {
    let mut controller =
      RescheduleController::default();
    let token = started(&mut controller);
    controller.drop_on(
      DropTarget::Day(date(2024, 3, 1)),
      Some(&token)
    );
    assert!(controller.decline());
    assert!(controller.pending().is_none());
    assert_eq!(controller.confirm(), None);
  }

  #[test]
  fn tokens_round_trip_ids_with_colons() {
    assert_eq!(
      parse_token("herald-drag:4:a:b"),
      Some((4, "a:b"))
    );
    assert_eq!(parse_token("drag:4:a"), None);
  }
}
