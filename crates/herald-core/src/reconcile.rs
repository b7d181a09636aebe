use std::fmt;

use chrono::NaiveDateTime;
use serde_json::{
  Map,
  Value,
  json
};
use tracing::{
  error,
  info,
  warn
};

use crate::config::{
  CalendarConfig,
  fill_template
};
use crate::datetime::{
  format_clock,
  format_iso_day,
  format_schedule
};
use crate::normalize::is_truthy;
use crate::notice::Notice;
use crate::reschedule::RescheduleProposal;
use crate::store::CalendarStore;
use crate::task::{
  CanonicalTask,
  TaskId
};
use crate::transport::TaskTransport;

/// Fields of the raw record echoed back on update when truthy.
const ECHOED_FIELDS: [&str; 2] =
  ["config", "channel_config"];

/// Builds the update body for moving `task` to `target`.
pub fn build_update_payload(
  task: &CanonicalTask,
  target: NaiveDateTime
) -> Value {
  let Some(raw) = task.raw_object() else {
    warn!(
      task_id = %task.id,
      "raw task record is not an object; \
       sending canonical title only"
    );
    return json!({
      "scheduled_time": format_schedule(target),
      "title": task.title,
      "content": ""
    });
  };

  let mut payload = Map::new();
  payload.insert(
    "scheduled_time".to_string(),
    Value::String(format_schedule(target))
  );
  payload.insert(
    "title".to_string(),
    raw
      .get("title")
      .filter(|value| is_truthy(value))
      .cloned()
      .unwrap_or_else(|| {
        Value::String(task.title.clone())
      })
  );
  payload.insert(
    "content".to_string(),
    raw
      .get("content")
      .filter(|value| is_truthy(value))
      .cloned()
      .unwrap_or_else(|| {
        Value::String(String::new())
      })
  );
  for field in ECHOED_FIELDS {
    if let Some(value) = raw
      .get(field)
      .filter(|value| is_truthy(value))
    {
      payload.insert(
        field.to_string(),
        value.clone()
      );
    }
  }
  Value::Object(payload)
}

/// Reason text from an error body: `error`, then `message`.
pub fn rejection_reason(
  body: &str
) -> Option<String> {
  let parsed =
    serde_json::from_str::<Value>(body).ok()?;
  ["error", "message"].iter().find_map(
    |key| {
      parsed
        .get(*key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|reason| !reason.is_empty())
        .map(str::to_string)
    }
  )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescheduleError {
  /// Server answered non-2xx.
  Rejected { status: u16, reason: String },
  Transport(String)
}

impl fmt::Display for RescheduleError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Rejected {
        status,
        reason
      } => {
        write!(
          f,
          "update rejected ({status}): \
           {reason}"
        )
      }
      | Self::Transport(error) => {
        write!(f, "update failed: {error}")
      }
    }
  }
}

impl std::error::Error for RescheduleError {}

impl RescheduleError {
  pub fn reason(&self) -> &str {
    match self {
      | Self::Rejected { reason, .. }
      | Self::Transport(reason) => reason
    }
  }

  pub fn notice(
    &self,
    config: &CalendarConfig
  ) -> Notice {
    Notice::error(fill_template(
      &config.labels.move_failed,
      &[("reason", self.reason())]
    ))
  }
}

/// Acknowledgement of a persisted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReceipt {
  pub task_id:      TaskId,
  pub scheduled_at: NaiveDateTime
}

impl MoveReceipt {
  pub fn notice(
    &self,
    config: &CalendarConfig
  ) -> Notice {
    let date =
      format_iso_day(self.scheduled_at.date());
    let time = format_clock(self.scheduled_at);
    Notice::success(fill_template(
      &config.labels.moved,
      &[
        ("date", date.as_str()),
        ("time", time.as_str())
      ]
    ))
  }
}

/// Notice for a drop whose task can no longer be resolved.
pub fn stale_task_notice(
  config: &CalendarConfig
) -> Notice {
  Notice::error(
    config.labels.stale_task.clone()
  )
}

/// Sends a confirmed move upstream. On success the store cache is
/// invalidated so the next load refetches.
#[tracing::instrument(
  skip_all,
  fields(task_id = %proposal.task.id)
)]
pub async fn persist_move<T>(
  transport: &T,
  store: &CalendarStore,
  config: &CalendarConfig,
  proposal: &RescheduleProposal
) -> Result<MoveReceipt, RescheduleError>
where
  T: TaskTransport
{
  let path = config
    .update_path(proposal.task.id.as_str());
  let payload = build_update_payload(
    &proposal.task,
    proposal.to
  );

  let reply = transport
    .put_json(&path, &payload)
    .await
    .map_err(|error| {
      error!(
        path = %path,
        error = %error,
        "task update network error"
      );
      RescheduleError::Transport(format!(
        "{error:#}"
      ))
    })?;

  if !reply.is_success() {
    let reason = rejection_reason(
      &reply.body
    )
    .unwrap_or_else(|| {
      config.labels.update_failed.clone()
    });
    warn!(
      path = %path,
      status = reply.status,
      reason = %reason,
      "task update rejected"
    );
    return Err(RescheduleError::Rejected {
      status: reply.status,
      reason
    });
  }

  store.invalidate();
  info!(
    path = %path,
    scheduled_time = %format_schedule(proposal.to),
    "task rescheduled"
  );
  Ok(MoveReceipt {
    task_id:      proposal.task.id.clone(),
    scheduled_at: proposal.to
  })
}
