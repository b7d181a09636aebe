use std::fmt;

use chrono::{
  NaiveDate,
  NaiveDateTime
};
use serde::{
  Deserialize,
  Serialize
};
use serde_json::Value;

/// Opaque task identifier, held as received (numbers are stringified).
#[derive(
  Debug,
  Clone,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Default,
)]
pub struct TaskId(String);

impl TaskId {
  pub fn new(raw: impl Into<String>) -> Self {
    Self(raw.into())
  }

  pub fn from_value(
    value: &Value
  ) -> Option<Self> {
    match value {
      | Value::String(raw) => {
        Some(Self(raw.clone()))
      }
      | Value::Number(number) => {
        Some(Self(number.to_string()))
      }
      | Value::Bool(flag) => {
        Some(Self(flag.to_string()))
      }
      | _ => None
    }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for TaskId {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(
  Debug, Clone, PartialEq, Eq, Hash,
)]
pub enum TaskStatus {
  Pending,
  Sent,
  Failed,
  Cancelled,
  Paused,
  /// Upstream sent a status this client does not know; shown verbatim.
  Other(String),
  /// No status field at all.
  Unset
}

impl TaskStatus {
  pub fn parse(raw: &str) -> Self {
    let lowered = raw.to_lowercase();
    match lowered.as_str() {
      | "" => Self::Unset,
      | "pending" => Self::Pending,
      | "sent" => Self::Sent,
      | "failed" => Self::Failed,
      | "cancelled" => Self::Cancelled,
      | "paused" => Self::Paused,
      | _ => Self::Other(lowered)
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      | Self::Pending => "pending",
      | Self::Sent => "sent",
      | Self::Failed => "failed",
      | Self::Cancelled => "cancelled",
      | Self::Paused => "paused",
      | Self::Other(raw) => raw.as_str(),
      | Self::Unset => ""
    }
  }

  /// CSS class for previews and detail rows. An unset status is styled
  /// like a pending one.
  pub fn css_class(&self) -> String {
    match self {
      | Self::Unset => {
        "status-pending".to_string()
      }
      | other => {
        format!("status-{}", other.as_str())
      }
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Normalized view of one upstream task record.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTask {
  pub id:           TaskId,
  pub title:        String,
  pub scheduled_at: NaiveDateTime,
  pub status:       TaskStatus,
  pub is_recurring: bool,
  pub raw_source:   Value
}

impl CanonicalTask {
  /// Only one-off tasks that have not fired yet may be moved.
  pub fn is_draggable(&self) -> bool {
    !self.is_recurring
      && self.status == TaskStatus::Pending
  }

  pub fn day(&self) -> NaiveDate {
    self.scheduled_at.date()
  }

  /// Raw record as an object, when the upstream shape allows it.
  pub fn raw_object(
    &self
  ) -> Option<&serde_json::Map<String, Value>>
  {
    self.raw_source.as_object()
  }
}

pub fn find_task<'a>(
  tasks: &'a [CanonicalTask],
  id: &str
) -> Option<&'a CanonicalTask> {
  tasks
    .iter()
    .find(|task| task.id.as_str() == id)
}
