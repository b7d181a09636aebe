use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{
  CalendarConfig,
  fill_template
};
use crate::notice::Notice;

#[derive(Debug, Deserialize)]
struct RawEvent {
  #[serde(rename = "type", default)]
  kind:    String,
  #[serde(default)]
  title:   Option<Value>,
  #[serde(default)]
  status:  Option<String>,
  #[serde(default)]
  message: Option<Value>
}

fn text(value: Option<Value>) -> String {
  match value {
    | Some(Value::String(raw)) => raw,
    | Some(Value::Null) | None => {
      String::new()
    }
    | Some(other) => other.to_string()
  }
}

/// One message from the server-sent events stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
  TaskExecuted {
    title:   String,
    status:  String,
    message: String
  },
  CalendarSynced {
    message: String
  },
  Other(String)
}

impl PushEvent {
  pub fn parse(body: &str) -> anyhow::Result<Self> {
    let raw: RawEvent =
      serde_json::from_str(body)
        .context("decoding push event")?;

    Ok(match raw.kind.as_str() {
      | "task_executed" => {
        Self::TaskExecuted {
          title:   text(raw.title),
          status:  raw
            .status
            .unwrap_or_default(),
          message: text(raw.message)
        }
      }
      | "calendar_synced" => {
        Self::CalendarSynced {
          message: text(raw.message)
        }
      }
      | _ => Self::Other(raw.kind)
    })
  }

  /// Both known events change the task set.
  pub fn invalidates_calendar(&self) -> bool {
    !matches!(self, Self::Other(_))
  }

  pub fn notice(
    &self,
    config: &CalendarConfig
  ) -> Option<Notice> {
    let labels = &config.labels;
    match self {
      | Self::TaskExecuted {
        title,
        status,
        message
      } => {
        let sent = status == "sent";
        let text = fill_template(
          &labels.task_executed,
          &[
            ("icon", if sent { "✅" } else { "❌" }),
            ("title", title.as_str()),
            ("message", message.as_str())
          ]
        );
        Some(if sent {
          Notice::success(text)
        } else {
          Notice::error(text)
        })
      }
      | Self::CalendarSynced { message } => {
        Some(Notice::success(fill_template(
          &labels.calendar_synced,
          &[("message", message.as_str())]
        )))
      }
      | Self::Other(_) => None
    }
  }
}
