use chrono::NaiveDateTime;
use serde_json::{
  Map,
  Value
};
use tracing::debug;

use crate::datetime::{
  CalendarZone,
  parse_flexible
};
use crate::task::{
  CanonicalTask,
  TaskId,
  TaskStatus
};

/// Date fields, most specific first.
pub const DATE_ALIASES: [&str; 9] = [
  "next_scheduled_time",
  "next_run",
  "scheduled_time",
  "scheduledAt",
  "scheduled_at",
  "scheduledTime",
  "scheduled",
  "run_at",
  "time"
];

/// Fields tried on a nested `next` object when no top-level alias is set.
pub const NESTED_NEXT_ALIASES: [&str; 2] =
  ["scheduled", "run_at"];

pub const TITLE_ALIASES: [&str; 3] =
  ["title", "name", "summary"];

pub const ID_ALIASES: [&str; 3] =
  ["id", "taskId", "_id"];

pub const STATUS_ALIASES: [&str; 2] =
  ["status", "state"];

pub const RECURRENCE_ALIASES: [&str; 7] = [
  "is_recurring",
  "isRecurring",
  "recurring",
  "cron_expression",
  "cronExpression",
  "recurrence",
  "repeat"
];

/// Untitled tasks read `任务 #<id>`, where the id is resolved through
/// every alias including `_id`. Without any id the label is the bare
/// placeholder, with no trailing space or `#`.
const TITLE_PLACEHOLDER: &str = "任务";

/// JavaScript-style truthiness, which is what upstream producers assume.
pub fn is_truthy(value: &Value) -> bool {
  match value {
    | Value::Null => false,
    | Value::Bool(flag) => *flag,
    | Value::Number(number) => {
      number
        .as_f64()
        .is_some_and(|n| n != 0.0)
    }
    | Value::String(raw) => {
      !raw.is_empty()
    }
    | Value::Array(_)
    | Value::Object(_) => true
  }
}

fn first_truthy<'a>(
  record: &'a Map<String, Value>,
  aliases: &[&str]
) -> Option<&'a Value> {
  aliases.iter().find_map(|key| {
    record
      .get(*key)
      .filter(|value| is_truthy(value))
  })
}

fn first_present<'a>(
  record: &'a Map<String, Value>,
  aliases: &[&str]
) -> Option<&'a Value> {
  aliases.iter().find_map(|key| {
    record
      .get(*key)
      .filter(|value| !value.is_null())
  })
}

fn resolve_schedule(
  record: &Map<String, Value>,
  zone: &CalendarZone
) -> Option<NaiveDateTime> {
  let candidate =
    first_truthy(record, &DATE_ALIASES)
      .or_else(|| {
        record
          .get("next")
          .and_then(Value::as_object)
          .and_then(|next| {
            first_truthy(
              next,
              &NESTED_NEXT_ALIASES
            )
          })
      })?;
  parse_flexible(candidate, zone)
}

fn resolve_id(
  record: &Map<String, Value>
) -> TaskId {
  first_present(record, &ID_ALIASES)
    .filter(|value| is_truthy(value))
    .and_then(TaskId::from_value)
    .unwrap_or_default()
}

fn resolve_title(
  record: &Map<String, Value>,
  id: &TaskId
) -> String {
  let title =
    first_present(record, &TITLE_ALIASES)
      .filter(|value| is_truthy(value))
      .map(|value| match value {
        | Value::String(raw) => {
          raw.clone()
        }
        | other => other.to_string()
      });

  match title {
    | Some(title) => title,
    | None if id.is_empty() => {
      TITLE_PLACEHOLDER.to_string()
    }
    | None => {
      format!("{TITLE_PLACEHOLDER} #{id}")
    }
  }
}

fn resolve_status(
  record: &Map<String, Value>
) -> TaskStatus {
  match first_present(
    record,
    &STATUS_ALIASES
  ) {
    | Some(Value::String(raw)) => {
      TaskStatus::parse(raw)
    }
    | Some(value)
      if is_truthy(value) =>
    {
      TaskStatus::parse(
        &value.to_string()
      )
    }
    | _ => TaskStatus::Unset
  }
}

fn resolve_recurring(
  record: &Map<String, Value>
) -> bool {
  RECURRENCE_ALIASES.iter().any(|key| {
    record.get(*key).is_some_and(is_truthy)
  })
}

/// Normalizes one upstream record; `None` means "unschedulable".
pub fn normalize_task(
  record: &Value,
  zone: &CalendarZone
) -> Option<CanonicalTask> {
  let object = record.as_object()?;
  let scheduled_at =
    resolve_schedule(object, zone)?;
  let id = resolve_id(object);
  let title = resolve_title(object, &id);

  Some(CanonicalTask {
    title,
    scheduled_at,
    status: resolve_status(object),
    is_recurring: resolve_recurring(
      object
    ),
    raw_source: record.clone(),
    id
  })
}

/// Normalizes a batch, silently dropping unschedulable records, and
/// returns the survivors in chronological order.
pub fn normalize_tasks(
  records: &[Value],
  zone: &CalendarZone
) -> Vec<CanonicalTask> {
  let mut tasks = records
    .iter()
    .filter_map(|record| {
      normalize_task(record, zone)
    })
    .collect::<Vec<_>>();

  tasks.sort_by_key(|task| {
    task.scheduled_at
  });

  debug!(
    records = records.len(),
    tasks = tasks.len(),
    dropped = records.len() - tasks.len(),
    %zone,
    "normalized calendar tasks"
  );
  tasks
}
