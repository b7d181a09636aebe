//! Ordered strategies for pulling the task array out of a listing body.

use serde_json::Value;

/// Conventional envelope keys, probed in this order.
pub const ENVELOPE_KEYS: [&str; 9] = [
  "tasks", "items", "data", "results",
  "records", "rows", "list", "objects",
  "content"
];

/// A pure probe: raw listing body in, task array out if it recognizes
/// the shape.
pub type Extractor =
  fn(&Value) -> Option<&Vec<Value>>;

/// Strategies in the order they are tried.
pub const EXTRACTORS: [(
  &str,
  Extractor
); 4] = [
  ("bare-array", bare_array),
  ("envelope-key", envelope_key),
  ("nested-data", nested_data),
  ("first-array-property", first_array_property)
];

pub fn bare_array(
  body: &Value
) -> Option<&Vec<Value>> {
  body.as_array()
}

pub fn envelope_key(
  body: &Value
) -> Option<&Vec<Value>> {
  probe_keys(body)
}

/// One level below a `data` envelope, which may itself be the array.
pub fn nested_data(
  body: &Value
) -> Option<&Vec<Value>> {
  let data = body.get("data")?;
  data
    .as_array()
    .or_else(|| probe_keys(data))
}

pub fn first_array_property(
  body: &Value
) -> Option<&Vec<Value>> {
  body
    .as_object()?
    .values()
    .find_map(Value::as_array)
}

fn probe_keys(
  object: &Value
) -> Option<&Vec<Value>> {
  let object = object.as_object()?;
  ENVELOPE_KEYS.iter().find_map(|key| {
    object.get(*key).and_then(Value::as_array)
  })
}

/// Runs every strategy in turn; returns the name of the one that
/// matched alongside the records.
pub fn extract_records(
  body: &Value
) -> Option<(&'static str, &Vec<Value>)> {
  EXTRACTORS.iter().find_map(
    |(name, extractor)| {
      extractor(body)
        .map(|records| (*name, records))
    }
  )
}
