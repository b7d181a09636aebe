use std::sync::OnceLock;

use chrono::{
  DateTime,
  Local,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  Utc
};
use chrono_tz::Tz;
use regex::Regex;
use serde_json::Value;

const SCHEDULE_FORMAT: &str =
  "%Y-%m-%d %H:%M:%S";
const ISO_DAY_FORMAT: &str = "%Y-%m-%d";
const CLOCK_FORMAT: &str = "%H:%M";

const NAIVE_LOCAL_FORMATS: [&str; 5] = [
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y/%m/%d %H:%M:%S",
  "%Y/%m/%d %H:%M",
  "%Y/%m/%dT%H:%M:%S"
];

const OFFSET_FORMATS: [&str; 2] = [
  "%Y-%m-%dT%H:%M:%S%.f%z",
  "%Y-%m-%dT%H:%M%z"
];

/// Time zone the calendar treats as "local".
///
/// In the browser `Local` follows the host clock; a named zone pins
/// the calendar regardless of where the page runs.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum CalendarZone {
  Local,
  Named(Tz)
}

impl CalendarZone {
  pub fn resolve(
    raw: Option<&str>
  ) -> Self {
    let Some(raw) = raw else {
      return Self::Local;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty()
      || trimmed
        .eq_ignore_ascii_case("local")
    {
      return Self::Local;
    }

    match trimmed.parse::<Tz>() {
      | Ok(tz) => Self::Named(tz),
      | Err(error) => {
        tracing::error!(
          timezone = %trimmed,
          %error,
          "invalid calendar timezone; \
           using local zone"
        );
        Self::Local
      }
    }
  }

  #[must_use]
  pub fn from_utc(
    &self,
    instant: DateTime<Utc>
  ) -> NaiveDateTime {
    match self {
      | Self::Local => {
        instant
          .with_timezone(&Local)
          .naive_local()
      }
      | Self::Named(tz) => {
        instant
          .with_timezone(tz)
          .naive_local()
      }
    }
  }

  #[must_use]
  pub fn now(&self) -> NaiveDateTime {
    self.from_utc(Utc::now())
  }

  #[must_use]
  pub fn today(&self) -> NaiveDate {
    self.now().date()
  }
}

impl std::fmt::Display for CalendarZone {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>
  ) -> std::fmt::Result {
    match self {
      | Self::Local => f.write_str("local"),
      | Self::Named(tz) => {
        write!(f, "{tz}")
      }
    }
  }
}

fn space_datetime_pattern()
-> &'static Regex {
  static PATTERN: OnceLock<Regex> =
    OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(
      r"^\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}(:\d{2})?"
    )
    .expect("valid date-time regex")
  })
}

fn date_only_pattern() -> &'static Regex
{
  static PATTERN: OnceLock<Regex> =
    OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}$")
      .expect("valid date regex")
  })
}

fn whitespace_run() -> &'static Regex {
  static PATTERN: OnceLock<Regex> =
    OnceLock::new();
  PATTERN.get_or_init(|| {
    Regex::new(r"\s+")
      .expect("valid whitespace regex")
  })
}

/// Resolves an arbitrary upstream value into a local instant.
///
/// Numbers are epoch milliseconds. Falsy values, objects and
/// unparsable strings yield `None`, which callers treat as
/// "unschedulable".
pub fn parse_flexible(
  value: &Value,
  zone: &CalendarZone
) -> Option<NaiveDateTime> {
  match value {
    | Value::Number(number) => {
      let millis = number.as_f64()?;
      if millis == 0.0
        || !millis.is_finite()
      {
        return None;
      }
      let instant =
        DateTime::<Utc>::from_timestamp_millis(
          millis.trunc() as i64
        )?;
      Some(zone.from_utc(instant))
    }
    | Value::String(raw) => {
      parse_flexible_str(raw, zone)
    }
    | _ => None
  }
}

pub fn parse_flexible_str(
  raw: &str,
  zone: &CalendarZone
) -> Option<NaiveDateTime> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return None;
  }

  let normalized =
    if space_datetime_pattern()
      .is_match(trimmed)
    {
      whitespace_run()
        .replacen(trimmed, 1, "T")
        .into_owned()
    } else if date_only_pattern()
      .is_match(trimmed)
    {
      format!("{trimmed}T00:00:00")
    } else {
      trimmed.to_string()
    };

  parse_generic(&normalized, zone)
}

fn parse_generic(
  raw: &str,
  zone: &CalendarZone
) -> Option<NaiveDateTime> {
  for format in NAIVE_LOCAL_FORMATS {
    if let Ok(parsed) =
      NaiveDateTime::parse_from_str(
        raw, format
      )
    {
      return Some(parsed);
    }
  }

  if let Ok(parsed) =
    DateTime::parse_from_rfc3339(raw)
  {
    return Some(zone.from_utc(
      parsed.with_timezone(&Utc)
    ));
  }

  for format in OFFSET_FORMATS {
    if let Ok(parsed) =
      DateTime::parse_from_str(
        raw, format
      )
    {
      return Some(zone.from_utc(
        parsed.with_timezone(&Utc)
      ));
    }
  }

  if let Ok(parsed) =
    DateTime::parse_from_rfc2822(raw)
  {
    return Some(zone.from_utc(
      parsed.with_timezone(&Utc)
    ));
  }

  NaiveDate::parse_from_str(
    raw, "%Y/%m/%d"
  )
  .ok()
  .map(|day| day.and_time(NaiveTime::MIN))
}

/// Wire format for the update endpoint: local time, no zone suffix.
#[must_use]
pub fn format_schedule(
  at: NaiveDateTime
) -> String {
  at.format(SCHEDULE_FORMAT).to_string()
}

#[must_use]
pub fn format_iso_day(
  day: NaiveDate
) -> String {
  day.format(ISO_DAY_FORMAT).to_string()
}

pub fn parse_iso_day(
  raw: &str
) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    ISO_DAY_FORMAT
  )
  .ok()
}

#[must_use]
pub fn format_clock(
  at: NaiveDateTime
) -> String {
  at.format(CLOCK_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use serde_json::json;

  use super::*;

  const SHANGHAI: CalendarZone =
    CalendarZone::Named(
      chrono_tz::Asia::Shanghai
    );

  fn at(
    y: i32,
    m: u32,
    d: u32,
    h: u32,
    min: u32,
    s: u32
  ) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
      .and_then(|day| {
        day.and_hms_opt(h, min, s)
      })
      .expect("valid datetime")
  }

  #[test]
  fn space_and_t_separators_agree() {
    let spaced = parse_flexible_str(
      "2024-03-05 09:30",
      &SHANGHAI
    )
    .expect("space separated");
    let iso = parse_flexible_str(
      "2024-03-05T09:30:00",
      &SHANGHAI
    )
    .expect("iso");
    assert_eq!(spaced, iso);
    assert_eq!(
      spaced,
      at(2024, 3, 5, 9, 30, 0)
    );
  }

  #[test]
  fn bare_date_is_local_midnight() {
    let parsed = parse_flexible_str(
      "2024-03-05",
      &SHANGHAI
    )
    .expect("bare date");
    assert_eq!(
      parsed,
      at(2024, 3, 5, 0, 0, 0)
    );
  }

  #[test]
  fn seconds_survive_space_form() {
    let parsed = parse_flexible_str(
      "  2024-03-05   18:04:59 ",
      &SHANGHAI
    )
    .expect("padded input");
    assert_eq!(
      parsed,
      at(2024, 3, 5, 18, 4, 59)
    );
  }

  #[test]
  fn epoch_millis_convert_to_zone() {
    let parsed = parse_flexible(
      &json!(1_709_602_200_000_i64),
      &SHANGHAI
    )
    .expect("epoch millis");
    assert_eq!(
      parsed,
      at(2024, 3, 5, 9, 30, 0)
    );
  }

  #[test]
  fn offset_strings_convert_to_zone() {
    let parsed = parse_flexible_str(
      "2024-03-05T01:30:00Z",
      &SHANGHAI
    )
    .expect("utc string");
    assert_eq!(
      parsed,
      at(2024, 3, 5, 9, 30, 0)
    );

    let spaced_offset =
      parse_flexible_str(
        "2024-03-05 01:30:00+00:00",
        &SHANGHAI
      )
      .expect("spaced offset string");
    assert_eq!(spaced_offset, parsed);
  }

  #[test]
  fn slash_dates_are_accepted() {
    assert_eq!(
      parse_flexible_str(
        "2024/03/05",
        &SHANGHAI
      ),
      Some(at(2024, 3, 5, 0, 0, 0))
    );
    assert_eq!(
      parse_flexible_str(
        "2024/03/05 07:15",
        &SHANGHAI
      ),
      Some(at(2024, 3, 5, 7, 15, 0))
    );
  }

  #[test]
  fn unresolvable_inputs_fail_quietly() {
    for value in [
      json!(null),
      json!(false),
      json!(true),
      json!(0),
      json!(""),
      json!("   "),
      json!("next tuesday"),
      json!("2024-13-45"),
      json!({ "at": "2024-03-05" }),
      json!(["2024-03-05"])
    ] {
      assert_eq!(
        parse_flexible(
          &value, &SHANGHAI
        ),
        None,
        "{value} should not parse"
      );
    }
  }

  #[test]
  fn zone_resolution_falls_back_to_local()
  {
    assert_eq!(
      CalendarZone::resolve(None),
      CalendarZone::Local
    );
    assert_eq!(
      CalendarZone::resolve(Some(
        "Local"
      )),
      CalendarZone::Local
    );
    assert_eq!(
      CalendarZone::resolve(Some(
        "Mars/Olympus"
      )),
      CalendarZone::Local
    );
    assert_eq!(
      CalendarZone::resolve(Some(
        "Asia/Shanghai"
      )),
      SHANGHAI
    );
  }

  #[test]
  fn schedule_format_has_no_zone_suffix()
  {
    assert_eq!(
      format_schedule(at(
        2024, 3, 9, 9, 30, 0
      )),
      "2024-03-09 09:30:00"
    );
    assert_eq!(
      format_clock(at(
        2024, 3, 9, 9, 30, 7
      )),
      "09:30"
    );
  }
}
