use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Milliseconds in one day.
const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[inline]
pub(crate) fn now() -> DateTime<Utc> {
  Utc::now()
}

/// Parses a timestamp stored either as an RFC 3339 string or as Unix epoch
/// milliseconds. Anything else is `None`.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
  match value {
    Value::String(s) => DateTime::parse_from_rfc3339(s)
      .ok()
      .map(|dt| dt.with_timezone(&Utc)),
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
      .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    _ => None,
  }
}

/// Fractional days elapsed between `then` and `now`.
///
/// Timestamps in the future count as zero days.
#[inline]
pub(crate) fn days_between(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
  let millis = (now - then).num_milliseconds();
  if millis <= 0 {
    0.0
  } else {
    millis as f64 / MILLIS_PER_DAY
  }
}
