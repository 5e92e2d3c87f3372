use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value as JsonValue;
use std::sync::OnceLock;

const NANOS_PER_SECOND: u32 = 1_000_000_000;
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

/// Parse a stored match timestamp. Accepts RFC 3339 strings, naive
/// `datetime-local` strings (read as UTC), Firestore `{seconds, nanoseconds}`
/// objects in either export spelling, and epoch milliseconds.
pub fn parse_timestamp(value: &JsonValue) -> Result<DateTime<Utc>> {
    match value {
        JsonValue::String(s) => parse_timestamp_str(s),
        JsonValue::Number(n) => {
            let millis = n
                .as_i64()
                .with_context(|| format!("Timestamp is not an integer: {}", n))?;
            DateTime::from_timestamp_millis(millis)
                .with_context(|| format!("Timestamp out of range: {}", millis))
        }
        JsonValue::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(JsonValue::as_i64)
                .context("Timestamp object has no seconds field")?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .map(|v| v.as_u64().with_context(|| format!("Invalid nanoseconds: {}", v)))
                .transpose()?
                .unwrap_or(0);
            let nanos = u32::try_from(nanos)
                .ok()
                .filter(|n| *n < NANOS_PER_SECOND)
                .with_context(|| format!("Nanoseconds out of range: {}", nanos))?;
            DateTime::from_timestamp(seconds, nanos)
                .with_context(|| format!("Timestamp out of range: {}s {}ns", seconds, nanos))
        }
        other => bail!("Unsupported timestamp value: {}", other),
    }
}

fn parse_timestamp_str(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        bail!("Empty timestamp");
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    bail!("Unrecognised timestamp format: {}", s)
}

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Document id for a player: lowercase name with whitespace runs collapsed to `-`.
pub fn slugify(name: &str) -> String {
    whitespace()
        .replace_all(name.trim(), "-")
        .to_lowercase()
}

/// The part of an email address before `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = DateTime::parse_from_rfc3339("2024-03-22T14:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_timestamp(&json!("2024-03-22T14:00:00Z")).unwrap(), expected);
        assert_eq!(parse_timestamp(&json!("2024-03-22T19:30:00+05:30")).unwrap(), expected);
        assert_eq!(parse_timestamp(&json!("2024-03-22T14:00")).unwrap(), expected);
        assert_eq!(parse_timestamp(&json!(expected.timestamp_millis())).unwrap(), expected);
        assert_eq!(
            parse_timestamp(&json!({ "_seconds": expected.timestamp(), "_nanoseconds": 0 })).unwrap(),
            expected
        );
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp(&json!("next tuesday")).is_err());
        assert!(parse_timestamp(&json!("")).is_err());
        assert!(parse_timestamp(&json!(null)).is_err());
        assert!(parse_timestamp(&json!({ "nanoseconds": 5 })).is_err());
        assert!(parse_timestamp(&json!({ "seconds": 1_700_000_000, "nanoseconds": 4_294_967_296u64 })).is_err());
        assert!(parse_timestamp(&json!({ "seconds": 1_700_000_000, "nanoseconds": 1_000_000_000u64 })).is_err());
        assert!(parse_timestamp(&json!({ "seconds": 1_700_000_000, "nanoseconds": -1 })).is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Virat Kohli"), "virat-kohli");
        assert_eq!(slugify("  MS   Dhoni "), "ms-dhoni");
        assert_eq!(slugify("Rashid\tKhan"), "rashid-khan");
    }

    #[test]
    fn test_email_local_part() {
        assert_eq!(email_local_part("asha.k@example.com"), "asha.k");
        assert_eq!(email_local_part("no-at-sign"), "no-at-sign");
        assert_eq!(email_local_part(""), "");
    }
}
