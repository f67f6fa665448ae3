//! Strict date parsing for protocol documents

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// Errors raised when a document date cannot be interpreted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// The value is neither a date string nor a date
    #[error("invalid date value: {0}")]
    InvalidValue(String),

    /// The string could not be parsed as a date
    #[error("invalid date: {0}")]
    InvalidDate(String),
}

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a date string
///
/// Accepts RFC 3339 timestamps, naive timestamps (taken as UTC) and plain
/// calendar dates (midnight UTC).
pub fn parse_date(text: &str) -> Result<DateTime<Utc>, DateError> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| DateError::InvalidDate(text.to_string()))
}

/// Get a date from a document value
///
/// Only strings are accepted; numbers, booleans, objects and nulls are
/// rejected rather than guessed at.
pub fn date_from_value(value: &Value) -> Result<DateTime<Utc>, DateError> {
    match value {
        Value::String(text) => parse_date(text),
        other => Err(DateError::InvalidValue(other.to_string())),
    }
}

/// Serde helper for optional document dates
pub mod optional {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    /// A date as written in a JSON or TOML document
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Toml(toml::value::Datetime),
        Plain(Value),
    }

    /// Deserialize an optional date
    ///
    /// Native TOML datetimes are accepted alongside the strings handled by
    /// [`super::date_from_value`].
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let date = match Option::<RawDate>::deserialize(deserializer)? {
            None | Some(RawDate::Plain(Value::Null)) => return Ok(None),
            Some(RawDate::Toml(datetime)) => super::parse_date(&datetime.to_string()),
            Some(RawDate::Plain(value)) => super::date_from_value(&value),
        };
        date.map(Some).map_err(serde::de::Error::custom)
    }

    /// Serialize an optional date as RFC 3339
    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }
}
