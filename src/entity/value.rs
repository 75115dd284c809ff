use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scalar column types an entity field can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Integer,
    Text,
    Boolean,
    Timestamp,
    Date,
    Uuid,
}

/// Failure to turn raw request text into a typed field value
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{value}' is not a valid {} value", .kind.name())]
pub struct ConversionError {
    pub kind: FieldKind,
    pub value: String,
}

impl FieldKind {
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Integer => "integer",
            FieldKind::Text => "text",
            FieldKind::Boolean => "boolean",
            FieldKind::Timestamp => "timestamp",
            FieldKind::Date => "date",
            FieldKind::Uuid => "uuid",
        }
    }

    /// Whether `<`, `<=`, `>` and `>=` are meaningful for this kind
    pub fn is_ordered(&self) -> bool {
        !matches!(self, FieldKind::Boolean | FieldKind::Uuid)
    }

    /// Convert a path segment or query-string value to this kind.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, ConversionError> {
        let trimmed = raw.trim();
        let err = || ConversionError { kind: *self, value: raw.to_string() };

        match self {
            FieldKind::Integer => trimmed.parse::<i64>().map(FieldValue::Integer).map_err(|_| err()),
            FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
            FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" => Ok(FieldValue::Boolean(true)),
                "false" => Ok(FieldValue::Boolean(false)),
                _ => Err(err()),
            },
            FieldKind::Timestamp => parse_timestamp(trimmed).map(FieldValue::Timestamp).ok_or_else(err),
            FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| err()),
            FieldKind::Uuid => Uuid::parse_str(trimmed).map(FieldValue::Uuid).map_err(|_| err()),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A single typed field value read from an entity or parsed from a request
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Text(String),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(_) => Some(FieldKind::Integer),
            FieldValue::Text(_) => Some(FieldKind::Text),
            FieldValue::Boolean(_) => Some(FieldKind::Boolean),
            FieldValue::Timestamp(_) => Some(FieldKind::Timestamp),
            FieldValue::Date(_) => Some(FieldKind::Date),
            FieldValue::Uuid(_) => Some(FieldKind::Uuid),
        }
    }

    /// Ordering between two values of the same kind. Null and mixed kinds are unordered.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Integer(a), FieldValue::Integer(b)) => Some(a.cmp(b)),
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Boolean(a), FieldValue::Boolean(b)) => Some(a.cmp(b)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => Some(a.cmp(b)),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            (FieldValue::Uuid(a), FieldValue::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// JSON form matching how entity structs serialize the same field
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Integer(i) => (*i).into(),
            FieldValue::Text(s) => s.clone().into(),
            FieldValue::Boolean(b) => (*b).into(),
            FieldValue::Timestamp(t) => t.format("%Y-%m-%dT%H:%M:%S%.f").to_string().into(),
            FieldValue::Date(d) => d.to_string().into(),
            FieldValue::Uuid(u) => u.to_string().into(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "null"),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Text(s) => write!(f, "{:?}", s),
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%dT%H:%M:%S%.f")),
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl From<i16> for FieldValue {
    fn from(v: i16) -> Self { FieldValue::Integer(v.into()) }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self { FieldValue::Integer(v.into()) }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self { FieldValue::Integer(v) }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self { FieldValue::Boolean(v) }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self { FieldValue::Text(v) }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self { FieldValue::Text(v.to_string()) }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self { FieldValue::Timestamp(v) }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self { FieldValue::Date(v) }
}

impl From<Uuid> for FieldValue {
    fn from(v: Uuid) -> Self { FieldValue::Uuid(v) }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keys_by_kind() {
        assert_eq!(FieldKind::Integer.parse("42"), Ok(FieldValue::Integer(42)));
        assert!(FieldKind::Integer.parse("4x").is_err());
        assert!(FieldKind::Uuid.parse("not-a-uuid").is_err());

        let id = Uuid::new_v4();
        assert_eq!(FieldKind::Uuid.parse(&id.to_string()), Ok(FieldValue::Uuid(id)));
    }

    #[test]
    fn parses_timestamps_in_common_shapes() {
        let expected = NaiveDate::from_ymd_opt(1980, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        for raw in ["1980-01-01", "1980-01-01T00:00:00", "1980-01-01 00:00:00", "1980-01-01T00:00:00Z"] {
            assert_eq!(FieldKind::Timestamp.parse(raw), Ok(FieldValue::Timestamp(expected)), "{}", raw);
        }
    }

    #[test]
    fn mixed_kinds_do_not_compare() {
        assert_eq!(FieldValue::Integer(1).compare(&FieldValue::Text("1".into())), None);
        assert_eq!(FieldValue::Null.compare(&FieldValue::Null), None);
        assert_eq!(FieldValue::Integer(1).compare(&FieldValue::Integer(2)), Some(Ordering::Less));
    }

    #[test]
    fn json_form_deserializes_back() {
        let id = Uuid::new_v4();
        assert_eq!(FieldValue::Uuid(id).to_json(), serde_json::json!(id));
        assert_eq!(FieldValue::Integer(7).to_json(), serde_json::json!(7));
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap();
        let parsed: NaiveDateTime = serde_json::from_value(FieldValue::Timestamp(ts).to_json()).unwrap();
        assert_eq!(parsed, ts);
    }

    #[test]
    fn optional_values_become_null() {
        let missing: Option<i32> = None;
        assert_eq!(FieldValue::from(missing), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("ADD")), FieldValue::Text("ADD".into()));
    }
}
