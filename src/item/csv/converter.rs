use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::error::FilterError;

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y", "%d %b %Y"];

const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// The fixed set of type conversions a column can be given.
///
/// Converters never fail: a value that does not parse as the requested type
/// is kept as the original string. Only `Boolean` normalizes what it hands
/// back (trimmed and lower-cased).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    Integer,
    Float,
    Date,
    Datetime,
    Boolean,
}

impl Conversion {
    pub const ALL: [Conversion; 5] = [
        Conversion::Integer,
        Conversion::Float,
        Conversion::Date,
        Conversion::Datetime,
        Conversion::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Conversion::Integer => "integer",
            Conversion::Float => "float",
            Conversion::Date => "date",
            Conversion::Datetime => "datetime",
            Conversion::Boolean => "boolean",
        }
    }

    /// Converts a raw value, falling back to the raw string.
    pub fn apply(&self, raw: &str) -> FieldValue {
        let converted = match self {
            Conversion::Integer => raw.trim().parse::<i64>().ok().map(FieldValue::Integer),
            Conversion::Float => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(FieldValue::Float),
            Conversion::Date => parse_date(raw.trim()).map(FieldValue::Date),
            Conversion::Datetime => parse_datetime(raw.trim()).map(FieldValue::DateTime),
            Conversion::Boolean => {
                let normalized = raw.trim().to_lowercase();
                Some(match normalized.as_str() {
                    "true" => FieldValue::Boolean(true),
                    "false" => FieldValue::Boolean(false),
                    _ => FieldValue::String(normalized),
                })
            }
        };

        converted.unwrap_or_else(|| FieldValue::String(raw.to_string()))
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Conversion {
    type Err = FilterError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "integer" => Ok(Conversion::Integer),
            "float" => Ok(Conversion::Float),
            "date" => Ok(Conversion::Date),
            "datetime" | "date_time" => Ok(Conversion::Datetime),
            "boolean" => Ok(Conversion::Boolean),
            other => Err(FilterError::Configuration(format!(
                "unknown conversion '{}', expected one of: {}",
                other,
                Conversion::ALL
                    .iter()
                    .map(Conversion::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

/// A value produced for one output field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::String(s) => Value::String(s),
            FieldValue::Integer(i) => Value::from(i),
            FieldValue::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
            FieldValue::Boolean(b) => Value::Bool(b),
            FieldValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::DateTime(dt) => {
                Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
