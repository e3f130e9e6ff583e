use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::FilterError, item::csv::field_mapper::FieldMap};

/// Name of the record field that carries tags.
pub const TAGS_FIELD: &str = "tags";

/// A parsed path to a record field.
///
/// Two spellings are accepted: a bare name (`message`) addresses a top-level
/// field, and bracketed segments (`[http][request][body]`) address a nested
/// one.
///
/// # Examples
///
/// ```
/// use csv_event_filter::core::event::FieldReference;
///
/// let reference: FieldReference = "[csv][row]".parse().unwrap();
/// assert_eq!(reference.segments(), ["csv", "row"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReference {
    segments: Vec<String>,
}

impl FieldReference {
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl FromStr for FieldReference {
    type Err = FilterError;

    fn from_str(reference: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| {
            FilterError::FieldReference(format!("'{}' ({})", reference, reason))
        };

        if reference.is_empty() {
            return Err(invalid("empty"));
        }

        if !reference.starts_with('[') {
            if reference.contains(['[', ']']) {
                return Err(invalid("brackets inside a bare name"));
            }
            return Ok(Self {
                segments: vec![reference.to_string()],
            });
        }

        let mut segments = Vec::new();
        let mut rest = reference;
        while !rest.is_empty() {
            let Some(inner) = rest.strip_prefix('[') else {
                return Err(invalid("expected '['"));
            };
            let Some(end) = inner.find(']') else {
                return Err(invalid("unbalanced brackets"));
            };
            let segment = &inner[..end];
            if segment.is_empty() {
                return Err(invalid("empty segment"));
            }
            if segment.contains('[') {
                return Err(invalid("nested brackets"));
            }
            segments.push(segment.to_string());
            rest = &inner[end + 1..];
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for FieldReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [single] = self.segments.as_slice() {
            return f.write_str(single);
        }
        for segment in &self.segments {
            write!(f, "[{}]", segment)?;
        }
        Ok(())
    }
}

/// What the CSV filter needs from a record.
///
/// The filter never touches a record directly: it reads the source field,
/// merges its output and tags failures through this trait, so any record
/// type a pipeline uses can be plugged in.
pub trait EventFields {
    /// Returns a copy of the value at `field`, if present.
    fn get_field(&self, field: &FieldReference) -> Option<Value>;

    /// Writes all `fields` into the object at the `target` path, creating it
    /// when absent. An empty path is the record root. Existing keys are
    /// overwritten. Either every field is written or none is.
    fn merge_fields(&mut self, target: &[String], fields: FieldMap) -> Result<(), FilterError>;

    /// Adds `tag` unless the record already carries it.
    fn add_tag(&mut self, tag: &str);
}

/// A record backed by a JSON object.
///
/// # Examples
///
/// ```
/// use csv_event_filter::core::event::Event;
/// use serde_json::json;
///
/// let event = Event::with_message("a,b");
/// assert_eq!(event.to_json(), json!({"message": "a,b"}));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event {
    fields: Map<String, Value>,
}

impl Event {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a record whose `message` field holds `line`.
    pub fn with_message(line: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("message".to_string(), Value::String(line.into()));
        Self { fields }
    }

    /// Wraps a JSON object. Anything else is rejected.
    pub fn from_json(value: Value) -> Result<Self, FilterError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(FilterError::FieldReference(format!(
                "an event must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn get(&self, field: &FieldReference) -> Option<&Value> {
        let (first, rest) = field.segments.split_first()?;
        rest.iter()
            .try_fold(self.fields.get(first)?, |value, segment| value.get(segment))
    }

    pub fn tags(&self) -> Vec<&str> {
        match self.fields.get(TAGS_FIELD) {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(tag)) => vec![tag.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().contains(&tag)
    }
}

impl EventFields for Event {
    fn get_field(&self, field: &FieldReference) -> Option<Value> {
        self.get(field).cloned()
    }

    fn merge_fields(&mut self, target: &[String], fields: FieldMap) -> Result<(), FilterError> {
        let container = object_at(&mut self.fields, target)?;
        for (name, value) in fields {
            container.insert(name, value.into());
        }
        Ok(())
    }

    fn add_tag(&mut self, tag: &str) {
        let entry = self
            .fields
            .entry(TAGS_FIELD)
            .or_insert_with(|| Value::Array(Vec::new()));

        // a lone string tag is promoted to a list
        if let Value::String(existing) = &mut *entry {
            let existing = std::mem::take(existing);
            *entry = Value::Array(vec![Value::String(existing)]);
        }

        match entry {
            Value::Array(tags) => {
                if !tags.iter().any(|t| t.as_str() == Some(tag)) {
                    tags.push(Value::String(tag.to_string()));
                }
            }
            other => *other = Value::Array(vec![Value::String(tag.to_string())]),
        }
    }
}

/// Walks `path` from `root`, creating empty objects for missing segments.
fn object_at<'a>(
    root: &'a mut Map<String, Value>,
    path: &[String],
) -> Result<&'a mut Map<String, Value>, FilterError> {
    path.iter().try_fold(root, |current, segment| {
        let next = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        match next {
            Value::Object(map) => Ok(map),
            other => Err(FilterError::FieldReference(format!(
                "cannot write into {}: '{}' holds a {}",
                path.iter().map(|s| format!("[{}]", s)).collect::<String>(),
                segment,
                json_type_name(other)
            ))),
        }
    })
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
