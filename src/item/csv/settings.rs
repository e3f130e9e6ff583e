use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::FilterError;

use super::csv_filter::{CsvFilter, CsvFilterBuilder, DEFAULT_FAILURE_TAG};

/// Deserializable form of the CSV filter options.
///
/// Every key is optional and defaults to the [`CsvFilterBuilder`] default.
/// Unknown keys are rejected so that a misspelled option fails at startup
/// instead of being silently ignored.
///
/// # Examples
///
/// ```
/// use csv_event_filter::item::csv::{csv_filter::CsvFilter, settings::CsvFilterSettings};
///
/// let settings = CsvFilterSettings::from_json_str(
///     r#"{
///         "columns": ["host", "status", "latency"],
///         "separator": "|",
///         "target": "[http]",
///         "convert": {"status": "integer", "latency": "float"}
///     }"#,
/// )
/// .unwrap();
///
/// let filter = CsvFilter::try_from(settings).unwrap();
/// assert_eq!(filter.source().to_string(), "message");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvFilterSettings {
    pub source: String,
    pub columns: Vec<String>,
    pub separator: String,
    pub quote_char: String,
    pub target: Option<String>,
    pub autogenerate_column_names: bool,
    pub skip_empty_columns: bool,
    pub skip_empty_rows: bool,
    pub skip_header: bool,
    /// Field name to conversion kind. Kinds are checked when the filter is built.
    pub convert: BTreeMap<String, String>,
    pub tag_on_failure: Vec<String>,
}

impl Default for CsvFilterSettings {
    fn default() -> Self {
        Self {
            source: "message".to_string(),
            columns: Vec::new(),
            separator: ",".to_string(),
            quote_char: "\"".to_string(),
            target: None,
            autogenerate_column_names: true,
            skip_empty_columns: false,
            skip_empty_rows: false,
            skip_header: false,
            convert: BTreeMap::new(),
            tag_on_failure: vec![DEFAULT_FAILURE_TAG.to_string()],
        }
    }
}

impl CsvFilterSettings {
    pub fn from_json_str(json: &str) -> Result<Self, FilterError> {
        serde_json::from_str(json).map_err(|error| FilterError::Configuration(error.to_string()))
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self, FilterError> {
        serde_json::from_value(value).map_err(|error| FilterError::Configuration(error.to_string()))
    }

    /// Moves the settings into a builder, checking the one-character options.
    pub fn into_builder(self) -> Result<CsvFilterBuilder, FilterError> {
        let separator = single_char("separator", &self.separator)?;
        let quote_char = single_char("quote_char", &self.quote_char)?;

        let mut builder = CsvFilterBuilder::new()
            .source(&self.source)
            .columns(self.columns)
            .separator(separator)
            .quote_char(quote_char)
            .autogenerate_column_names(self.autogenerate_column_names)
            .skip_empty_columns(self.skip_empty_columns)
            .skip_empty_rows(self.skip_empty_rows)
            .skip_header(self.skip_header)
            .tag_on_failure(self.tag_on_failure);

        if let Some(target) = &self.target {
            builder = builder.target(target);
        }

        for (field, kind) in &self.convert {
            builder = builder.convert(field, kind);
        }

        Ok(builder)
    }
}

impl TryFrom<CsvFilterSettings> for CsvFilter {
    type Error = FilterError;

    fn try_from(settings: CsvFilterSettings) -> Result<Self, Self::Error> {
        settings.into_builder()?.build()
    }
}

fn single_char(option: &str, value: &str) -> Result<char, FilterError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(FilterError::Configuration(format!(
            "{} must be exactly one character, got {:?}",
            option, value
        ))),
    }
}
