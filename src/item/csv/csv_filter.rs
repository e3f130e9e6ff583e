use std::collections::HashMap;

use log::{debug, warn};
use serde_json::Value;

use crate::{
    core::{
        event::{Event, EventFields, FieldReference, json_type_name},
        item::{ItemProcessor, ItemProcessorResult},
    },
    error::FilterError,
};

use super::{
    converter::Conversion,
    field_mapper::{FieldMap, FieldMapper},
    line_decoder::LineDecoder,
};

/// Tag added to a record whose source line could not be processed.
pub const DEFAULT_FAILURE_TAG: &str = "_csvparsefailure";

/// Tag added to a record whose line held no values, when empty rows are skipped.
pub const EMPTY_ROW_TAG: &str = "_csvskippedemptyfield";

/// What happened to a record handed to [`CsvFilter::apply`].
#[derive(Debug, PartialEq)]
pub enum FilterOutcome {
    /// The decoded fields were merged into the record.
    Matched { fields: usize },
    /// The source field is absent or null, the record is untouched.
    NoSource,
    /// The line held no values and was tagged instead of merged.
    EmptyRow,
    /// The line repeats the configured column names. The record should be dropped.
    HeaderSkipped,
    /// The record was tagged and logged, none of its fields changed.
    Failed(FilterError),
}

/// Decodes the CSV line held by one record field and merges the named
/// values back into the record.
///
/// A filter is built once, through [`CsvFilterBuilder`] or from
/// [`CsvFilterSettings`](super::settings::CsvFilterSettings), and is
/// read-only afterwards. It can be shared between threads.
///
/// # Examples
///
/// ```
/// use csv_event_filter::core::event::Event;
/// use csv_event_filter::item::csv::csv_filter::{CsvFilterBuilder, FilterOutcome};
/// use serde_json::json;
///
/// let filter = CsvFilterBuilder::new()
///     .columns(["name", "age"])
///     .convert("age", "integer")
///     .build()
///     .unwrap();
///
/// let mut event = Event::with_message("Alice,30,admin");
/// assert_eq!(filter.apply(&mut event), FilterOutcome::Matched { fields: 3 });
/// assert_eq!(
///     event.to_json(),
///     json!({"message": "Alice,30,admin", "name": "Alice", "age": 30, "column3": "admin"})
/// );
/// ```
#[derive(Debug, Clone)]
pub struct CsvFilter {
    source: FieldReference,
    target: Option<FieldReference>,
    decoder: LineDecoder,
    mapper: FieldMapper,
    skip_empty_rows: bool,
    skip_header: bool,
    tag_on_failure: Vec<String>,
}

impl CsvFilter {
    pub fn builder() -> CsvFilterBuilder {
        CsvFilterBuilder::new()
    }

    pub fn source(&self) -> &FieldReference {
        &self.source
    }

    pub fn target(&self) -> Option<&FieldReference> {
        self.target.as_ref()
    }

    /// Decodes a line with this filter's separator and quote character.
    pub fn decode(&self, line: &str) -> Result<Vec<String>, FilterError> {
        Ok(self.decoder.decode(line)?)
    }

    /// Names and converts already decoded values.
    pub fn map<S: AsRef<str>>(&self, values: &[S]) -> FieldMap {
        self.mapper.map(values)
    }

    /// Runs the filter against one record.
    ///
    /// Failures never escape: a record that cannot be handled is tagged with
    /// every `tag_on_failure` tag, the problem is logged and the error is
    /// returned inside [`FilterOutcome::Failed`].
    pub fn apply<E: EventFields + ?Sized>(&self, event: &mut E) -> FilterOutcome {
        let line = match event.get_field(&self.source) {
            None | Some(Value::Null) => {
                debug!("Csv filter: no value in field {}", self.source);
                return FilterOutcome::NoSource;
            }
            Some(Value::String(line)) => line,
            Some(other) => {
                let error = FilterError::SourceType {
                    field: self.source.to_string(),
                    found: json_type_name(&other),
                };
                return self.fail(event, &other.to_string(), error);
            }
        };

        debug!("Running csv filter on field {}: {:?}", self.source, line);

        let values = match self.decoder.decode(&line) {
            Ok(values) => values,
            Err(error) => return self.fail(event, &line, error.into()),
        };

        let columns = self.mapper.columns();
        if self.skip_header && !columns.is_empty() && values == columns {
            debug!("Csv filter: dropping header line {:?}", line);
            return FilterOutcome::HeaderSkipped;
        }

        if self.skip_empty_rows && values.iter().all(String::is_empty) {
            event.add_tag(EMPTY_ROW_TAG);
            return FilterOutcome::EmptyRow;
        }

        let fields = self.mapper.map(&values);
        let count = fields.len();

        let target: &[String] = match &self.target {
            Some(target) => target.segments(),
            None => &[],
        };
        if let Err(error) = event.merge_fields(target, fields) {
            return self.fail(event, &line, error);
        }

        debug!("Csv filter matched, {} fields set", count);
        FilterOutcome::Matched { fields: count }
    }

    fn fail<E: EventFields + ?Sized>(
        &self,
        event: &mut E,
        source: &str,
        error: FilterError,
    ) -> FilterOutcome {
        warn!(
            "Error parsing csv, field: {}, source: {:?}, error: {}",
            self.source, source, error
        );
        for tag in &self.tag_on_failure {
            event.add_tag(tag);
        }
        FilterOutcome::Failed(error)
    }
}

impl ItemProcessor<Event, Event> for CsvFilter {
    /// Applies the filter to a copy of the event.
    ///
    /// Header lines are dropped when `skip_header` is set; every other record,
    /// failed ones included, is passed on.
    fn process(&self, item: &Event) -> ItemProcessorResult<Event> {
        let mut event = item.clone();
        match self.apply(&mut event) {
            FilterOutcome::HeaderSkipped => Ok(None),
            _ => Ok(Some(event)),
        }
    }
}

/// A builder for configuring a [`CsvFilter`].
///
/// # Default Configuration
///
/// - Source field: `message`
/// - Separator: comma (`,`)
/// - Quote character: double quote (`"`)
/// - Columns: none, names are generated (`column1`, `column2`, ...)
/// - Target: none, fields go to the record root
/// - Empty columns, empty rows and header lines: kept
/// - Failure tag: `_csvparsefailure`
///
/// Nothing is checked until [`build`](CsvFilterBuilder::build), which
/// reports every configuration problem as [`FilterError::Configuration`].
///
/// # Examples
///
/// ```
/// use csv_event_filter::item::csv::csv_filter::CsvFilterBuilder;
///
/// let filter = CsvFilterBuilder::new()
///     .source("[raw][line]")
///     .separator(';')
///     .target("[csv]")
///     .skip_empty_columns(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(filter.target().unwrap().to_string(), "csv");
/// ```
#[derive(Debug, Clone)]
pub struct CsvFilterBuilder {
    source: String,
    columns: Vec<String>,
    separator: char,
    quote_char: char,
    target: Option<String>,
    autogenerate_column_names: bool,
    skip_empty_columns: bool,
    skip_empty_rows: bool,
    skip_header: bool,
    convert: Vec<(String, String)>,
    tag_on_failure: Vec<String>,
}

impl Default for CsvFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvFilterBuilder {
    pub fn new() -> Self {
        Self {
            source: "message".to_string(),
            columns: Vec::new(),
            separator: ',',
            quote_char: '"',
            target: None,
            autogenerate_column_names: true,
            skip_empty_columns: false,
            skip_empty_rows: false,
            skip_header: false,
            convert: Vec::new(),
            tag_on_failure: vec![DEFAULT_FAILURE_TAG.to_string()],
        }
    }

    /// Field holding the CSV line, as a bare name or `[a][b]` reference.
    pub fn source(mut self, source: &str) -> Self {
        self.source = source.to_string();
        self
    }

    /// Names given to values by position.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Object the fields are written into instead of the record root.
    pub fn target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    /// When disabled, values past the end of `columns` are dropped.
    pub fn autogenerate_column_names(mut self, yes: bool) -> Self {
        self.autogenerate_column_names = yes;
        self
    }

    pub fn skip_empty_columns(mut self, yes: bool) -> Self {
        self.skip_empty_columns = yes;
        self
    }

    /// Tags lines without any non-empty value instead of merging them.
    pub fn skip_empty_rows(mut self, yes: bool) -> Self {
        self.skip_empty_rows = yes;
        self
    }

    /// Drops records whose values equal the configured column names.
    pub fn skip_header(mut self, yes: bool) -> Self {
        self.skip_header = yes;
        self
    }

    /// Converts `field` with the conversion named `kind`: `integer`,
    /// `float`, `date`, `datetime` (or `date_time`) or `boolean`.
    pub fn convert(mut self, field: &str, kind: &str) -> Self {
        self.convert.push((field.to_string(), kind.to_string()));
        self
    }

    /// Same as [`convert`](CsvFilterBuilder::convert) with a typed kind.
    pub fn conversion(self, field: &str, conversion: Conversion) -> Self {
        self.convert(field, conversion.as_str())
    }

    pub fn tag_on_failure<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_on_failure = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Validates the configuration and creates the filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Configuration`] when:
    /// - separator and quote character are equal, or either is a line break
    /// - `source` or `target` is not a valid field reference
    /// - a conversion kind is unknown
    pub fn build(self) -> Result<CsvFilter, FilterError> {
        check_delimiters(self.separator, self.quote_char)?;

        let source = parse_reference("source", &self.source)?;
        let target = self
            .target
            .as_deref()
            .map(|target| parse_reference("target", target))
            .transpose()?;

        let conversions = self
            .convert
            .iter()
            .map(|(field, kind)| {
                kind.parse::<Conversion>()
                    .map(|conversion| (field.clone(), conversion))
                    .map_err(|error| match error {
                        FilterError::Configuration(reason) => {
                            FilterError::Configuration(format!("convert[{}]: {}", field, reason))
                        }
                        other => other,
                    })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(CsvFilter {
            source,
            target,
            decoder: LineDecoder::new(self.separator, self.quote_char),
            mapper: FieldMapper::new(
                self.columns,
                self.autogenerate_column_names,
                self.skip_empty_columns,
                conversions,
            ),
            skip_empty_rows: self.skip_empty_rows,
            skip_header: self.skip_header,
            tag_on_failure: self.tag_on_failure,
        })
    }
}

fn check_delimiters(separator: char, quote_char: char) -> Result<(), FilterError> {
    for (name, c) in [("separator", separator), ("quote_char", quote_char)] {
        if c == '\n' || c == '\r' {
            return Err(FilterError::Configuration(format!(
                "{} cannot be a line break",
                name
            )));
        }
    }
    if separator == quote_char {
        return Err(FilterError::Configuration(format!(
            "separator and quote_char must differ, both are {:?}",
            separator
        )));
    }
    Ok(())
}

fn parse_reference(option: &str, reference: &str) -> Result<FieldReference, FilterError> {
    reference
        .parse()
        .map_err(|error| FilterError::Configuration(format!("{}: {}", option, error)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CsvFilterBuilder, DEFAULT_FAILURE_TAG, EMPTY_ROW_TAG, FilterOutcome};
    use crate::{
        core::{event::Event, item::ItemProcessor},
        error::FilterError,
        item::csv::{converter::Conversion, line_decoder::DecodeError},
    };

    #[test]
    fn should_merge_generated_columns_at_root() {
        let filter = CsvFilterBuilder::new().build().unwrap();
        let mut event = Event::with_message("1,,3");

        assert_eq!(filter.apply(&mut event), FilterOutcome::Matched { fields: 3 });
        assert_eq!(
            event.to_json(),
            json!({"message": "1,,3", "column1": "1", "column2": "", "column3": "3"})
        );
    }

    #[test]
    fn should_merge_under_target() {
        let filter = CsvFilterBuilder::new()
            .columns(["x", "y"])
            .target("[parsed][csv]")
            .build()
            .unwrap();
        let mut event = Event::with_message("a,b");

        filter.apply(&mut event);

        assert_eq!(
            event.to_json(),
            json!({"message": "a,b", "parsed": {"csv": {"x": "a", "y": "b"}}})
        );
    }

    #[test]
    fn should_read_nested_source() {
        let filter = CsvFilterBuilder::new()
            .source("[raw][line]")
            .separator('|')
            .build()
            .unwrap();
        let mut event = Event::from_json(json!({"raw": {"line": "p|q"}})).unwrap();

        assert_eq!(filter.apply(&mut event), FilterOutcome::Matched { fields: 2 });
        assert_eq!(event.to_json()["column2"], json!("q"));
    }

    #[test]
    fn should_ignore_missing_or_null_source() {
        let filter = CsvFilterBuilder::new().build().unwrap();

        let mut event = Event::from_json(json!({"other": "a,b"})).unwrap();
        assert_eq!(filter.apply(&mut event), FilterOutcome::NoSource);
        assert_eq!(event.to_json(), json!({"other": "a,b"}));

        let mut event = Event::from_json(json!({"message": null})).unwrap();
        assert_eq!(filter.apply(&mut event), FilterOutcome::NoSource);
    }

    #[test]
    fn should_tag_and_leave_fields_on_decode_failure() {
        let filter = CsvFilterBuilder::new().build().unwrap();
        let mut event = Event::with_message("a,\"b,c");

        assert_eq!(
            filter.apply(&mut event),
            FilterOutcome::Failed(FilterError::Decode(DecodeError::UnclosedQuote { field: 2 }))
        );
        assert_eq!(
            event.to_json(),
            json!({"message": "a,\"b,c", "tags": [DEFAULT_FAILURE_TAG]})
        );
    }

    #[test]
    fn should_use_custom_failure_tags() {
        let filter = CsvFilterBuilder::new()
            .tag_on_failure(["bad_csv", "needs_review"])
            .build()
            .unwrap();
        let mut event = Event::with_message("x\"y");

        filter.apply(&mut event);

        assert_eq!(event.tags(), vec!["bad_csv", "needs_review"]);
    }

    #[test]
    fn should_fail_on_non_string_source() {
        let filter = CsvFilterBuilder::new().build().unwrap();
        let mut event = Event::from_json(json!({"message": [1, 2]})).unwrap();

        assert_eq!(
            filter.apply(&mut event),
            FilterOutcome::Failed(FilterError::SourceType {
                field: "message".to_string(),
                found: "array"
            })
        );
        assert!(event.has_tag(DEFAULT_FAILURE_TAG));
    }

    #[test]
    fn should_fail_when_target_is_not_an_object() {
        let filter = CsvFilterBuilder::new().target("csv").build().unwrap();
        let mut event = Event::from_json(json!({"message": "a", "csv": 5})).unwrap();

        assert!(matches!(
            filter.apply(&mut event),
            FilterOutcome::Failed(FilterError::FieldReference(_))
        ));
        assert_eq!(event.to_json()["csv"], json!(5));
        assert!(event.has_tag(DEFAULT_FAILURE_TAG));
    }

    #[test]
    fn should_match_empty_line_without_fields() {
        let filter = CsvFilterBuilder::new().build().unwrap();
        let mut event = Event::with_message("");

        assert_eq!(filter.apply(&mut event), FilterOutcome::Matched { fields: 0 });
        assert_eq!(event, Event::with_message(""));
    }

    #[test]
    fn should_tag_empty_rows_when_asked() {
        let filter = CsvFilterBuilder::new().skip_empty_rows(true).build().unwrap();

        for line in ["", ",,"] {
            let mut event = Event::with_message(line);
            assert_eq!(filter.apply(&mut event), FilterOutcome::EmptyRow);
            assert_eq!(event.tags(), vec![EMPTY_ROW_TAG]);
            assert!(event.to_json().get("column1").is_none());
        }
    }

    #[test]
    fn should_drop_header_line_when_asked() {
        let filter = CsvFilterBuilder::new()
            .columns(["id", "name"])
            .skip_header(true)
            .build()
            .unwrap();

        assert_eq!(filter.process(&Event::with_message("id,name")).unwrap(), None);

        let kept = filter.process(&Event::with_message("1,bob")).unwrap().unwrap();
        assert_eq!(kept.to_json()["name"], json!("bob"));
    }

    #[test]
    fn should_pass_failed_records_downstream() {
        let filter = CsvFilterBuilder::new().build().unwrap();
        let input = Event::with_message("\"open");

        let output = filter.process(&input).unwrap().unwrap();

        assert!(output.has_tag(DEFAULT_FAILURE_TAG));
        assert!(!input.has_tag(DEFAULT_FAILURE_TAG));
    }

    #[test]
    fn should_convert_typed_columns() {
        let filter = CsvFilterBuilder::new()
            .columns(["n", "f", "b", "d", "t"])
            .conversion("n", Conversion::Integer)
            .convert("f", "float")
            .convert("b", "boolean")
            .convert("d", "date")
            .convert("t", "date_time")
            .build()
            .unwrap();
        let mut event = Event::with_message("42,2.5, False ,2024-01-15,2024-01-15T10:30:00Z");

        filter.apply(&mut event);

        let json = event.to_json();
        assert_eq!(json["n"], json!(42));
        assert_eq!(json["f"], json!(2.5));
        assert_eq!(json["b"], json!(false));
        assert_eq!(json["d"], json!("2024-01-15"));
        assert_eq!(json["t"], json!("2024-01-15T10:30:00.000Z"));
    }

    #[test]
    fn should_reject_invalid_configuration() {
        let errors = [
            CsvFilterBuilder::new().convert("a", "decimal").build(),
            CsvFilterBuilder::new().separator('"').build(),
            CsvFilterBuilder::new().quote_char('\n').build(),
            CsvFilterBuilder::new().source("[broken").build(),
            CsvFilterBuilder::new().target("").build(),
        ];

        for result in errors {
            assert!(
                matches!(result, Err(FilterError::Configuration(_))),
                "expected configuration error, got {:?}",
                result
            );
        }
    }

    #[test]
    fn should_expose_decode_and_map() {
        let filter = CsvFilterBuilder::new()
            .separator(';')
            .columns(["a"])
            .autogenerate_column_names(false)
            .build()
            .unwrap();

        let values = filter.decode("1;2").unwrap();
        assert_eq!(values, vec!["1", "2"]);
        assert_eq!(filter.map(&values).len(), 1);
        assert!(filter.decode("'x';\"y").is_err());
    }
}
