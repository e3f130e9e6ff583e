mod common;

use common::{MockRecord, init_logger};

use csv_event_filter::{
    core::event::Event,
    error::FilterError,
    item::csv::{
        csv_filter::{CsvFilter, CsvFilterBuilder, FilterOutcome},
        line_decoder::DecodeError,
        settings::CsvFilterSettings,
    },
};
use serde_json::json;

#[test]
fn unterminated_quote_tags_record_and_adds_no_fields() {
    init_logger();

    let filter = CsvFilterBuilder::new()
        .columns(["a", "b"])
        .build()
        .unwrap();
    let mut event = Event::from_json(json!({"message": "a,\"b,c", "a": "before"})).unwrap();

    let outcome = filter.apply(&mut event);

    assert_eq!(
        outcome,
        FilterOutcome::Failed(FilterError::Decode(DecodeError::UnclosedQuote { field: 2 }))
    );
    assert_eq!(
        event.to_json(),
        json!({"message": "a,\"b,c", "a": "before", "tags": ["_csvparsefailure"]})
    );
}

#[test]
fn decode_failure_never_reaches_merge() {
    let filter = CsvFilterBuilder::new().build().unwrap();

    for line in ["x\"y", "\"a\"b", "a\nb", "\"never closed"] {
        let mut record = MockRecord::new();
        record
            .expect_get_field()
            .returning(move |_| Some(json!(line)));
        record.expect_merge_fields().never();
        record
            .expect_add_tag()
            .withf(|tag| tag == "_csvparsefailure")
            .times(1)
            .return_const(());

        assert!(matches!(
            filter.apply(&mut record),
            FilterOutcome::Failed(FilterError::Decode(_))
        ));
    }
}

#[test]
fn merge_failure_is_reported_like_a_decode_failure() {
    let filter = CsvFilterBuilder::new()
        .tag_on_failure(["csv_error"])
        .build()
        .unwrap();

    let mut record = MockRecord::new();
    record
        .expect_get_field()
        .returning(|_| Some(json!("1,2")));
    record
        .expect_merge_fields()
        .times(1)
        .returning(|_, _| Err(FilterError::FieldReference("read-only".to_string())));
    record
        .expect_add_tag()
        .withf(|tag| tag == "csv_error")
        .times(1)
        .return_const(());

    assert_eq!(
        filter.apply(&mut record),
        FilterOutcome::Failed(FilterError::FieldReference("read-only".to_string()))
    );
}

#[test]
fn absent_source_is_not_an_error() {
    let filter = CsvFilterBuilder::new().source("[payload][csv]").build().unwrap();

    let mut record = MockRecord::new();
    record.expect_get_field().returning(|_| None);
    record.expect_merge_fields().never();
    record.expect_add_tag().never();

    assert_eq!(filter.apply(&mut record), FilterOutcome::NoSource);
}

#[test]
fn type_mismatch_keeps_raw_text() {
    let filter = CsvFilterBuilder::new()
        .columns(["count", "ratio", "day", "at", "flag"])
        .convert("count", "integer")
        .convert("ratio", "float")
        .convert("day", "date")
        .convert("at", "datetime")
        .convert("flag", "boolean")
        .build()
        .unwrap();
    let mut event = Event::with_message("abc,1.2.3,someday,never, Maybe ");

    assert_eq!(filter.apply(&mut event), FilterOutcome::Matched { fields: 5 });

    let json = event.to_json();
    assert_eq!(json["count"], json!("abc"));
    assert_eq!(json["ratio"], json!("1.2.3"));
    assert_eq!(json["day"], json!("someday"));
    assert_eq!(json["at"], json!("never"));
    assert_eq!(json["flag"], json!("maybe"));
    assert!(event.tags().is_empty());
}

#[test]
fn unknown_conversion_stops_configuration() {
    let settings = CsvFilterSettings::from_json_value(json!({
        "columns": ["a"],
        "convert": {"a": "integer", "b": "timestamp"}
    }))
    .unwrap();

    match CsvFilter::try_from(settings) {
        Err(FilterError::Configuration(message)) => {
            assert!(message.contains("convert[b]"));
            assert!(message.contains("timestamp"));
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[test]
fn separator_equal_to_quote_is_rejected() {
    let result = CsvFilterBuilder::new()
        .separator('\'')
        .quote_char('\'')
        .build();

    assert!(matches!(result, Err(FilterError::Configuration(_))));
}
