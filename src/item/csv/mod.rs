//! CSV decoding and field mapping for single-line records.
//!
//! This module turns a record field holding one CSV line into named, optionally
//! typed fields of that same record.
//!
//! # Module Architecture
//!
//! The work is split in four parts, each usable on its own:
//!
//! 1. **LineDecoder**: splits a line into raw values using a configurable
//!    separator and quote character, rejecting malformed quoting.
//!
//! 2. **FieldMapper**: names values by position (explicit columns, then
//!    generated `columnN` names), skips empty values on request and applies
//!    the configured conversions.
//!
//! 3. **Conversion**: the closed set of type conversions (`integer`, `float`,
//!    `date`, `datetime`, `boolean`). A value that does not fit its type is
//!    kept as text rather than failing the record.
//!
//! 4. **CsvFilter**: ties the parts together against a record, tags records
//!    whose line cannot be decoded and implements `ItemProcessor`.
//!
//! Filters are configured with `CsvFilterBuilder` or deserialized from
//! `CsvFilterSettings`.
//!
//! # Examples
//!
//! ```
//! use csv_event_filter::core::event::Event;
//! use csv_event_filter::core::item::ItemProcessor;
//! use csv_event_filter::item::csv::csv_filter::CsvFilterBuilder;
//! use serde_json::json;
//!
//! let filter = CsvFilterBuilder::new()
//!     .columns(["x", "y"])
//!     .autogenerate_column_names(false)
//!     .build()
//!     .unwrap();
//!
//! let event = filter
//!     .process(&Event::with_message("a,b,c"))
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(event.to_json(), json!({"message": "a,b,c", "x": "a", "y": "b"}));
//! ```
//!
//! A line that is not valid CSV leaves the record as it was, apart from a tag:
//!
//! ```
//! use csv_event_filter::core::event::Event;
//! use csv_event_filter::item::csv::csv_filter::CsvFilterBuilder;
//!
//! let filter = CsvFilterBuilder::new().build().unwrap();
//! let mut event = Event::with_message("a,\"b,c");
//!
//! filter.apply(&mut event);
//!
//! assert_eq!(event.tags(), vec!["_csvparsefailure"]);
//! assert!(event.to_json().get("column1").is_none());
//! ```

/// Conversion kinds and the typed values they produce.
pub mod converter;

/// The filter applied to records, and its builder.
pub mod csv_filter;

/// Positional naming and conversion of decoded values.
pub mod field_mapper;

/// Tokenizer for a single CSV line.
pub mod line_decoder;

/// Serde configuration for the filter.
pub mod settings;
