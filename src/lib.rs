#![cfg_attr(docsrs, feature(doc_cfg))]

/*!
 # CSV event filter

 A processing stage for event pipelines: it reads one CSV-encoded line from a
 record field, splits it into values, names each value and merges the result
 back into the record, at the root or under a target object.

 ## Core Concepts

- **Event:** the record flowing through the pipeline, a JSON object with named fields and a `tags` list.
- **FieldReference:** a path to a field, either `name` or `[outer][inner]`.
- **EventFields:** the capability the filter uses to read, merge and tag. `Event` implements it, and so can any other record type.
- **LineDecoder:** splits one line using a separator and a quote character.
- **FieldMapper:** names values by position, skips empty ones on request and converts typed columns.
- **CsvFilter:** runs both against a record and implements `ItemProcessor`.

 ## Behavior

| **Situation**                         | **Result**                                                      |
|---------------------------------------|-----------------------------------------------------------------|
| source field absent or null           | record untouched                                                |
| line decoded                          | fields merged, later duplicates overwrite earlier ones          |
| line malformed (e.g. unclosed quote)  | `_csvparsefailure` tag, warning logged, no field changed        |
| value does not fit its conversion     | raw text kept, no error                                         |
| unknown conversion kind               | `FilterError::Configuration` when the filter is built           |

 ## Getting Started

```rust
# use csv_event_filter::{
#     core::{event::Event, item::ItemProcessor},
#     error::FilterError,
#     item::csv::csv_filter::CsvFilterBuilder,
# };
# use serde_json::json;
fn main() -> Result<(), FilterError> {
    let filter = CsvFilterBuilder::new()
        .columns(["year", "make", "model"])
        .convert("year", "integer")
        .skip_empty_columns(true)
        .target("[car]")
        .build()?;

    let event = filter
        .process(&Event::with_message("1948,Porsche,,Luxury sports car"))?
        .expect("only header lines are dropped");

    assert_eq!(
        event.to_json()["car"],
        json!({"year": 1948, "make": "Porsche", "column4": "Luxury sports car"})
    );

    Ok(())
}
```

 Filters can also be loaded from JSON configuration with
 [`CsvFilterSettings`](item::csv::settings::CsvFilterSettings).

 ## Logging

 The crate logs through the [`log`](https://docs.rs/log) facade: `debug` for
 each processed record and `warn` for records that could not be decoded.
 Install any logger in the host application to see them.

 ## License
 Licensed under either of

 -   Apache License, Version 2.0
     ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
 -   MIT license
     ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)

 at your option.
 */

/// Core module for records and processing contracts
pub mod core;

/// Error types for filter operations
pub mod error;

#[doc(inline)]
pub use error::*;

/// Pipeline stages (for example: the csv filter)
pub mod item;
