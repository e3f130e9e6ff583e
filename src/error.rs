use thiserror::Error;

use crate::item::csv::line_decoder::DecodeError;

#[derive(Error, Debug, PartialEq)]
/// Filter error
pub enum FilterError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("CSV decoding from: {0}")]
    Decode(#[from] DecodeError),

    #[error("Source field {field} holds a {found} value, expected a string")]
    SourceType { field: String, found: &'static str },

    #[error("Invalid field reference: {0}")]
    FieldReference(String),
}
