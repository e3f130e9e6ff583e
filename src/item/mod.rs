/// This module provides the CSV decoding and field-mapping stage.
pub mod csv;
