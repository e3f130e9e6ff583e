//! Mock version of a pipeline record.
use csv_event_filter::{
    core::event::{EventFields, FieldReference},
    error::FilterError,
    item::csv::field_mapper::FieldMap,
};
use mockall::mock;
use serde_json::Value;

mock! {
    pub Record {}
    impl EventFields for Record {
        fn get_field(&self, field: &FieldReference) -> Option<Value>;
        fn merge_fields(&mut self, target: &[String], fields: FieldMap) -> Result<(), FilterError>;
        fn add_tag(&mut self, tag: &str);
    }
}
