use std::{borrow::Cow, collections::HashMap};

use indexmap::IndexMap;

use super::converter::{Conversion, FieldValue};

/// Output of the mapper: field names to values, in first-seen order.
pub type FieldMap = IndexMap<String, FieldValue>;

/// Turns decoded values into named, optionally typed fields.
///
/// Each position gets its name from `columns`, or `column<N>` (1-based)
/// when the column list is too short and name generation is on. Positions
/// without a name are ignored. A name that occurs twice keeps the value of
/// the later position.
#[derive(Debug, Clone)]
pub struct FieldMapper {
    columns: Vec<String>,
    autogenerate_column_names: bool,
    skip_empty_columns: bool,
    conversions: HashMap<String, Conversion>,
}

impl Default for FieldMapper {
    /// No columns, generated names on, empty values kept.
    fn default() -> Self {
        Self::new(Vec::new(), true, false, HashMap::new())
    }
}

impl FieldMapper {
    pub fn new(
        columns: Vec<String>,
        autogenerate_column_names: bool,
        skip_empty_columns: bool,
        conversions: HashMap<String, Conversion>,
    ) -> Self {
        Self {
            columns,
            autogenerate_column_names,
            skip_empty_columns,
            conversions,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name for the value at `index`, or `None` when the position is ignored.
    pub fn resolve_name(&self, index: usize) -> Option<Cow<'_, str>> {
        match self.columns.get(index) {
            Some(name) => Some(Cow::Borrowed(name)),
            None if self.autogenerate_column_names => {
                Some(Cow::Owned(format!("column{}", index + 1)))
            }
            None => None,
        }
    }

    pub fn map<S: AsRef<str>>(&self, values: &[S]) -> FieldMap {
        let mut fields = FieldMap::with_capacity(values.len());

        for (index, value) in values.iter().enumerate() {
            let Some(name) = self.resolve_name(index) else {
                continue;
            };

            let value = value.as_ref();
            if self.skip_empty_columns && value.is_empty() {
                continue;
            }

            let value = match self.conversions.get(name.as_ref()) {
                Some(conversion) => conversion.apply(value),
                None => FieldValue::String(value.to_string()),
            };

            fields.insert(name.into_owned(), value);
        }

        fields
    }
}
