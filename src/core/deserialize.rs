//! Serde-backed mapper
//!
//! [`Deserialized`] maps lines into any `DeserializeOwned` type by handing the
//! dequoted fields to `csv::StringRecord::deserialize`. Without a header the
//! fields bind by position (tuples, or struct fields in declaration order); in a
//! structured import they bind by header name.
//!
//! Conversion failures stay per line: every record is a `Result`, so one bad
//! value does not end the run.

use crate::core::traits::{RecordMapper, StructuredMapper};
use crate::types::{FieldList, StructuredRecord};
use csv::StringRecord;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// Maps lines into `T` through serde
///
/// # Examples
///
/// ```
/// use csv_importer::core::Deserialized;
/// use csv_importer::{CsvImporter, ImporterConfig};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Team {
///     id: u32,
///     name: String,
/// }
///
/// let importer = CsvImporter::from_text("id,name\n7,\"Red, Stockings\"\n", ImporterConfig::default()).unwrap();
/// let teams = importer.import_structured(Deserialized::<Team>::new()).unwrap();
/// assert_eq!(teams[0].as_ref().unwrap(), &Team { id: 7, name: "Red, Stockings".to_string() });
/// ```
#[derive(Debug)]
pub struct Deserialized<T> {
    headers: Option<StringRecord>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Deserialized<T> {
    pub fn new() -> Self {
        Self {
            headers: None,
            _record: PhantomData,
        }
    }
}

impl<T> Default for Deserialized<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: DeserializeOwned> RecordMapper for Deserialized<T> {
    type Output = Result<T, csv::Error>;

    fn map_fields(&mut self, fields: FieldList) -> Self::Output {
        StringRecord::from(fields).deserialize(None)
    }
}

impl<T: DeserializeOwned> StructuredMapper for Deserialized<T> {
    type Output = Result<T, csv::Error>;

    fn on_header(&mut self, header: &[String]) {
        self.headers = Some(StringRecord::from(header.to_vec()));
    }

    fn map_structured(&mut self, mut record: StructuredRecord) -> Self::Output {
        let Some(headers) = self.headers.as_ref() else {
            let values: Vec<String> = record.into_values().collect();
            return StringRecord::from(values).deserialize(None);
        };

        // Restore header order; a duplicated name repeats its surviving value.
        let values: StringRecord = headers
            .iter()
            .map(|name| record.get(name).cloned().unwrap_or_default())
            .collect();
        record.clear();
        values.deserialize(Some(headers))
    }
}
