//! Header-keyed records
//!
//! The first line of a structured import is captured as a [`RecordStructure`];
//! every later line is zipped against it. Field counts have to match exactly,
//! otherwise the line produces no record.

use crate::types::{FieldList, StructuredRecord};

/// Ordered header names captured from the first line of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordStructure {
    header: FieldList,
}

impl RecordStructure {
    pub fn new(header: FieldList) -> Self {
        Self { header }
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Number of fields every data line must have
    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn is_empty(&self) -> bool {
        self.header.is_empty()
    }

    /// Zip a data line with the header
    ///
    /// Returns `None` when the field counts differ. With duplicate header names
    /// the value of the later column wins.
    pub fn structure(&self, values: FieldList) -> Option<StructuredRecord> {
        if values.len() != self.header.len() {
            return None;
        }

        Some(self.header.iter().cloned().zip(values).collect())
    }
}
