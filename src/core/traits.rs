//! Mapper traits
//!
//! A mapper turns one parsed line into the caller's record type. Closures
//! implement both traits, so most callers never name them:
//!
//! - `FnMut(Vec<String>) -> T` is a [`RecordMapper`]
//! - a `(FnMut(&[String]), FnMut(StructuredRecord) -> T)` pair is a
//!   [`StructuredMapper`]: the first closure sees the header, the second maps
//!   every data line

use crate::types::{FieldList, StructuredRecord};

/// Maps the ordered fields of a line to a record
pub trait RecordMapper {
    type Output;

    fn map_fields(&mut self, fields: FieldList) -> Self::Output;
}

/// Maps header-keyed lines to records
pub trait StructuredMapper {
    type Output;

    /// Called once with the header line, before any data line is mapped
    fn on_header(&mut self, header: &[String]) {
        let _ = header;
    }

    fn map_structured(&mut self, record: StructuredRecord) -> Self::Output;
}

impl<F, T> RecordMapper for F
where
    F: FnMut(FieldList) -> T,
{
    type Output = T;

    fn map_fields(&mut self, fields: FieldList) -> T {
        self(fields)
    }
}

impl<H, F, T> StructuredMapper for (H, F)
where
    H: FnMut(&[String]),
    F: FnMut(StructuredRecord) -> T,
{
    type Output = T;

    fn on_header(&mut self, header: &[String]) {
        (self.0)(header)
    }

    fn map_structured(&mut self, record: StructuredRecord) -> T {
        (self.1)(record)
    }
}
