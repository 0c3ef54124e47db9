//! Parsed line and record shapes

use std::collections::HashMap;

/// Ordered field values of one line after dequoting.
///
/// Lines may have different arities; nothing enforces a fixed width.
pub type FieldList = Vec<String>;

/// Header-keyed view of one data line.
///
/// Built fresh for every data line. Duplicate header names keep the value of
/// their last occurrence.
pub type StructuredRecord = HashMap<String, String>;
