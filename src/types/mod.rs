//! Types module
//!
//! Contains the data shapes shared by the readers, the parser and the importer:
//! - `line_ending`: line terminator selection
//! - `record`: field lists and header-keyed records
//! - `error`: fatal errors and per-line diagnostics

pub mod error;
pub mod line_ending;
pub mod record;

pub use error::{Diagnostic, ImportError, DIAGNOSTICS_TARGET};
pub use line_ending::LineEnding;
pub use record::{FieldList, StructuredRecord};
