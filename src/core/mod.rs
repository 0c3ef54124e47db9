//! Parsing core
//!
//! Everything that turns a decoded line into a record:
//! - `field_splitter` - Delimiter splitting with quote repair
//! - `record_structurer` - Header capture and header-keyed records
//! - `traits` - Mapper traits implemented by closures and `Deserialized`
//! - `deserialize` - Serde-backed mapper

pub mod deserialize;
pub mod field_splitter;
pub mod record_structurer;
pub mod traits;

pub use deserialize::Deserialized;
pub use field_splitter::FieldSplitter;
pub use record_structurer::RecordStructure;
pub use traits::{RecordMapper, StructuredMapper};
