//! Blocking entry points
//!
//! Run the import on the calling thread and return the records, or the error
//! that stopped the run. Suitable for CLIs, tests and anything already running
//! on a worker thread.

use crate::core::{RecordMapper, StructuredMapper};
use crate::importer::run::{ImportRun, RunOutcome};
use crate::importer::CsvImporter;
use crate::types::ImportError;

impl CsvImporter {
    /// Import every line, mapping its fields with `mapper`
    ///
    /// # Errors
    ///
    /// `SourceUnavailable` if the file cannot be opened and `Read` if reading
    /// fails part way. An empty source is `Ok` with no records.
    ///
    /// # Examples
    ///
    /// ```
    /// use csv_importer::{CsvImporter, ImporterConfig};
    ///
    /// let importer = CsvImporter::from_text("1,Alice\n2,Bob", ImporterConfig::default()).unwrap();
    /// let names = importer.import_records(|fields: Vec<String>| fields[1].clone()).unwrap();
    /// assert_eq!(names, vec!["Alice", "Bob"]);
    /// ```
    pub fn import_records<M>(&self, mut mapper: M) -> Result<Vec<M::Output>, ImportError>
    where
        M: RecordMapper,
    {
        let outcome = ImportRun::new().run_fields(self, &mut mapper)?;
        Ok(records_of(outcome))
    }

    /// Import with the first line as header, mapping the other lines by name
    ///
    /// Lines with a different number of fields than the header are skipped.
    ///
    /// # Errors
    ///
    /// Same as [`import_records`](Self::import_records).
    pub fn import_structured<M>(&self, mut mapper: M) -> Result<Vec<M::Output>, ImportError>
    where
        M: StructuredMapper,
    {
        let outcome = ImportRun::new().run_structured(self, &mut mapper)?;
        Ok(records_of(outcome))
    }
}

/// A blocking run carries no token, so it always runs to the end.
fn records_of<T>(outcome: RunOutcome<T>) -> Vec<T> {
    match outcome {
        RunOutcome::Finished(records) => records,
        RunOutcome::Cancelled => Vec::new(),
    }
}
