//! The import engine
//!
//! One [`ImportRun`] is created per import and owns everything mutable about it:
//! the collected records, the progress throttle and the cancellation token. Both
//! the blocking and the background entry points drive the same two scans,
//! [`ImportRun::run_fields`] and [`ImportRun::run_structured`].
//!
//! # Error Handling
//!
//! Opening the source and reading from it are fatal and end the run with an
//! [`ImportError`]; no partial records are returned. Everything that goes wrong
//! with a single line is a [`Diagnostic`] and the run moves on.

use crate::core::{RecordMapper, RecordStructure, StructuredMapper};
use crate::importer::CsvImporter;
use crate::io::LineError;
use crate::types::{Diagnostic, FieldList, ImportError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Minimum time between two progress reports
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// How a run ended when it did not fail
#[derive(Debug, PartialEq)]
pub enum RunOutcome<T> {
    /// Every line was consumed
    Finished(Vec<T>),
    /// The token was cancelled before the source was exhausted
    Cancelled,
}

/// State of a single import
pub struct ImportRun<'a, T> {
    records: Vec<T>,
    last_progress: Option<Instant>,
    progress: Option<Box<dyn FnMut(usize) + 'a>>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a, T> ImportRun<'a, T> {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            last_progress: None,
            progress: None,
            cancel: None,
        }
    }

    /// Report the running record count to `progress`, throttled to
    /// [`PROGRESS_INTERVAL`]
    pub fn with_progress(mut self, progress: impl FnMut(usize) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Stop before the next line once `token` is cancelled
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Map every line to a record
    pub fn run_fields<M>(
        mut self,
        importer: &CsvImporter,
        mapper: &mut M,
    ) -> Result<RunOutcome<T>, ImportError>
    where
        M: RecordMapper<Output = T>,
    {
        let cancel = self.cancel;
        let completed = scan_lines(importer, cancel, |_, fields| {
            let record = mapper.map_fields(fields);
            self.push(record);
        })?;

        Ok(self.finish(completed))
    }

    /// Use the first line as header and map every later line by name
    ///
    /// Lines whose field count differs from the header's produce no record.
    pub fn run_structured<M>(
        mut self,
        importer: &CsvImporter,
        mapper: &mut M,
    ) -> Result<RunOutcome<T>, ImportError>
    where
        M: StructuredMapper<Output = T>,
    {
        let cancel = self.cancel;
        let mut structure: Option<RecordStructure> = None;

        let completed = scan_lines(importer, cancel, |line_number, fields| {
            match structure.as_ref() {
                None => {
                    tracing::debug!(columns = fields.len(), "captured header");
                    mapper.on_header(&fields);
                    structure = Some(RecordStructure::new(fields));
                }
                Some(header) => {
                    let actual = fields.len();
                    match header.structure(fields) {
                        Some(record) => {
                            let record = mapper.map_structured(record);
                            self.push(record);
                        }
                        None => Diagnostic::StructureMismatch {
                            line: line_number,
                            expected: header.len(),
                            actual,
                        }
                        .emit(),
                    }
                }
            }
        })?;

        Ok(self.finish(completed))
    }

    fn push(&mut self, record: T) {
        self.records.push(record);

        let Some(progress) = self.progress.as_mut() else {
            return;
        };
        let now = Instant::now();
        let due = match self.last_progress {
            Some(last) => now.duration_since(last) > PROGRESS_INTERVAL,
            None => true,
        };
        if due {
            progress(self.records.len());
            self.last_progress = Some(now);
        }
    }

    fn finish(self, completed: bool) -> RunOutcome<T> {
        if completed {
            tracing::debug!(records = self.records.len(), "import finished");
            RunOutcome::Finished(self.records)
        } else {
            tracing::debug!(records = self.records.len(), "import cancelled");
            RunOutcome::Cancelled
        }
    }
}

impl<T> Default for ImportRun<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed every split line to `on_line` with its 1-based number
///
/// Returns `false` when the scan stopped because of cancellation.
fn scan_lines<F>(
    importer: &CsvImporter,
    cancel: Option<&CancellationToken>,
    mut on_line: F,
) -> Result<bool, ImportError>
where
    F: FnMut(usize, FieldList),
{
    let mut lines = importer.open_lines()?;
    let splitter = importer.splitter();
    let mut line_number = 0;

    loop {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return Ok(false);
        }
        let Some(line) = lines.next() else {
            break;
        };
        line_number += 1;

        match line {
            Ok(text) => on_line(line_number, splitter.split_line(line_number, &text)),
            Err(LineError::Decode { encoding }) => Diagnostic::DecodeFailure {
                line: line_number,
                encoding: encoding.to_string(),
            }
            .emit(),
            Err(LineError::Io(e)) => {
                tracing::error!(line = line_number, error = %e, "reading source failed");
                return Err(e.into());
            }
        }
    }

    tracing::trace!(lines = line_number, line_ending = ?lines.line_ending(), "source exhausted");
    Ok(true)
}
