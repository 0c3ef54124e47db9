//! Background entry points
//!
//! [`CsvImporter::start`] and [`CsvImporter::start_structured`] return right
//! away. The scan runs on tokio's blocking pool and the caller's callbacks run
//! in a separate delivery task.
//!
//! # Architecture
//!
//! ```text
//! start()
//!     ├── worker   (spawn_blocking on the work runtime)
//!     │     └── ImportRun ── RunEvent ──┐
//!     │                                 │ unbounded mpsc
//!     └── delivery (spawn on the callback runtime)
//!           └── on_progress* → on_finish | on_fail
//! ```
//!
//! Events are delivered in the order the worker sent them, so every progress
//! report precedes the terminal callback. A run ends in exactly one of:
//!
//! - finished: `on_finish` receives the records
//! - failed: `on_fail` fires once, including when the worker dies (a panicking
//!   mapper) before reporting
//! - cancelled: neither fires
//!
//! When no runtime handle is configured, the runtime current at the `start`
//! call is used.

use crate::core::{RecordMapper, StructuredMapper};
use crate::importer::run::{ImportRun, RunOutcome};
use crate::importer::CsvImporter;
use crate::types::ImportError;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type FailCallback = Box<dyn FnOnce() + Send>;
type ProgressCallback = Box<dyn FnMut(usize) + Send>;
type FinishCallback<T> = Box<dyn FnOnce(Vec<T>) + Send>;

/// Callbacks of a background import
///
/// Every callback is optional. Without `on_progress` no progress is computed.
///
/// # Examples
///
/// ```
/// use csv_importer::importer::Callbacks;
///
/// let callbacks = Callbacks::<Vec<String>>::new()
///     .on_progress(|count| println!("{count} records so far"))
///     .on_finish(|records| println!("imported {}", records.len()))
///     .on_fail(|| eprintln!("import failed"));
/// ```
pub struct Callbacks<T> {
    on_fail: Option<FailCallback>,
    on_progress: Option<ProgressCallback>,
    on_finish: Option<FinishCallback<T>>,
}

impl<T> Callbacks<T> {
    pub fn new() -> Self {
        Self {
            on_fail: None,
            on_progress: None,
            on_finish: None,
        }
    }

    /// Called once if the source cannot be read
    pub fn on_fail(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_fail = Some(Box::new(callback));
        self
    }

    /// Called with the number of records imported so far, at most every 100ms
    pub fn on_progress(mut self, callback: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Called once with all records after the source is exhausted
    pub fn on_finish(mut self, callback: impl FnOnce(Vec<T>) + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(callback));
        self
    }
}

impl<T> Default for Callbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Callbacks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_fail", &self.on_fail.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// Final state of a background import
#[derive(Debug, Clone, PartialEq)]
pub enum ImportStatus {
    /// `on_finish` was called with `records` records
    Finished { records: usize },
    /// `on_fail` was called
    Failed(ImportError),
    /// The run was cancelled and no terminal callback was called
    Cancelled,
}

/// Handle to a running background import
///
/// Dropping the handle does not stop the import.
#[derive(Debug)]
pub struct ImportHandle {
    cancel: CancellationToken,
    delivery: JoinHandle<ImportStatus>,
}

impl ImportHandle {
    /// Stop the run before its next line
    ///
    /// Has no effect once the run has reached a terminal state.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// A token that cancels this run, for wiring into other shutdown logic
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Whether the terminal callback (if any) has run
    pub fn is_finished(&self) -> bool {
        self.delivery.is_finished()
    }

    /// Wait for the terminal callback and report how the run ended
    pub async fn join(self) -> ImportStatus {
        match self.delivery.await {
            Ok(status) => status,
            Err(e) => {
                tracing::error!(error = %e, "import callback task failed");
                ImportStatus::Failed(ImportError::WorkerAborted)
            }
        }
    }
}

enum RunEvent<T> {
    Progress(usize),
    Finished(Vec<T>),
    Failed(ImportError),
    Cancelled,
}

impl CsvImporter {
    /// Import every line in the background, mapping its fields with `mapper`
    ///
    /// # Errors
    ///
    /// `NoRuntime` if no runtime handle is configured and this is not called
    /// from within a tokio runtime. Source errors are reported through
    /// `on_fail`.
    pub fn start<M>(
        &self,
        mut mapper: M,
        callbacks: Callbacks<M::Output>,
    ) -> Result<ImportHandle, ImportError>
    where
        M: RecordMapper + Send + 'static,
        M::Output: Send + 'static,
    {
        self.spawn_run(callbacks, move |run, importer| {
            run.run_fields(importer, &mut mapper)
        })
    }

    /// Header-mode variant of [`start`](Self::start)
    ///
    /// # Errors
    ///
    /// Same as [`start`](Self::start).
    pub fn start_structured<M>(
        &self,
        mut mapper: M,
        callbacks: Callbacks<M::Output>,
    ) -> Result<ImportHandle, ImportError>
    where
        M: StructuredMapper + Send + 'static,
        M::Output: Send + 'static,
    {
        self.spawn_run(callbacks, move |run, importer| {
            run.run_structured(importer, &mut mapper)
        })
    }

    fn spawn_run<T, F>(&self, callbacks: Callbacks<T>, scan: F) -> Result<ImportHandle, ImportError>
    where
        T: Send + 'static,
        F: FnOnce(ImportRun<'_, T>, &CsvImporter) -> Result<RunOutcome<T>, ImportError>
            + Send
            + 'static,
    {
        let work = runtime_handle(self.work_runtime())?;
        let delivery = runtime_handle(self.callback_runtime())?;

        let cancel = CancellationToken::new();
        let (events, receiver) = mpsc::unbounded_channel();
        let wants_progress = callbacks.on_progress.is_some();
        let importer = self.clone();
        let token = cancel.clone();

        work.spawn_blocking(move || {
            let progress_events = events.clone();
            let mut run = ImportRun::new().with_cancellation(&token);
            if wants_progress {
                run = run.with_progress(move |count| {
                    let _ = progress_events.send(RunEvent::Progress(count));
                });
            }

            let event = match scan(run, &importer) {
                Ok(RunOutcome::Finished(records)) => RunEvent::Finished(records),
                Ok(RunOutcome::Cancelled) => RunEvent::Cancelled,
                Err(e) => RunEvent::Failed(e),
            };
            // The receiver is gone only if the delivery task was aborted.
            let _ = events.send(event);
        });

        tracing::debug!(source = ?self.source(), "import started");
        let delivery = delivery.spawn(deliver(receiver, callbacks));

        Ok(ImportHandle { cancel, delivery })
    }
}

fn runtime_handle(configured: Option<&Handle>) -> Result<Handle, ImportError> {
    match configured {
        Some(handle) => Ok(handle.clone()),
        None => Handle::try_current().map_err(|_| ImportError::NoRuntime),
    }
}

async fn deliver<T>(mut events: UnboundedReceiver<RunEvent<T>>, callbacks: Callbacks<T>) -> ImportStatus {
    let Callbacks {
        on_fail,
        mut on_progress,
        on_finish,
    } = callbacks;

    while let Some(event) = events.recv().await {
        match event {
            RunEvent::Progress(count) => {
                if let Some(progress) = on_progress.as_mut() {
                    progress(count);
                }
            }
            RunEvent::Finished(records) => {
                let count = records.len();
                if let Some(finish) = on_finish {
                    finish(records);
                }
                return ImportStatus::Finished { records: count };
            }
            RunEvent::Failed(error) => {
                tracing::error!(%error, "import failed");
                if let Some(fail) = on_fail {
                    fail();
                }
                return ImportStatus::Failed(error);
            }
            RunEvent::Cancelled => return ImportStatus::Cancelled,
        }
    }

    tracing::error!("import worker stopped without reporting a result");
    if let Some(fail) = on_fail {
        fail();
    }
    ImportStatus::Failed(ImportError::WorkerAborted)
}
