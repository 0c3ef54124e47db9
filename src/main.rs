//! CSV Importer CLI
//!
//! Imports a delimited text file and writes it back out as normalized CSV.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- teams.csv > normalized.csv
//! cargo run -- --delimiter ';' --header export.csv > normalized.csv
//! cargo run -- --encoding utf-16le --line-ending crlf file:///data/export.csv
//! ```
//!
//! The import runs through the background entry point on a tokio runtime and
//! logs progress to stderr. In `--header` mode the header row is written first
//! and lines that do not match it are left out.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (bad arguments, unreadable input, write failure)

use csv_importer::cli::{self, CliArgs};
use csv_importer::{Callbacks, CsvImporter, FieldList, ImportStatus, StructuredRecord};
use std::io::Write;
use std::process;
use tokio::sync::oneshot;

fn main() {
    let args = cli::parse_args();
    cli::init_cli_logger(args.verbose);

    if let Err(e) = run(&args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let config = args.to_importer_config().map_err(|e| e.to_string())?;
    let importer = if args.input_is_url() {
        CsvImporter::from_url(&args.input, config)
    } else {
        CsvImporter::from_path(&args.input, config)
    }
    .map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .build()
        .map_err(|e| format!("Failed to create tokio runtime: {}", e))?;

    let (header, rows) = if args.header {
        runtime.block_on(import_structured(&importer))?
    } else {
        (None, runtime.block_on(import_fields(&importer))?)
    };

    let stdout = std::io::stdout();
    write_csv(stdout.lock(), header.as_deref(), rows)
        .map_err(|e| format!("Failed to write output: {}", e))
}

async fn import_fields(importer: &CsvImporter) -> Result<Vec<FieldList>, String> {
    let (records_tx, records_rx) = oneshot::channel();
    let handle = importer
        .start(|fields: FieldList| fields, callbacks(records_tx))
        .map_err(|e| e.to_string())?;

    check(handle.join().await)?;
    records_rx
        .await
        .map_err(|_| "Import finished without delivering records".to_string())
}

async fn import_structured(
    importer: &CsvImporter,
) -> Result<(Option<FieldList>, Vec<FieldList>), String> {
    let (header_tx, header_rx) = oneshot::channel();
    let mut header_tx = Some(header_tx);
    let on_header = move |header: &[String]| {
        if let Some(tx) = header_tx.take() {
            let _ = tx.send(header.to_vec());
        }
    };

    let (records_tx, records_rx) = oneshot::channel();
    let handle = importer
        .start_structured(
            (on_header, |record: StructuredRecord| record),
            callbacks(records_tx),
        )
        .map_err(|e| e.to_string())?;

    check(handle.join().await)?;
    let records = records_rx
        .await
        .map_err(|_| "Import finished without delivering records".to_string())?;

    // An empty input has no header line.
    let Ok(header) = header_rx.await else {
        return Ok((None, Vec::new()));
    };
    let rows = records
        .into_iter()
        .map(|record| {
            header
                .iter()
                .map(|name| record.get(name).cloned().unwrap_or_default())
                .collect()
        })
        .collect();

    Ok((Some(header), rows))
}

fn callbacks<T: Send + 'static>(records: oneshot::Sender<Vec<T>>) -> Callbacks<T> {
    Callbacks::new()
        .on_progress(|count| tracing::info!(records = count, "importing"))
        .on_finish(move |rows| {
            let _ = records.send(rows);
        })
}

fn check(status: ImportStatus) -> Result<(), String> {
    match status {
        ImportStatus::Finished { records } => {
            tracing::info!(records, "import finished");
            Ok(())
        }
        ImportStatus::Failed(e) => Err(e.to_string()),
        ImportStatus::Cancelled => Err("Import was cancelled".to_string()),
    }
}

/// Write rows as CSV, quoting only where needed
///
/// Rows may differ in length when no header is enforced.
fn write_csv<W: Write>(
    output: W,
    header: Option<&[String]>,
    rows: Vec<FieldList>,
) -> Result<(), csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(output);

    if let Some(header) = header {
        writer.write_record(header)?;
    }
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}
