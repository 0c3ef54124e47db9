//! End-to-end integration tests
//!
//! These tests drive the importer through its public API against the fixtures
//! in tests/fixtures/ and against files generated on the fly:
//! - teams.csv: a CRLF export with a 48-column header
//! - comma_semicolon_quotes.csv: `;`-delimited lines with quoted delimiters and
//!   doubled quotes
//!
//! Most scenarios run through the blocking and the background entry points.

#[cfg(test)]
mod tests {
    use csv_importer::{
        Callbacks, CsvImporter, Deserialized, FieldList, ImportError, ImportStatus,
        ImporterConfig, LineEnding, StructuredRecord, DIAGNOSTICS_TARGET,
    };
    use encoding_rs::UTF_16LE;
    use rstest::rstest;
    use serde::Deserialize;
    use std::collections::BTreeMap;
    use std::fmt;
    use std::fs;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc, Mutex};
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    const TEAMS: &str = "tests/fixtures/teams.csv";
    const SEMICOLONS: &str = "tests/fixtures/comma_semicolon_quotes.csv";

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    /// teams.csv with its CRLF terminators replaced
    fn teams_with_line_ending(terminator: &str) -> NamedTempFile {
        let content = fs::read_to_string(TEAMS).expect("Failed to read teams fixture");
        assert!(content.contains("\r\n"));
        create_temp_csv(content.replace("\r\n", terminator).as_bytes())
    }

    fn fixture_url(path: &str) -> String {
        let absolute: PathBuf = Path::new(env!("CARGO_MANIFEST_DIR")).join(path);
        url::Url::from_file_path(absolute)
            .expect("Fixture path is absolute")
            .to_string()
    }

    fn keep(record: StructuredRecord) -> StructuredRecord {
        record
    }

    fn ignore_header(_: &[String]) {}

    fn assert_boston_1871(record: &StructuredRecord) {
        assert_eq!(record.len(), 48);
        assert_eq!(record["yearID"], "1871");
        assert_eq!(record["teamID"], "BS1");
        assert_eq!(record["name"], "Boston Red Stockings");
        assert_eq!(record["park"], "South End Grounds I");
        assert_eq!(record["ERA"], "3.55");
        assert_eq!(record["2B"], "70");
        assert_eq!(record["teamIDretro"], "BS1");
        assert_eq!(record["WCWin"], "");
        assert_eq!(record["attendance"], "");
    }

    /// Run a structured background import and collect what on_finish received
    async fn import_structured_in_background(
        importer: &CsvImporter,
    ) -> (ImportStatus, Option<Vec<StructuredRecord>>) {
        let received = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);

        let handle = importer
            .start_structured(
                (ignore_header, keep),
                Callbacks::new().on_finish(move |records| {
                    *sink.lock().unwrap() = Some(records);
                }),
            )
            .expect("Failed to start import");

        let status = handle.join().await;
        let records = received.lock().unwrap().take();
        (status, records)
    }

    #[test]
    fn test_teams_with_header_synchronously() {
        let importer = CsvImporter::from_path(TEAMS, ImporterConfig::default()).unwrap();
        let records = importer
            .import_structured((ignore_header, keep))
            .expect("Import failed");

        assert_eq!(records.len(), 4);
        assert_boston_1871(&records[0]);
        assert_eq!(records[3]["name"], "Fort Wayne Kekiongas");
    }

    #[test]
    fn test_teams_without_header_synchronously() {
        let importer = CsvImporter::from_path(TEAMS, ImporterConfig::default()).unwrap();
        let records = importer
            .import_records(|fields: FieldList| fields)
            .expect("Import failed");

        assert_eq!(records.len(), 5);
        assert!(records.iter().all(|fields| fields.len() == 48));
        assert_eq!(records[0][0], "yearID");
    }

    #[tokio::test]
    async fn test_teams_with_header_from_path_url_and_text() {
        let config = ImporterConfig::default;
        let text = fs::read_to_string(TEAMS).unwrap();
        let importers = [
            CsvImporter::from_path(TEAMS, config()).unwrap(),
            CsvImporter::from_url(&fixture_url(TEAMS), config()).unwrap(),
            CsvImporter::from_text(text, config()).unwrap(),
        ];

        for importer in &importers {
            let (status, records) = import_structured_in_background(importer).await;
            assert_eq!(status, ImportStatus::Finished { records: 4 });
            assert_boston_1871(&records.unwrap()[0]);
        }
    }

    #[rstest]
    #[case::lf_detected("\n", LineEnding::Unknown)]
    #[case::lf_declared("\n", LineEnding::Lf)]
    #[case::cr_detected("\r", LineEnding::Unknown)]
    #[case::cr_declared("\r", LineEnding::Cr)]
    #[case::crlf_declared("\r\n", LineEnding::CrLf)]
    fn test_teams_with_other_line_endings(#[case] terminator: &str, #[case] line_ending: LineEnding) {
        let file = teams_with_line_ending(terminator);
        let config = ImporterConfig::default().with_line_ending(line_ending);
        let importer = CsvImporter::from_path(file.path(), config).unwrap();

        let records = importer.import_structured((ignore_header, keep)).unwrap();
        assert_eq!(records.len(), 4);
        assert_boston_1871(&records[0]);
    }

    #[test]
    fn test_wrong_line_ending_imports_garbled_records() {
        let config = ImporterConfig::default().with_line_ending(LineEnding::Lf);
        let importer = CsvImporter::from_path(TEAMS, config).unwrap();

        let records = importer.import_structured((ignore_header, keep)).unwrap();
        assert_eq!(records.len(), 4);
        assert!(!records[0].contains_key("teamIDretro"));
        assert_eq!(records[0]["teamIDretro\r"], "BS1\r");
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(7)]
    #[case(64)]
    #[case(4096)]
    #[case(1 << 20)]
    fn test_chunk_size_does_not_change_records(#[case] chunk_size: usize) {
        let reference = CsvImporter::from_path(TEAMS, ImporterConfig::default())
            .unwrap()
            .import_records(|fields: FieldList| fields)
            .unwrap();

        let config = ImporterConfig::default().with_chunk_size(chunk_size);
        let records = CsvImporter::from_path(TEAMS, config)
            .unwrap()
            .import_records(|fields: FieldList| fields)
            .unwrap();

        assert_eq!(records, reference);
    }

    #[tokio::test]
    async fn test_semicolon_delimited_special_characters() {
        let config = ImporterConfig::default().with_delimiter(";");
        let importer = CsvImporter::from_path(SEMICOLONS, config).unwrap();

        let (records_tx, records_rx) = tokio::sync::oneshot::channel();
        let handle = importer
            .start(
                |fields: FieldList| fields,
                Callbacks::new().on_finish(move |records| {
                    let _ = records_tx.send(records);
                }),
            )
            .unwrap();

        assert_eq!(handle.join().await, ImportStatus::Finished { records: 2 });
        let records = records_rx.await.unwrap();
        assert_eq!(
            records[0],
            vec![
                "",
                "Text, with \"comma\"; and 'semicolon'.",
                "",
                "Another text with \"comma\"; and 'semicolon'!",
                "Text without special chars.",
                "",
            ]
        );
        assert_eq!(records[1], vec!["1", "two; three", "four"]);
    }

    #[tokio::test]
    async fn test_wrong_path_fails_once_and_never_finishes() {
        let fails = Arc::new(AtomicUsize::new(0));
        let progress = Arc::new(AtomicUsize::new(0));
        let finishes = Arc::new(AtomicUsize::new(0));
        let (f, p, g) = (
            Arc::clone(&fails),
            Arc::clone(&progress),
            Arc::clone(&finishes),
        );

        let importer = CsvImporter::from_path("invalid/path", ImporterConfig::default()).unwrap();
        let handle = importer
            .start(
                |fields: FieldList| fields,
                Callbacks::new()
                    .on_fail(move || {
                        f.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_progress(move |_| {
                        p.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_finish(move |_| {
                        g.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap();

        match handle.join().await {
            ImportStatus::Failed(ImportError::SourceUnavailable { path, .. }) => {
                assert_eq!(path, "invalid/path")
            }
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
        assert_eq!(fails.load(Ordering::SeqCst), 1);
        assert_eq!(progress.load(Ordering::SeqCst), 0);
        assert_eq!(finishes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_wrong_path_synchronously_is_an_error() {
        let importer = CsvImporter::from_path("invalid/path", ImporterConfig::default()).unwrap();
        let result = importer.import_structured((ignore_header, keep));
        assert!(matches!(result, Err(ImportError::SourceUnavailable { .. })));
    }

    #[rstest]
    #[case::web("https://www.example.com")]
    #[case::remote_share("file://fileserver/teams.csv")]
    fn test_non_local_urls_are_rejected(#[case] url: &str) {
        let result = CsvImporter::from_url(url, ImporterConfig::default());
        assert!(matches!(result, Err(ImportError::UnsupportedUrl { .. })));
    }

    #[tokio::test]
    async fn test_utf16_little_endian_file_with_header() {
        let text = "Id,Name,City\r\n10392545,Jürgen Groß,Köln\r\n10392546,\"Åsa, Berg\",Malmö\r\n";
        let mut bytes = vec![0xFF, 0xFE];
        bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
        let file = create_temp_csv(&bytes);

        let config = ImporterConfig::default()
            .with_line_ending(LineEnding::CrLf)
            .with_encoding(UTF_16LE)
            .with_chunk_size(7);
        let importer = CsvImporter::from_path(file.path(), config).unwrap();

        let (status, records) = import_structured_in_background(&importer).await;
        assert_eq!(status, ImportStatus::Finished { records: 2 });

        let records = records.unwrap();
        assert_eq!(records[0]["Id"], "10392545");
        assert_eq!(records[0]["Name"], "Jürgen Groß");
        assert_eq!(records[1]["Name"], "Åsa, Berg");
        assert_eq!(records[1]["City"], "Malmö");
    }

    #[test]
    fn test_undecodable_line_is_skipped() {
        let file = create_temp_csv(b"id,name\n1,Alice\n2,\xFF\xFEbroken\n3,Carol\n");
        let importer = CsvImporter::from_path(file.path(), ImporterConfig::default()).unwrap();

        let records = importer.import_structured((ignore_header, keep)).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[rstest]
    #[case::too_short("id,name\n1\n2,Bob\n", &["2"])]
    #[case::too_long("id,name\n1,Alice,extra\n2,Bob\n", &["2"])]
    #[case::all_good("id,name\n1,Alice\n2,Bob\n", &["1", "2"])]
    #[case::header_only("id,name\n", &[])]
    #[case::empty("", &[])]
    fn test_mismatched_rows_are_skipped(#[case] text: &str, #[case] expected_ids: &[&str]) {
        let importer = CsvImporter::from_text(text, ImporterConfig::default()).unwrap();
        let records = importer.import_structured((ignore_header, keep)).unwrap();

        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, expected_ids);
    }

    /// Diagnostic events seen by a subscriber, as `(field name, value)` maps
    #[derive(Clone, Default)]
    struct DiagnosticCapture {
        events: Arc<Mutex<Vec<BTreeMap<String, String>>>>,
    }

    struct FieldRecorder<'a>(&'a mut BTreeMap<String, String>);

    impl Visit for FieldRecorder<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_string(), value.to_string());
        }

        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_string(), format!("{:?}", value));
        }
    }

    impl<S: Subscriber> Layer<S> for DiagnosticCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target() != DIAGNOSTICS_TARGET {
                return;
            }
            let mut fields = BTreeMap::new();
            event.record(&mut FieldRecorder(&mut fields));
            self.events.lock().unwrap().push(fields);
        }
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_diagnostics_carry_structured_fields() {
        let file = create_temp_csv(b"id,name\n1,Alice\n2\n3,\"Bob\n4,\xFFbroken\n5,Eve\n");
        let importer = CsvImporter::from_path(file.path(), ImporterConfig::default()).unwrap();

        let capture = DiagnosticCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let records = tracing::subscriber::with_default(subscriber, || {
            importer.import_structured((ignore_header, keep)).unwrap()
        });

        let ids: Vec<&str> = records.iter().map(|r| r["id"].as_str()).collect();
        assert_eq!(ids, vec!["1", "3", "5"]);

        let mut events = capture.events.lock().unwrap().clone();
        for event in &mut events {
            assert!(event.remove("message").is_some());
        }
        assert_eq!(
            events,
            vec![
                fields(&[
                    ("kind", "structure_mismatch"),
                    ("line", "3"),
                    ("expected", "2"),
                    ("actual", "1"),
                ]),
                fields(&[("kind", "unterminated_quote"), ("line", "4")]),
                fields(&[("kind", "decode_failure"), ("line", "5"), ("encoding", "UTF-8")]),
            ]
        );
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Team {
        #[serde(rename = "yearID")]
        year: u16,
        #[serde(rename = "teamID")]
        team: String,
        name: String,
        #[serde(rename = "W")]
        wins: u32,
        #[serde(rename = "L")]
        losses: u32,
        #[serde(rename = "attendance")]
        attendance: Option<u64>,
    }

    #[test]
    fn test_deserialize_teams_by_header_name() {
        let importer = CsvImporter::from_path(TEAMS, ImporterConfig::default()).unwrap();
        let teams: Vec<Team> = importer
            .import_structured(Deserialized::<Team>::new())
            .unwrap()
            .into_iter()
            .collect::<Result<_, _>>()
            .expect("Every team should deserialize");

        assert_eq!(
            teams[0],
            Team {
                year: 1871,
                team: "BS1".to_string(),
                name: "Boston Red Stockings".to_string(),
                wins: 20,
                losses: 10,
                attendance: None,
            }
        );
        assert_eq!(teams.iter().map(|t| t.wins).sum::<u32>(), 56);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_suppresses_terminal_callbacks() {
        let text: String = (0..1000).map(|i| format!("{i},value {i}\n")).collect();
        let importer = CsvImporter::from_text(text, ImporterConfig::default()).unwrap();

        let (started_tx, started_rx) = mpsc::channel();
        let (resume_tx, resume_rx) = mpsc::channel::<()>();
        let mut first = true;
        let mapper = move |fields: FieldList| {
            if first {
                first = false;
                let _ = started_tx.send(());
                let _ = resume_rx.recv();
            }
            fields
        };

        let terminal = Arc::new(AtomicUsize::new(0));
        let (f, g) = (Arc::clone(&terminal), Arc::clone(&terminal));
        let handle = importer
            .start(
                mapper,
                Callbacks::new()
                    .on_fail(move || {
                        f.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_finish(move |_| {
                        g.fetch_add(1, Ordering::SeqCst);
                    }),
            )
            .unwrap();

        started_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("Mapper never ran");
        handle.cancel();
        resume_tx.send(()).unwrap();

        assert_eq!(handle.join().await, ImportStatus::Cancelled);
        assert_eq!(terminal.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_progress_is_throttled() {
        let text: String = (0..12).map(|i| format!("{i}\n")).collect();
        let importer = CsvImporter::from_text(text, ImporterConfig::default()).unwrap();

        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let handle = importer
            .start(
                |fields: FieldList| {
                    std::thread::sleep(Duration::from_millis(30));
                    fields
                },
                Callbacks::new().on_progress(move |count| sink.lock().unwrap().push(count)),
            )
            .unwrap();

        assert_eq!(handle.join().await, ImportStatus::Finished { records: 12 });

        let reports = reports.lock().unwrap().clone();
        assert_eq!(reports.first(), Some(&1));
        assert!(reports.len() >= 2, "reports: {:?}", reports);
        assert!(reports.len() < 12, "reports: {:?}", reports);
        assert!(reports.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_runs_from_one_importer() {
        let importer = CsvImporter::from_path(TEAMS, ImporterConfig::default()).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                importer
                    .start_structured((ignore_header, keep), Callbacks::new())
                    .unwrap()
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().await, ImportStatus::Finished { records: 4 });
        }
    }

    #[test]
    fn test_cli_writes_normalized_csv() {
        let output = std::process::Command::new(env!("CARGO_BIN_EXE_csv-import"))
            .args(["--delimiter", ";", SEMICOLONS])
            .output()
            .expect("Failed to run csv-import");

        assert!(output.status.success());
        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            concat!(
                ",\"Text, with \"\"comma\"\"; and 'semicolon'.\",,",
                "\"Another text with \"\"comma\"\"; and 'semicolon'!\",Text without special chars.,\n",
                "1,two; three,four\n",
            )
        );
    }

    #[test]
    fn test_cli_header_mode_keeps_header_order() {
        let file = create_temp_csv(b"id,name\n1,Alice\n2\n3,\"Carol, C.\"\n");
        let output = std::process::Command::new(env!("CARGO_BIN_EXE_csv-import"))
            .arg("--header")
            .arg(file.path())
            .output()
            .expect("Failed to run csv-import");

        assert!(output.status.success());
        assert_eq!(
            String::from_utf8(output.stdout).unwrap(),
            "id,name\n1,Alice\n3,\"Carol, C.\"\n"
        );
    }

    #[test]
    fn test_cli_fails_on_missing_input() {
        let status = std::process::Command::new(env!("CARGO_BIN_EXE_csv-import"))
            .arg("invalid/path.csv")
            .output()
            .expect("Failed to run csv-import")
            .status;

        assert_eq!(status.code(), Some(1));
    }
}
