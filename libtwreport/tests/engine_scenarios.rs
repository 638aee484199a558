//! End-to-end behaviour of the batch engine against the mock client
//!
//! Each test runs a full batch in a temporary directory and checks the
//! output log on disk.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use libtwreport::clients::mock::{MockClient, MockResponse};
use libtwreport::error::{RemoteError, TwreportError};
use libtwreport::prompt::TerminalGate;
use libtwreport::source::RowSource;
use libtwreport::{BatchEngine, BatchJob};
use tempfile::TempDir;

const HEADER: &str = "screen_name,report,block\n";

struct TestEnv {
    _temp_dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

impl TestEnv {
    fn new(input: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let input_path = temp_dir.path().join("accounts.csv");
        std::fs::write(&input_path, input).unwrap();
        let output = temp_dir.path().join("reported.csv");

        Self {
            _temp_dir: temp_dir,
            input: input_path,
            output,
        }
    }

    /// No prompt, millisecond back-off
    fn job(&self) -> BatchJob {
        BatchJob {
            prompt: false,
            backoff: Duration::from_millis(1),
            ..BatchJob::new(&self.input, &self.output)
        }
    }

    fn output(&self) -> String {
        std::fs::read_to_string(&self.output).unwrap()
    }
}

fn data_rows(output: &str) -> Vec<&str> {
    output.lines().skip(1).collect()
}

fn answers(text: &str) -> Box<TerminalGate<Cursor<Vec<u8>>, Vec<u8>>> {
    Box::new(TerminalGate::new(
        Cursor::new(text.as_bytes().to_vec()),
        Vec::new(),
    ))
}

#[tokio::test]
async fn test_reports_every_row_in_order() {
    let env = TestEnv::new("alice\nbob\n");
    let mut engine = BatchEngine::new(env.job(), MockClient::success());

    let summary = engine.run().await.unwrap();

    assert_eq!(
        env.output(),
        format!("{}alice,true,false\nbob,true,false\n", HEADER)
    );
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.reported, 2);
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn test_auth_failure_writes_nothing() {
    let env = TestEnv::new("alice\nbob\n");
    let mut engine = BatchEngine::new(env.job(), MockClient::auth_failure());

    let result = engine.run().await;

    match result {
        Err(TwreportError::Remote(RemoteError::Authentication(_))) => {}
        other => panic!("Expected authentication failure, got {:?}", other),
    }
    assert!(!env.output.exists(), "output log must not be created");
    assert!(engine.client().calls().is_empty());
}

#[tokio::test]
async fn test_empty_input_yields_only_header() {
    let env = TestEnv::new("");
    let mut engine = BatchEngine::new(env.job(), MockClient::success());

    let summary = engine.run().await.unwrap();

    assert_eq!(env.output(), HEADER);
    assert_eq!(summary.rows_read, 0);
}

#[tokio::test]
async fn test_rate_limit_backs_off_then_logs_once() {
    let env = TestEnv::new("alice\nbob\n");
    let k = 3;
    let mut script = vec![MockResponse::RateLimited; k];
    script.push(MockResponse::Success);
    let client = MockClient::success().with_script("alice", script);
    let mut engine = BatchEngine::new(env.job(), client);

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.rate_limit_waits, k);
    assert_eq!(engine.client().calls_for("alice"), k + 1);
    assert_eq!(engine.client().calls_for("bob"), 1);
    assert_eq!(
        data_rows(&env.output()),
        vec!["alice,true,false", "bob,true,false"]
    );
}

#[tokio::test]
async fn test_back_off_waits_for_the_interval() {
    let env = TestEnv::new("alice\n");
    let job = BatchJob {
        backoff: Duration::from_millis(30),
        ..env.job()
    };
    let client = MockClient::success().with_script(
        "alice",
        vec![MockResponse::RateLimited, MockResponse::RateLimited],
    );
    let mut engine = BatchEngine::new(job, client);

    let start = std::time::Instant::now();
    engine.run().await.unwrap();

    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_column_beyond_every_record_skips_all() {
    let env = TestEnv::new("1,alice\n2,bob\n");
    let job = BatchJob {
        column: 5,
        ..env.job()
    };
    let mut engine = BatchEngine::new(job, MockClient::success());

    let summary = engine.run().await.unwrap();

    assert_eq!(env.output(), HEADER);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.reported, 0);
    assert!(engine.client().calls().is_empty());
}

#[tokio::test]
async fn test_operator_answers_select_rows() {
    let env = TestEnv::new("alice\nbob\n");
    let job = BatchJob {
        prompt: true,
        ..env.job()
    };
    let mut engine = BatchEngine::new(job, MockClient::success()).with_gate(answers("n\ny\n"));

    let summary = engine.run().await.unwrap();

    assert_eq!(data_rows(&env.output()), vec!["bob,true,false"]);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.reported, 1);
    assert_eq!(engine.client().calls_for("alice"), 0);
}

#[tokio::test]
async fn test_unrecognised_answer_does_not_consume_a_row() {
    let env = TestEnv::new("alice\nbob\n");
    let job = BatchJob {
        prompt: true,
        ..env.job()
    };
    let mut engine =
        BatchEngine::new(job, MockClient::success()).with_gate(answers("sure\ny\nn\n"));

    engine.run().await.unwrap();

    assert_eq!(data_rows(&env.output()), vec!["alice,true,false"]);
}

#[tokio::test]
async fn test_operator_input_closed_aborts() {
    let env = TestEnv::new("alice\nbob\n");
    let job = BatchJob {
        prompt: true,
        ..env.job()
    };
    let mut engine = BatchEngine::new(job, MockClient::success()).with_gate(answers("y\n"));

    let result = engine.run().await;

    assert!(matches!(result, Err(TwreportError::Prompt(_))));
    assert_eq!(data_rows(&env.output()), vec!["alice,true,false"]);
}

#[tokio::test]
async fn test_rows_never_exceed_successes() {
    let env = TestEnv::new("a\nb\nc\nd\ne\n");
    let client = MockClient::success()
        .with_script("b", vec![MockResponse::Failed("suspended".into())])
        .with_script("d", vec![MockResponse::RateLimited, MockResponse::Failed("gone".into())]);
    let mut engine = BatchEngine::new(env.job(), client);

    let summary = engine.run().await.unwrap();

    let rows = data_rows(&env.output()).len();
    assert_eq!(rows, summary.reported);
    assert_eq!(rows, 3);
    assert!(rows <= summary.rows_read);
    assert_eq!(
        summary
            .failed
            .iter()
            .map(|f| f.identifier.as_str())
            .collect::<Vec<_>>(),
        vec!["b", "d"]
    );
    assert!(!env.output().contains("b,true"));
    assert!(!env.output().contains("d,true"));
}

#[tokio::test]
async fn test_dry_run_writes_no_log() {
    let env = TestEnv::new("alice\nbob\n");
    let job = BatchJob {
        dry_run: true,
        ..env.job()
    };
    let mut engine = BatchEngine::new(job, MockClient::success());

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.simulated, 2);
    assert!(engine.client().calls().is_empty());
    assert!(!env.output.exists(), "dry run must not create the output log");
}

#[tokio::test]
async fn test_rerun_appends_to_same_log() {
    let env = TestEnv::new("alice\n");

    BatchEngine::new(env.job(), MockClient::success())
        .run()
        .await
        .unwrap();
    BatchEngine::new(env.job(), MockClient::success())
        .run()
        .await
        .unwrap();

    // No dedup across runs: both runs' rows are kept, header once
    assert_eq!(
        env.output(),
        format!("{}alice,true,false\nalice,true,false\n", HEADER)
    );
}

#[tokio::test]
async fn test_run_with_source_reads_given_stream() {
    let env = TestEnv::new("ignored\n");
    let mut engine = BatchEngine::new(env.job(), MockClient::success());

    let source = RowSource::from_reader(Cursor::new(b"zoe\n".to_vec()));
    engine.run_with_source(source).await.unwrap();

    assert_eq!(data_rows(&env.output()), vec!["zoe,true,false"]);
}
