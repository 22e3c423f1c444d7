//! Integration tests for headless mode.

use std::sync::Arc;
use std::time::Duration;

use devpanel::app::Panel;
use devpanel::cli::{Cli, OutputFormat};
use devpanel::device::{Fetcher, MockReply, MockTransport};
use devpanel::headless::{run_headless, HeadlessConfig, HeadlessOutput, HeadlessRunner};
use devpanel::persistence::MemoryStore;
use clap::Parser;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn panel(mock: &MockTransport) -> Panel {
    Panel::new(
        Fetcher::new(Arc::new(mock.clone()), Duration::from_millis(200)),
        Arc::new(MemoryStore::new()),
    )
}

#[tokio::test]
async fn test_script_runs_against_mock_device() {
    let mock = MockTransport::device_like();
    let mut runner = HeadlessRunner::new(
        HeadlessConfig {
            output_format: OutputFormat::Json,
            fail_fast: false,
            output_file: None,
        },
        panel(&mock),
    );
    runner.load_script_text(
        "# blink and say hello\nconnect 192.168.1.50\nled toggle\noled text \"hello world\"\n",
    );

    let result = runner.run().await;
    assert_eq!(result.commands_executed, 3);
    assert_eq!(result.commands_failed, 0);

    let json: serde_json::Value =
        serde_json::from_str(&HeadlessOutput::new(OutputFormat::Json).format(&result)).unwrap();
    assert_eq!(json["state"], "connected");
    assert_eq!(json["endpoint"], "http://192.168.1.50:80");

    let urls: Vec<String> = mock.calls().into_iter().map(|c| c.url).collect();
    assert_eq!(
        urls,
        vec![
            "http://192.168.1.50:80/",
            "http://192.168.1.50:80/api/led?action=toggle",
            "http://192.168.1.50:80/api/oled?text=hello+world",
        ]
    );
}

#[tokio::test]
async fn test_run_headless_writes_output_file_and_exit_code() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mock = MockTransport::new().with_route("/api/joke", MockReply::status(500, "oops"));

    let cli = Cli::parse_from([
        "devpanel",
        "--headless",
        "--exec",
        "connect dev; joke; status",
        "--output-file",
        out.to_str().unwrap(),
    ]);

    let code = run_headless(&cli, panel(&mock)).await.unwrap();
    assert_eq!(code, 1);

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("OK    Connected! Response time:"));
    assert!(text.contains("ERROR Request failed: HTTP 500"));
    assert!(text.contains("Commands: 3 executed"));
    assert!(text.contains("State: Disconnected"));
}

#[tokio::test]
async fn test_run_headless_rejects_missing_commands() {
    let cli = Cli::parse_from(["devpanel", "--headless"]);
    let err = run_headless(&cli, panel(&MockTransport::new()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("--exec or --script"));
}
