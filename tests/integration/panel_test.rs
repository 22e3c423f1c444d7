//! End-to-end panel tests against the mock device.

use std::sync::Arc;
use std::time::{Duration, Instant};

use devpanel::activity::{ActivityLog, Severity, MAX_LOG_ENTRIES};
use devpanel::app::{Flow, Panel};
use devpanel::connection::{ConnectionManager, ConnectionState};
use devpanel::device::{Fetcher, HttpMethod, MockReply, MockTransport};
use devpanel::dispatch::RequestDispatcher;
use devpanel::error::PanelError;
use devpanel::persistence::{MemoryStore, HOST_KEY, PORT_KEY, USE_HTTPS_KEY};
use pretty_assertions::assert_eq;

const TIMEOUT: Duration = Duration::from_millis(150);

fn fetcher(mock: &MockTransport) -> Fetcher {
    Fetcher::new(Arc::new(mock.clone()), TIMEOUT)
}

fn manager(mock: &MockTransport, store: &MemoryStore) -> ConnectionManager {
    ConnectionManager::new(fetcher(mock), Arc::new(store.clone()))
}

#[tokio::test]
async fn test_successful_probe_persists_exactly_the_endpoint() {
    let mock = MockTransport::new();
    let store = MemoryStore::new();
    let mut connection = manager(&mock, &store);

    connection.configure("192.168.1.50", "80", false).unwrap();
    connection.probe().await.unwrap();

    assert_eq!(connection.state(), ConnectionState::Connected);
    assert_eq!(mock.calls()[0].url, "http://192.168.1.50:80/");

    let saved = store.snapshot();
    assert_eq!(saved.len(), 3);
    assert_eq!(saved[HOST_KEY], "192.168.1.50");
    assert_eq!(saved[PORT_KEY], "80");
    assert_eq!(saved[USE_HTTPS_KEY], "false");
}

#[tokio::test]
async fn test_non_2xx_probe_keeps_status() {
    let mock = MockTransport::new().with_route("/", MockReply::status(503, "busy"));
    let store = MemoryStore::new();
    let mut connection = manager(&mock, &store);

    connection.configure("dev", "", false).unwrap();
    let err = connection.probe().await.unwrap_err();

    assert_eq!(err, PanelError::Protocol { status: 503 });
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_hanging_device_times_out_and_cancels() {
    let mock = MockTransport::new().with_default(MockReply::Hang);
    let mut connection = manager(&mock, &MemoryStore::new());
    connection.configure("dev", "8080", false).unwrap();

    let start = Instant::now();
    let err = connection.probe().await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(err.is_timeout());
    assert!(err.is_transport());
    assert!(elapsed >= TIMEOUT);
    assert!(elapsed < TIMEOUT + Duration::from_millis(500), "took {elapsed:?}");

    tokio::task::yield_now().await;
    assert!(mock.all_tokens_cancelled());
    assert_eq!(mock.pending_count(), 0);
}

#[tokio::test]
async fn test_send_while_disconnected_makes_no_call() {
    let mock = MockTransport::new();
    let mut connection = manager(&mock, &MemoryStore::new());
    let dispatcher = RequestDispatcher::new(fetcher(&mock));
    let mut log = ActivityLog::new();

    let outcome = dispatcher
        .send(&mut connection, &mut log, "/api/led?action=on", HttpMethod::Get, None)
        .await;

    assert!(outcome.is_none());
    assert_eq!(log.len(), 1);
    assert_eq!(log.last().unwrap().severity, Severity::Warning);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_send_gpio_while_connected() {
    let mock = MockTransport::new();
    let mut connection = manager(&mock, &MemoryStore::new());
    connection.configure("192.168.1.50", "80", false).unwrap();
    connection.probe().await.unwrap();

    let dispatcher = RequestDispatcher::new(fetcher(&mock));
    let mut log = ActivityLog::new();
    let outcome = dispatcher
        .send(&mut connection, &mut log, "/api/gpio?pin=5&level=1", HttpMethod::Get, None)
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.data(), Some("OK"));
    assert_eq!(log.last().unwrap().severity, Severity::Success);
    assert_eq!(
        mock.calls().last().unwrap().url,
        "http://192.168.1.50:80/api/gpio?pin=5&level=1"
    );
}

#[test]
fn test_log_keeps_the_newest_hundred() {
    let mut log = ActivityLog::new();
    for i in 0..=MAX_LOG_ENTRIES {
        log.info(format!("entry {i}"));
    }

    assert_eq!(log.len(), MAX_LOG_ENTRIES);
    let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
    assert_eq!(messages.first(), Some(&"entry 1"));
    assert_eq!(messages.last(), Some(&"entry 100"));
}

#[tokio::test]
async fn test_saved_endpoint_is_restored_on_next_start() {
    let mock = MockTransport::device_like();
    let store = MemoryStore::new();

    let mut first = Panel::new(fetcher(&mock), Arc::new(store.clone()));
    assert_eq!(
        first.run_line("connect 10.0.0.7 8443 --https").await,
        Flow::Continue { ok: true }
    );

    let mut second = Panel::new(fetcher(&mock), Arc::new(store.clone()));
    second.restore().await;
    assert_eq!(second.connection().endpoint().base_url(), "https://10.0.0.7:8443");
    assert_eq!(second.state(), ConnectionState::Disconnected);

    assert_eq!(second.run_line("reconnect").await, Flow::Continue { ok: true });
    assert_eq!(second.run_line("led on").await, Flow::Continue { ok: true });
    assert!(second
        .log()
        .last()
        .unwrap()
        .message
        .contains("LED ON"));
}

#[tokio::test]
async fn test_failed_request_drops_connection() {
    let mock = MockTransport::new();
    let mut panel = Panel::new(fetcher(&mock), Arc::new(MemoryStore::new()));
    panel.run_line("connect dev").await;
    assert!(panel.connection().is_connected());

    mock.set_route("/api/joke", MockReply::Fail("connection reset".into()));
    assert_eq!(panel.run_line("joke").await, Flow::Continue { ok: false });
    assert_eq!(panel.state(), ConnectionState::Disconnected);
    assert_eq!(panel.log().last().unwrap().severity, Severity::Error);

    // Next action is refused without touching the network.
    let calls = mock.call_count();
    panel.run_line("led off").await;
    assert_eq!(mock.call_count(), calls);
}

#[tokio::test]
async fn test_custom_post_carries_json_body() {
    let mock = MockTransport::new();
    let mut panel = Panel::new(fetcher(&mock), Arc::new(MemoryStore::new()));
    panel.run_line("connect dev").await;

    let flow = panel
        .run_line(r#"send POST /api/config {"brightness": 40}"#)
        .await;
    assert_eq!(flow, Flow::Continue { ok: true });

    let call = mock.calls().pop().unwrap();
    assert_eq!(call.method, HttpMethod::Post);
    assert_eq!(call.url, "http://dev:80/api/config");
    assert_eq!(call.body, Some(serde_json::json!({"brightness": 40})));
}
