//! Integration tests for the state database.

use std::sync::Arc;
use std::time::Duration;

use devpanel::app::Panel;
use devpanel::device::{Fetcher, MockTransport, Scheme};
use devpanel::persistence::{KeyValueStore, StateDb, HOST_KEY, PORT_KEY, USE_HTTPS_KEY};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn fetcher() -> Fetcher {
    Fetcher::new(Arc::new(MockTransport::new()), Duration::from_millis(200))
}

#[tokio::test]
async fn test_endpoint_survives_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.db");

    {
        let db = Arc::new(StateDb::open(&path).await.unwrap());
        let mut panel = Panel::new(fetcher(), db.clone());
        panel.run_line("connect 192.168.1.50 8080 --https").await;
        db.close().await;
    }

    let db = Arc::new(StateDb::open(&path).await.unwrap());
    assert_eq!(db.get(HOST_KEY).await.unwrap().as_deref(), Some("192.168.1.50"));
    assert_eq!(db.get(PORT_KEY).await.unwrap().as_deref(), Some("8080"));
    assert_eq!(db.get(USE_HTTPS_KEY).await.unwrap().as_deref(), Some("true"));

    let mut panel = Panel::new(fetcher(), db.clone());
    panel.restore().await;
    let endpoint = panel.connection().endpoint();
    assert_eq!(endpoint.host, "192.168.1.50");
    assert_eq!(endpoint.port, 8080);
    assert_eq!(endpoint.scheme, Scheme::Https);
    db.close().await;
}

#[tokio::test]
async fn test_failed_probe_does_not_persist() {
    let dir = tempdir().unwrap();
    let db = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());

    let mock = MockTransport::new().with_route("/", devpanel::device::MockReply::status(500, ""));
    let mut panel = Panel::new(
        Fetcher::new(Arc::new(mock), Duration::from_millis(200)),
        db.clone(),
    );
    panel.run_line("connect dev").await;

    assert_eq!(db.get(HOST_KEY).await.unwrap(), None);
    db.close().await;
}

#[test]
fn test_garbage_values_are_ignored_on_restore() {
    tokio_test::block_on(async {
        let dir = tempdir().unwrap();
        let db = Arc::new(StateDb::open(&dir.path().join("state.db")).await.unwrap());
        db.set(HOST_KEY, "dev.local").await.unwrap();
        db.set(PORT_KEY, "not-a-port").await.unwrap();
        db.set(USE_HTTPS_KEY, "maybe").await.unwrap();

        let mut panel = Panel::new(fetcher(), db.clone());
        panel.restore().await;

        let endpoint = panel.connection().endpoint();
        assert_eq!(endpoint.host, "dev.local");
        assert_eq!(endpoint.port, 80);
        assert_eq!(endpoint.scheme, Scheme::Http);
        assert!(panel.log().is_empty());
        db.close().await;
    });
}
