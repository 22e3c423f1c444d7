//! HTTP transport tests against a throwaway server on localhost.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use devpanel::activity::Severity;
use devpanel::app::{Flow, Panel};
use devpanel::connection::ConnectionState;
use devpanel::device::{
    fetch_with_timeout, DeviceRequest, Fetcher, HttpMethod, HttpTransport,
};
use devpanel::error::PanelError;
use devpanel::persistence::MemoryStore;
use pretty_assertions::assert_eq;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// How the test server treats each connection.
#[derive(Clone, Copy)]
enum Behavior {
    Respond(u16, &'static str),
    Hang,
}

async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

async fn serve(behavior: Behavior) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(async move {
                let head = read_request_head(&mut stream).await;
                match behavior {
                    Behavior::Respond(status, body) => {
                        let echoed = if body == "ECHO_PATH" {
                            head.split_whitespace().nth(1).unwrap_or("").to_string()
                        } else {
                            body.to_string()
                        };
                        let response = format!(
                            "HTTP/1.1 {status} Test\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{echoed}",
                            echoed.len()
                        );
                        let _ = stream.write_all(response.as_bytes()).await;
                        let _ = stream.shutdown().await;
                    }
                    Behavior::Hang => {
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                }
            });
        }
    });

    addr
}

fn panel(timeout: Duration) -> Panel {
    let transport = Arc::new(HttpTransport::new().unwrap());
    Panel::new(Fetcher::new(transport, timeout), Arc::new(MemoryStore::new()))
}

#[tokio::test]
async fn test_connect_and_request_over_http() {
    let addr = serve(Behavior::Respond(200, "ECHO_PATH")).await;
    let mut panel = panel(Duration::from_secs(2));

    let flow = panel
        .run_line(&format!("connect 127.0.0.1 {}", addr.port()))
        .await;
    assert_eq!(flow, Flow::Continue { ok: true });
    assert_eq!(panel.state(), ConnectionState::Connected);

    assert_eq!(panel.run_line("oled text hi there").await, Flow::Continue { ok: true });
    let last = panel.log().last().unwrap();
    assert_eq!(last.severity, Severity::Success);
    assert!(last.message.ends_with("/api/oled?text=hi+there"), "{}", last.message);
}

#[tokio::test]
async fn test_404_is_protocol_error() {
    let addr = serve(Behavior::Respond(404, "not found")).await;
    let transport = HttpTransport::new().unwrap();

    let err = fetch_with_timeout(
        &transport,
        DeviceRequest::new(HttpMethod::Get, format!("http://{addr}/missing"), None),
        Duration::from_secs(2),
    )
    .await
    .unwrap_err();

    assert_eq!(err, PanelError::Protocol { status: 404 });
}

#[tokio::test]
async fn test_hanging_server_times_out() {
    let addr = serve(Behavior::Hang).await;
    let timeout = Duration::from_millis(200);
    let mut panel = panel(timeout);

    let start = Instant::now();
    let flow = panel
        .run_line(&format!("connect 127.0.0.1 {}", addr.port()))
        .await;
    let elapsed = start.elapsed();

    assert_eq!(flow, Flow::Continue { ok: false });
    assert!(elapsed < timeout + Duration::from_millis(500), "took {elapsed:?}");
    assert_eq!(panel.state(), ConnectionState::Disconnected);
    assert_eq!(
        panel.log().last().unwrap().message,
        "Connection failed: Request timed out after 200ms"
    );
}

#[tokio::test]
async fn test_refused_connection_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = HttpTransport::new().unwrap();
    let err = fetch_with_timeout(
        &transport,
        DeviceRequest::get(format!("http://{addr}/")),
        Duration::from_secs(2),
    )
    .await
    .unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_timeout());
}
