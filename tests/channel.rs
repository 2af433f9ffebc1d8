//! Integration tests for the push channel, run against local WebSocket
//! servers spun up per test.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;

use rvc_monitor_rs::{ChannelConfig, ChannelManager, ConnectionState};

struct WsServer {
    url: String,
    accepts: Arc<AtomicUsize>,
}

/// Opt-in tracing output for debugging a failing test (RUST_LOG=debug).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Accepts WebSocket connections, counts completed handshakes, sends the
/// given frames to each client, then either holds the connection open or
/// drops it immediately.
async fn spawn_ws_server(frames: Vec<String>, drop_after_send: bool) -> WsServer {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let accepts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepts);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let frames = frames.clone();
            let counter = Arc::clone(&counter);
            tokio::spawn(async move {
                let mut ws = match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => return,
                };
                counter.fetch_add(1, Ordering::SeqCst);
                for frame in frames {
                    if ws.send(Message::text(frame)).await.is_err() {
                        return;
                    }
                }
                if !drop_after_send {
                    while let Some(frame) = ws.next().await {
                        if frame.is_err() {
                            break;
                        }
                    }
                }
            });
        }
    });

    WsServer { url, accepts }
}

/// Accepts raw TCP connections and drops them before the WebSocket
/// handshake completes, so every connect attempt fails but is countable.
async fn spawn_refusing_server() -> WsServer {
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let accepts = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&accepts);
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    WsServer { url, accepts }
}

fn config(url: &str, max_attempts: u32, interval_ms: u64) -> ChannelConfig {
    ChannelConfig {
        endpoint_url: url.to_string(),
        max_reconnect_attempts: max_attempts,
        reconnect_interval: Duration::from_millis(interval_ms),
    }
}

fn recording_subscriber(
    log: Arc<Mutex<Vec<(u32, Value)>>>,
    tag: u32,
) -> impl Fn(&Value) + Send + Sync + 'static {
    move |data: &Value| log.lock().unwrap().push((tag, data.clone()))
}

#[tokio::test(flavor = "multi_thread")]
async fn status_update_reaches_both_subscribers_in_order() {
    let server = spawn_ws_server(
        vec![r#"{"type":"status_update","data":{"temp":42}}"#.to_string()],
        false,
    )
    .await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    manager.subscribe(recording_subscriber(Arc::clone(&log), 1)).await;
    manager.subscribe(recording_subscriber(Arc::clone(&log), 2)).await;

    manager.connect().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2, "each subscriber receives the payload exactly once");
    assert_eq!(log[0].0, 1);
    assert_eq!(log[1].0, 2);
    assert!(log.iter().all(|(_, data)| data["temp"] == 42));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_and_foreign_frames_are_dropped() {
    let server = spawn_ws_server(
        vec![
            "this is not json".to_string(),
            r#"{"type":"pong","data":{"temp":1}}"#.to_string(),
            r#"{"type":"status_update","data":{"battery":88}}"#.to_string(),
        ],
        false,
    )
    .await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    manager.subscribe(recording_subscriber(Arc::clone(&log), 1)).await;

    manager.connect().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    // Only the status_update got through, and the channel survived.
    {
        let log = log.lock().unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].1["battery"], 88);
    }
    assert_eq!(manager.state().await, ConnectionState::Connected);
}

#[tokio::test(flavor = "multi_thread")]
async fn unsubscribed_listener_receives_nothing() {
    let server = spawn_ws_server(
        vec![r#"{"type":"status_update","data":{"state":"docked"}}"#.to_string()],
        false,
    )
    .await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let keep = manager.subscribe(recording_subscriber(Arc::clone(&log), 1)).await;
    let gone = manager.subscribe(recording_subscriber(Arc::clone(&log), 2)).await;

    assert!(manager.unsubscribe(gone).await);
    assert!(!manager.unsubscribe(gone).await, "second removal is a no-op");
    assert_eq!(manager.listener_count().await, 1);

    manager.connect().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].0, 1);
    let _ = keep;
}

#[tokio::test(flavor = "multi_thread")]
async fn resubscribing_same_handle_delivers_once() {
    let server = spawn_ws_server(
        vec![r#"{"type":"status_update","data":{"temp":42}}"#.to_string()],
        false,
    )
    .await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let id = manager.subscribe(recording_subscriber(Arc::clone(&log), 1)).await;

    // Same handle again: registration is idempotent.
    let duplicate: rvc_monitor_rs::StatusListener =
        Arc::new(recording_subscriber(Arc::clone(&log), 1));
    assert!(!manager.subscribe_with_id(id, duplicate).await);
    assert_eq!(manager.listener_count().await, 1);

    manager.connect().await.unwrap();
    sleep(Duration::from_millis(200)).await;

    assert_eq!(log.lock().unwrap().len(), 1, "one registration, one delivery");

    // After unsubscribing, the handle can be registered again.
    assert!(manager.unsubscribe(id).await);
    let replacement: rvc_monitor_rs::StatusListener =
        Arc::new(recording_subscriber(Arc::clone(&log), 2));
    assert!(manager.subscribe_with_id(id, replacement).await);
    assert_eq!(manager.listener_count().await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_is_noop_while_connected() {
    let server = spawn_ws_server(vec![], false).await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    manager.connect().await.unwrap();
    manager.connect().await.unwrap();
    sleep(Duration::from_millis(100)).await;

    assert_eq!(server.accepts.load(Ordering::SeqCst), 1);
    assert!(manager.is_connected().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_connects_open_one_socket() {
    let server = spawn_ws_server(vec![], false).await;

    let manager = ChannelManager::new(config(&server.url, 0, 100)).unwrap();
    let mut joins = Vec::new();
    for _ in 0..8 {
        let clone = manager.clone();
        joins.push(tokio::spawn(async move { clone.connect().await }));
    }
    for join in joins {
        join.await.unwrap().unwrap();
    }
    sleep(Duration::from_millis(100)).await;

    assert_eq!(
        server.accepts.load(Ordering::SeqCst),
        1,
        "simultaneous connects share a single socket"
    );
    assert!(manager.is_connected().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn retries_are_bounded_and_evenly_spaced() {
    let server = spawn_refusing_server().await;

    // Two retries at ~100ms and ~200ms after the initial failure, then
    // quiescence.
    let manager = ChannelManager::new(config(&server.url, 2, 100)).unwrap();
    assert!(manager.connect().await.is_err());

    sleep(Duration::from_millis(600)).await;
    assert_eq!(
        server.accepts.load(Ordering::SeqCst),
        3,
        "initial attempt plus exactly two automatic retries"
    );

    sleep(Duration::from_millis(300)).await;
    assert_eq!(server.accepts.load(Ordering::SeqCst), 3, "no further attempts");
    assert_eq!(manager.state().await, ConnectionState::Disconnected);

    // Explicit connect re-arms the budget.
    assert!(manager.connect().await.is_err());
    assert!(server.accepts.load(Ordering::SeqCst) >= 4);
    manager.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn successful_connection_rearms_retry_budget() {
    // Server drops every connection right after the handshake. With a budget
    // of one, reconnection would stop after two handshakes total unless a
    // success resets the counter.
    let server = spawn_ws_server(vec![], true).await;

    let manager = ChannelManager::new(config(&server.url, 1, 100)).unwrap();
    manager.connect().await.unwrap();

    sleep(Duration::from_millis(700)).await;
    assert!(
        server.accepts.load(Ordering::SeqCst) >= 3,
        "each successful connection resets the budget, so reconnects keep coming"
    );
    manager.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn manual_disconnect_suppresses_reconnect() {
    let server = spawn_ws_server(vec![], false).await;

    let manager = ChannelManager::new(config(&server.url, 5, 100)).unwrap();
    manager.connect().await.unwrap();
    assert_eq!(server.accepts.load(Ordering::SeqCst), 1);

    manager.disconnect().await.unwrap();
    assert_eq!(manager.state().await, ConnectionState::Disconnected);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(
        server.accepts.load(Ordering::SeqCst),
        1,
        "no automatic reconnect after an explicit disconnect"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn disconnect_retracts_pending_reconnect() {
    let server = spawn_refusing_server().await;

    let manager = ChannelManager::new(config(&server.url, 5, 200)).unwrap();
    assert!(manager.connect().await.is_err());
    let after_connect = server.accepts.load(Ordering::SeqCst);

    // A retry is now waiting on its timer; disconnect must retract it.
    manager.disconnect().await.unwrap();
    sleep(Duration::from_millis(700)).await;

    assert_eq!(server.accepts.load(Ordering::SeqCst), after_connect);
}

#[tokio::test(flavor = "multi_thread")]
async fn set_endpoint_disconnects_then_connects_to_new_url() {
    let first = spawn_ws_server(vec![], false).await;
    let second = spawn_ws_server(vec![], false).await;

    let manager = ChannelManager::new(config(&first.url, 0, 100)).unwrap();
    manager.connect().await.unwrap();
    assert_eq!(first.accepts.load(Ordering::SeqCst), 1);

    manager.set_endpoint(&second.url).await.unwrap();

    assert!(manager.is_connected().await);
    assert_eq!(manager.endpoint().await, second.url);
    assert_eq!(second.accepts.load(Ordering::SeqCst), 1);
    assert_eq!(first.accepts.load(Ordering::SeqCst), 1, "old endpoint not re-dialed");

    // Same URL again is a no-op.
    manager.set_endpoint(&second.url).await.unwrap();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(second.accepts.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn set_endpoint_while_disconnected_only_updates_config() {
    let server = spawn_ws_server(vec![], false).await;

    let manager = ChannelManager::new(config("ws://127.0.0.1:1", 0, 100)).unwrap();
    manager.set_endpoint(&server.url).await.unwrap();

    assert_eq!(manager.endpoint().await, server.url);
    assert_eq!(manager.state().await, ConnectionState::Disconnected);
    assert_eq!(server.accepts.load(Ordering::SeqCst), 0);

    manager.connect().await.unwrap();
    assert!(manager.is_connected().await);
}

#[tokio::test(flavor = "multi_thread")]
async fn builder_rejects_invalid_configuration() {
    assert!(ChannelManager::new(config("not a url", 5, 100)).is_err());
    assert!(ChannelManager::new(config("ws://127.0.0.1:5005", 5, 0)).is_err());
}
