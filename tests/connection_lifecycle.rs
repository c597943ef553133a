//! Connection manager driven through real and scripted transports.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use job_tracker_api::config;
use job_tracker_api::database::{ConnectionManager, ConnectionState, RetryKind, TcpTransport, TransportError};
use job_tracker_api::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

mod common;

/// Accept connections and hold them open until the task is aborted.
async fn start_store(addr: SocketAddr) -> JoinHandle<()> {
    let listener = TcpListener::bind(addr).await.unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    })
}

async fn rebind(addr: SocketAddr) -> JoinHandle<()> {
    for _ in 0..50 {
        if let Ok(listener) = TcpListener::bind(addr).await {
            return tokio::spawn(async move {
                let mut held = Vec::new();
                while let Ok((socket, _)) = listener.accept().await {
                    held.push(socket);
                }
            });
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("could not rebind {addr}");
}

#[tokio::test]
async fn test_tcp_link_loss_and_recovery() {
    let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = probe.local_addr().unwrap();
    drop(probe);
    let store = start_store(addr).await;

    let mut config = common::config_with_url(Some(&format!("mongodb://{addr}/jobs")));
    config.database.heartbeat_secs = 1;
    config.database.base_delay_secs = 1;
    config.database.connect_timeout_secs = 1;
    config.database.server_selection_timeout_secs = 2;

    let transport = Arc::new(TcpTransport::new());
    let manager = ConnectionManager::new(transport.clone(), config::shared(config));
    let shutdown = Shutdown::new();
    manager.start(shutdown.subscribe());

    manager.connect().await;
    assert!(common::wait_for(Duration::from_secs(2), || manager.status() == ConnectionState::Connected).await);
    assert_eq!(transport.server(), Some(addr));

    store.abort();
    let _ = store.await;
    assert!(
        common::wait_for(Duration::from_secs(5), || manager.status() == ConnectionState::Disconnected).await,
        "heartbeat should notice the lost server"
    );
    assert!(manager.snapshot().pending_retry.is_some());

    let _store = rebind(addr).await;
    assert!(
        common::wait_for(Duration::from_secs(10), || manager.status() == ConnectionState::Connected).await,
        "manager should reconnect once the server is back"
    );
    assert_eq!(manager.snapshot().retry_attempts, 0);

    manager.shutdown().await;
    shutdown.trigger();
}

#[tokio::test]
async fn test_unresolvable_host_enters_backoff() {
    let transport = Arc::new(TcpTransport::new());
    let mut config = common::config_with_url(Some("mongodb://no-such-host.invalid:27017/jobs"));
    config.database.server_selection_timeout_secs = 5;
    let manager = ConnectionManager::new(transport, config::shared(config));

    manager.connect().await;

    let snap = manager.snapshot();
    assert_eq!(snap.retry_attempts, 1);
    assert_eq!(snap.state, ConnectionState::Disconnected);
    let pending = snap.pending_retry.unwrap();
    assert_eq!(pending.kind, RetryKind::Backoff);
    assert_eq!(pending.delay, Duration::from_secs(5));
    manager.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_attempt_events_do_not_start_reconnect_cycle() {
    let transport = common::ScriptedTransport::new(vec![
        Err(TransportError::Other("getaddrinfo ENOTFOUND cluster0.example.net".into())),
        Ok(()),
    ]);
    let manager = ConnectionManager::new(transport.clone(), common::shared_with_url(Some("mongodb://db/jobs")));
    let shutdown = Shutdown::new();
    manager.start(shutdown.subscribe());

    manager.connect().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    // The Connecting/Disconnected pair from the failed attempt must leave the
    // backoff timer and its attempt count alone.
    let snap = manager.snapshot();
    assert_eq!(snap.state, ConnectionState::Disconnected);
    assert_eq!(snap.retry_attempts, 1);
    assert_eq!(snap.retries_scheduled, 1);
    assert_eq!(snap.pending_retry.unwrap().kind, RetryKind::Backoff);

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(transport.attempts(), 2);
    assert_eq!(manager.status(), ConnectionState::Connected);
    shutdown.trigger();
}

#[tokio::test(start_paused = true)]
async fn test_config_reload_supplies_missing_url() {
    let transport = common::ScriptedTransport::new(vec![Ok(())]);
    let shared = common::shared_with_url(None);
    let manager = ConnectionManager::new(transport.clone(), shared.clone());
    let shutdown = Shutdown::new();
    manager.start(shutdown.subscribe());

    manager.connect().await;
    assert_eq!(transport.attempts(), 0);
    assert_eq!(manager.snapshot().retry_attempts, 0);

    shared.store(Arc::new(common::config_with_url(Some("mongodb://db/jobs"))));
    manager.connect().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(transport.attempts(), 1);
    assert_eq!(manager.status(), ConnectionState::Connected);
    shutdown.trigger();
}
