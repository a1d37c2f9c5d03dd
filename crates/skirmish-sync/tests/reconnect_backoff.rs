use std::sync::Arc;
use std::time::Duration;

use skirmish_events::{EventHandler, HandlerError, Snapshot};
use skirmish_sync::{
    ConnectionError, ConnectionManager, ConnectionState, MemoryTransport, ReconnectConfig,
    SessionHandler, Subscription, TransportError,
};

struct Quiet;

impl EventHandler for Quiet {}

impl SessionHandler for Quiet {
    fn on_state_sync(&mut self, _snapshot: &Snapshot) -> Result<(), HandlerError> {
        Ok(())
    }
}

fn gaps(transport: &MemoryTransport) -> Vec<Duration> {
    transport
        .open_times()
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_ten_retries() {
    let transport = Arc::new(MemoryTransport::new());
    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new("s-1", "p-1"),
        ReconnectConfig::default(),
        Quiet,
    );
    let status = handle.status();
    handle.join().await.unwrap();

    let last = status.borrow().clone();
    assert_eq!(last.state, ConnectionState::Error);
    assert_eq!(last.error, Some(ConnectionError::RetriesExhausted { attempts: 10 }));

    // Initial attempt plus ten retries.
    assert_eq!(transport.open_count(), 11);
    let expected: Vec<Duration> = [1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000, 30000, 30000]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(gaps(&transport), expected);
}

#[tokio::test(start_paused = true)]
async fn test_custom_schedule_is_honoured() {
    let transport = Arc::new(MemoryTransport::new());
    transport.push_refusal(TransportError::Rpc("session not found".into()));
    let config = ReconnectConfig {
        initial_delay: Duration::from_millis(250),
        backoff_multiplier: 3.0,
        max_delay: Duration::from_secs(2),
        max_attempts: 4,
        jitter: 0.0,
    };
    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new("s-1", "p-1"),
        config,
        Quiet,
    );
    let status = handle.status();
    handle.join().await.unwrap();

    assert_eq!(status.borrow().error, Some(ConnectionError::RetriesExhausted { attempts: 4 }));
    let expected: Vec<Duration> = [250, 750, 2000, 2000]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(gaps(&transport), expected);
}

#[tokio::test(start_paused = true)]
async fn test_zero_retries_fails_after_first_attempt() {
    let transport = Arc::new(MemoryTransport::new());
    let config = ReconnectConfig {
        max_attempts: 0,
        ..ReconnectConfig::default()
    };
    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new("s-1", "p-1"),
        config,
        Quiet,
    );
    let status = handle.status();
    handle.join().await.unwrap();

    assert_eq!(transport.open_count(), 1);
    assert_eq!(status.borrow().state, ConnectionState::Error);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_backoff_stops_retrying() {
    let transport = Arc::new(MemoryTransport::new());
    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new("s-1", "p-1"),
        ReconnectConfig::default(),
        Quiet,
    );
    let mut status = handle.status();
    status
        .wait_for(|s| s.state == ConnectionState::Disconnected)
        .await
        .unwrap();
    assert!(handle.current().state.is_reconnecting());

    handle.shutdown().await.unwrap();
    assert_eq!(status.borrow().state, ConnectionState::Idle);
    assert_eq!(status.borrow().error, None);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_cancels() {
    let transport = Arc::new(MemoryTransport::new());
    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new("s-1", "p-1"),
        ReconnectConfig::default(),
        Quiet,
    );
    let mut status = handle.status();
    status
        .wait_for(|s| s.state == ConnectionState::Disconnected)
        .await
        .unwrap();
    drop(handle);

    status.wait_for(|s| s.state == ConnectionState::Idle).await.unwrap();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(transport.open_count(), 1);
}
