//! The seam between the connection manager and the game server.
//!
//! A transport offers two calls per session: a server-streaming event
//! subscription and a one-shot snapshot fetch. The manager never sees the
//! wire; implementations decode into [`EventEnvelope`] and [`Snapshot`].

use async_trait::async_trait;
use skirmish_events::{EventEnvelope, Snapshot};
use tokio::sync::mpsc;

/// Identifies the session stream a client subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub session_id: String,
    pub player_id: String,
}

impl Subscription {
    pub fn new(session_id: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            player_id: player_id.into(),
        }
    }
}

/// Errors produced by a transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("server unavailable")]
    Unavailable,
    /// The server answered with an error, or a payload could not be decoded.
    #[error("rpc failed: {0}")]
    Rpc(String),
}

/// An open event stream. Dropping it releases the subscription.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::Receiver<Result<EventEnvelope, TransportError>>,
}

impl EventStream {
    pub fn new(rx: mpsc::Receiver<Result<EventEnvelope, TransportError>>) -> Self {
        Self { rx }
    }

    /// Create a bounded stream and the sender that feeds it.
    pub fn channel(
        capacity: usize,
    ) -> (mpsc::Sender<Result<EventEnvelope, TransportError>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }

    /// Next item from the server, or `None` once the stream has ended.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<Result<EventEnvelope, TransportError>> {
        self.rx.recv().await
    }
}

/// Server access used by [`crate::ConnectionManager`].
#[async_trait]
pub trait EventTransport: Send + Sync + 'static {
    /// Open the event subscription for `subscription`.
    async fn open_stream(&self, subscription: &Subscription) -> Result<EventStream, TransportError>;

    /// Fetch the authoritative session state, stamped with the id of the
    /// last event it reflects.
    async fn fetch_snapshot(&self, subscription: &Subscription) -> Result<Snapshot, TransportError>;
}
