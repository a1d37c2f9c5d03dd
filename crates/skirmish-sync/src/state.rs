//! Connection lifecycle states and the observable status channel.
//!
//! State changes are broadcast via a [`watch`] channel so UI layers can react
//! to reconnects without polling. Only the edges listed in
//! [`ConnectionState::can_transition_to`] are ever taken.

use tokio::sync::watch;

/// Lifecycle state of one session subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No subscription is running. Initial state, and the state after a
    /// cancellation.
    #[default]
    Idle,
    /// Opening the event stream.
    Connecting,
    /// Stream is open; the snapshot fetch is in flight and incoming events
    /// are buffered.
    Syncing,
    /// Snapshot applied; events are dispatched as they arrive.
    Connected,
    /// The last attempt failed or the stream ended; a retry is scheduled.
    Disconnected,
    /// Reconnection attempts are exhausted. Terminal.
    Error,
}

impl ConnectionState {
    /// Whether the lifecycle may move from `self` to `next`.
    ///
    /// Every non-terminal state may fall back to [`ConnectionState::Idle`]
    /// on cancellation.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::{Connected, Connecting, Disconnected, Error, Idle, Syncing};

        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Syncing | Disconnected | Idle)
                | (Syncing, Connected | Disconnected | Idle)
                | (Connected, Disconnected | Idle)
                | (Disconnected, Connecting | Error | Idle)
        )
    }

    /// True while a UI should show a transient "reconnecting" indicator:
    /// a retry is pending, or the snapshot for a fresh stream is still
    /// loading.
    #[must_use]
    pub fn is_reconnecting(self) -> bool {
        matches!(self, Self::Disconnected | Self::Syncing)
    }

    /// True once no further transitions can happen.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error)
    }
}

/// Errors surfaced through [`ConnectionStatus::error`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Every scheduled reconnection attempt failed.
    #[error("gave up after {attempts} reconnection attempts")]
    RetriesExhausted {
        /// Number of retries made after the initial attempt.
        attempts: u32,
    },
}

/// Snapshot of the lifecycle published to observers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Set only in [`ConnectionState::Error`].
    pub error: Option<ConnectionError>,
}

/// Observable connection status backed by a [`watch`] channel.
///
/// Multiple subscribers can observe transitions without polling. Receivers
/// only see the latest value, so bursts of transitions may be coalesced.
pub struct StatusWatch {
    tx: watch::Sender<ConnectionStatus>,
    rx: watch::Receiver<ConnectionStatus>,
}

impl Default for StatusWatch {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusWatch {
    /// Create a new watch initialized to [`ConnectionState::Idle`].
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(ConnectionStatus::default());
        Self { tx, rx }
    }

    /// Return a new subscriber receiver.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.rx.clone()
    }

    /// Return the current status without blocking.
    pub fn current(&self) -> ConnectionStatus {
        self.rx.borrow().clone()
    }

    /// Move to `next`, notifying all subscribers.
    ///
    /// Re-entering the current state is a no-op. An edge outside the
    /// transition table is logged and ignored.
    ///
    /// # Panics
    ///
    /// Debug builds panic on an illegal edge.
    pub fn transition(&self, next: ConnectionState) {
        let current = self.rx.borrow().state;
        if current == next {
            return;
        }
        let legal = current.can_transition_to(next);
        debug_assert!(legal, "illegal connection transition {current:?} -> {next:?}");
        if !legal {
            tracing::warn!("Ignoring illegal connection transition {:?} -> {:?}", current, next);
            return;
        }
        tracing::debug!("Connection state {:?} -> {:?}", current, next);
        let _ = self.tx.send(ConnectionStatus {
            state: next,
            error: None,
        });
    }

    /// Enter the terminal [`ConnectionState::Error`] state carrying `error`.
    pub fn fail(&self, error: ConnectionError) {
        let current = self.rx.borrow().state;
        let legal = current.can_transition_to(ConnectionState::Error);
        debug_assert!(legal, "cannot fail from {current:?}");
        if !legal {
            tracing::warn!("Ignoring failure in state {:?}: {}", current, error);
            return;
        }
        tracing::error!("Connection failed: {}", error);
        let _ = self.tx.send(ConnectionStatus {
            state: ConnectionState::Error,
            error: Some(error),
        });
    }
}
