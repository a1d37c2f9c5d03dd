//! Owns one session subscription for its whole life.
//!
//! Each connection attempt opens the event stream, fetches a snapshot in a
//! separate task, and runs a [`Reconciler`] across the two. Failures are
//! retried with [`ReconnectState`] backoff; a successful sync resets the
//! retry counter. [`ConnectionHandle::shutdown`] cancels whatever is in
//! flight and never schedules another attempt.

use std::sync::Arc;

use tokio::sync::{oneshot, watch};
use tokio::task::{JoinError, JoinHandle};

use crate::backoff::{ReconnectConfig, ReconnectState};
use crate::reconciler::{Reconciler, SessionHandler};
use crate::state::{ConnectionError, ConnectionState, ConnectionStatus, StatusWatch};
use crate::transport::{EventTransport, Subscription, TransportError};

/// Handle to a running [`ConnectionManager`].
///
/// Dropping the handle cancels the subscription, same as
/// [`ConnectionHandle::shutdown`] without waiting.
pub struct ConnectionHandle<H> {
    status: Arc<StatusWatch>,
    /// Sending `true` stops the manager task.
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<H>,
}

impl<H> ConnectionHandle<H> {
    /// Return a new status subscriber.
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Return the current status without blocking.
    pub fn current(&self) -> ConnectionStatus {
        self.status.current()
    }

    /// Whether the manager task has exited, either by cancellation or by
    /// exhausting its retries.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the subscription and wait for the manager to stop. Returns the
    /// handler so the caller can inspect the final session state.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the manager task panicked.
    pub async fn shutdown(self) -> Result<H, JoinError> {
        let _ = self.shutdown_tx.send(true);
        self.task.await
    }

    /// Wait for the manager to stop on its own, which only happens once
    /// retries are exhausted.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] if the manager task panicked.
    pub async fn join(self) -> Result<H, JoinError> {
        let Self {
            task, shutdown_tx, ..
        } = self;
        let result = task.await;
        drop(shutdown_tx);
        result
    }
}

/// How a single connection attempt ended.
enum AttemptEnd {
    Cancelled,
    Failed,
}

/// What to do after a failed attempt.
enum Retry {
    After,
    Cancelled,
    Exhausted,
}

/// Aborts the in-flight snapshot fetch when the attempt ends.
struct SnapshotTask(JoinHandle<()>);

impl Drop for SnapshotTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Resolves once shutdown is requested or the handle is gone.
async fn cancelled(shutdown_rx: &mut watch::Receiver<bool>) {
    let _ = shutdown_rx.wait_for(|stop| *stop).await;
}

/// Drives a session subscription in a background task.
pub struct ConnectionManager<T, H> {
    transport: Arc<T>,
    subscription: Subscription,
    handler: H,
    reconciler: Reconciler,
    retry: ReconnectState,
    status: Arc<StatusWatch>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<T, H> ConnectionManager<T, H>
where
    T: EventTransport,
    H: SessionHandler + Send + 'static,
{
    /// Start the subscription on the current tokio runtime.
    pub fn spawn(
        transport: Arc<T>,
        subscription: Subscription,
        config: ReconnectConfig,
        handler: H,
    ) -> ConnectionHandle<H> {
        let status = Arc::new(StatusWatch::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let manager = Self {
            transport,
            subscription,
            handler,
            reconciler: Reconciler::new(),
            retry: ReconnectState::new(config),
            status: Arc::clone(&status),
            shutdown_rx,
        };
        let task = tokio::spawn(manager.run());

        ConnectionHandle {
            status,
            shutdown_tx,
            task,
        }
    }

    async fn run(mut self) -> H {
        tracing::info!(
            "Subscribing to session {} as {}",
            self.subscription.session_id,
            self.subscription.player_id
        );
        loop {
            if let AttemptEnd::Cancelled = self.connect().await {
                break;
            }
            match self.schedule_reconnect().await {
                Retry::After => {}
                Retry::Cancelled => break,
                Retry::Exhausted => return self.handler,
            }
        }
        tracing::info!("Subscription to session {} cancelled", self.subscription.session_id);
        self.status.transition(ConnectionState::Idle);
        self.handler
    }

    /// One connection attempt, from opening the stream until it ends.
    async fn connect(&mut self) -> AttemptEnd {
        self.reconciler.reset();
        self.status.transition(ConnectionState::Connecting);

        let opened = tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown_rx) => return AttemptEnd::Cancelled,
            opened = self.transport.open_stream(&self.subscription) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Failed to open event stream: {}", e);
                self.status.transition(ConnectionState::Disconnected);
                return AttemptEnd::Failed;
            }
        };

        self.status.transition(ConnectionState::Syncing);
        self.reconciler.begin_sync();

        let (barrier_tx, mut barrier) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let subscription = self.subscription.clone();
        let _fetch = SnapshotTask(tokio::spawn(async move {
            let result = transport.fetch_snapshot(&subscription).await;
            let _ = barrier_tx.send(result);
        }));
        let mut syncing = true;

        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut self.shutdown_rx) => return AttemptEnd::Cancelled,
                result = &mut barrier, if syncing => {
                    syncing = false;
                    let snapshot = result.unwrap_or_else(|_| {
                        Err(TransportError::Rpc("snapshot task ended without a result".to_string()))
                    });
                    self.reconciler.complete_sync(snapshot, &mut self.handler);
                    self.retry.reset();
                    self.status.transition(ConnectionState::Connected);
                }
                item = stream.next() => match item {
                    Some(Ok(env)) => {
                        self.reconciler.ingest(env, &mut self.handler);
                    }
                    Some(Err(e)) => {
                        tracing::warn!("Event stream failed: {}", e);
                        self.status.transition(ConnectionState::Disconnected);
                        return AttemptEnd::Failed;
                    }
                    None => {
                        tracing::info!("Event stream closed by server");
                        self.status.transition(ConnectionState::Disconnected);
                        return AttemptEnd::Failed;
                    }
                },
            }
        }
    }

    /// Wait out the next backoff delay, unless retries are exhausted or
    /// shutdown arrives first.
    async fn schedule_reconnect(&mut self) -> Retry {
        let Some(delay) = self.retry.next_delay() else {
            self.status.fail(ConnectionError::RetriesExhausted {
                attempts: self.retry.attempts(),
            });
            return Retry::Exhausted;
        };
        tracing::info!("Reconnection attempt {} in {:?}", self.retry.attempts(), delay);

        tokio::select! {
            biased;
            _ = cancelled(&mut self.shutdown_rx) => Retry::Cancelled,
            _ = tokio::time::sleep(delay) => Retry::After,
        }
    }
}
