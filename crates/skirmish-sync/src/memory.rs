//! In-process [`EventTransport`] driven by a script of connection attempts.
//!
//! Each call to [`MemoryTransport::open_stream`] consumes the next scripted
//! attempt. Accepted attempts hand the caller an [`AttemptControl`] for
//! pushing events and resolving the snapshot at a chosen moment. Once the
//! script runs out every open is refused with
//! [`TransportError::Unavailable`].

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use skirmish_events::{EventEnvelope, Snapshot};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::transport::{EventStream, EventTransport, Subscription, TransportError};

const STREAM_CAPACITY: usize = 64;

type SnapshotReply = oneshot::Receiver<Result<Snapshot, TransportError>>;

enum Scripted {
    Refuse(TransportError),
    Accept {
        stream: EventStream,
        snapshot: SnapshotReply,
    },
}

/// Server side of one accepted attempt.
///
/// Dropping `events` ends the stream. Dropping `snapshot` without sending
/// fails the snapshot fetch.
pub struct AttemptControl {
    pub events: mpsc::Sender<Result<EventEnvelope, TransportError>>,
    pub snapshot: oneshot::Sender<Result<Snapshot, TransportError>>,
}

impl AttemptControl {
    /// Push one event. Returns false if the client has dropped the stream.
    pub async fn send(&self, envelope: EventEnvelope) -> bool {
        self.events.send(Ok(envelope)).await.is_ok()
    }
}

#[derive(Default)]
struct Script {
    attempts: VecDeque<Scripted>,
    pending_snapshot: Option<SnapshotReply>,
    opens: Vec<(Instant, Subscription)>,
}

/// Scripted transport for tests and demos.
#[derive(Default)]
pub struct MemoryTransport {
    script: Mutex<Script>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an attempt that opens successfully.
    pub fn push_attempt(&self) -> AttemptControl {
        let (events, stream) = EventStream::channel(STREAM_CAPACITY);
        let (snapshot_tx, snapshot_rx) = oneshot::channel();
        self.script().attempts.push_back(Scripted::Accept {
            stream,
            snapshot: snapshot_rx,
        });
        AttemptControl {
            events,
            snapshot: snapshot_tx,
        }
    }

    /// Queue an attempt whose open fails with `error`.
    pub fn push_refusal(&self, error: TransportError) {
        self.script().attempts.push_back(Scripted::Refuse(error));
    }

    /// Number of `open_stream` calls so far.
    pub fn open_count(&self) -> usize {
        self.script().opens.len()
    }

    /// When each `open_stream` call happened, on the tokio clock.
    pub fn open_times(&self) -> Vec<Instant> {
        self.script().opens.iter().map(|(at, _)| *at).collect()
    }

    /// Subscriptions passed to each `open_stream` call.
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.script().opens.iter().map(|(_, sub)| sub.clone()).collect()
    }
}

#[async_trait]
impl EventTransport for MemoryTransport {
    async fn open_stream(
        &self,
        subscription: &Subscription,
    ) -> Result<EventStream, TransportError> {
        let mut script = self.script();
        script.opens.push((Instant::now(), subscription.clone()));
        match script.attempts.pop_front() {
            Some(Scripted::Accept { stream, snapshot }) => {
                script.pending_snapshot = Some(snapshot);
                Ok(stream)
            }
            Some(Scripted::Refuse(error)) => Err(error),
            None => Err(TransportError::Unavailable),
        }
    }

    async fn fetch_snapshot(
        &self,
        _subscription: &Subscription,
    ) -> Result<Snapshot, TransportError> {
        let pending = self.script().pending_snapshot.take();
        let Some(reply) = pending else {
            return Err(TransportError::Unavailable);
        };
        reply
            .await
            .unwrap_or_else(|_| Err(TransportError::Rpc("snapshot request dropped".to_string())))
    }
}
