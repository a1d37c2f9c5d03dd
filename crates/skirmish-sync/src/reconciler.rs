//! Joins a live event stream with a point-in-time snapshot.
//!
//! Events that arrive while the snapshot is in flight are buffered. When the
//! snapshot lands it is applied first, then buffered events newer than the
//! snapshot's `lastEventId` are replayed in arrival order. Event ids are
//! ULIDs, so plain string comparison orders them by creation time.

use skirmish_events::{
    DispatchOutcome, DispatchSummary, EventEnvelope, EventHandler, HandlerError, Snapshot,
    dispatch, dispatch_all,
};

use crate::transport::TransportError;

/// An [`EventHandler`] that can also take a full state snapshot.
pub trait SessionHandler: EventHandler {
    /// Replace local session state with `snapshot`. Called once per
    /// successful sync, before any buffered event is replayed.
    fn on_state_sync(&mut self, snapshot: &Snapshot) -> Result<(), HandlerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    /// No sync window has been opened yet on this attempt.
    #[default]
    Idle,
    Syncing,
    Live,
}

/// What [`Reconciler::ingest`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingest {
    /// Held until the sync completes.
    Buffered,
    /// Already covered by the applied snapshot.
    Skipped,
    Dispatched(DispatchOutcome),
}

/// Result of closing a sync window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// `lastEventId` of the applied snapshot. `None` when degraded.
    pub cutoff: Option<String>,
    /// The snapshot fetch failed and buffered events were replayed unfiltered.
    pub degraded: bool,
    /// Buffered events dropped as stale.
    pub skipped: usize,
    pub replayed: DispatchSummary,
}

/// Per-attempt sync state: the event buffer and the snapshot cutoff.
#[derive(Debug, Default)]
pub struct Reconciler {
    phase: Phase,
    buffer: Vec<EventEnvelope>,
    last_event_id: Option<String>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state from a previous attempt.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.buffer.clear();
        self.last_event_id = None;
    }

    /// Open the sync window. Clears any leftover buffer and cutoff first.
    pub fn begin_sync(&mut self) {
        self.reset();
        self.phase = Phase::Syncing;
        tracing::debug!("Sync window opened");
    }

    pub fn is_syncing(&self) -> bool {
        self.phase == Phase::Syncing
    }

    /// Cutoff from the most recent successful sync on this attempt.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Accept one event from the stream.
    ///
    /// While syncing the event is buffered. Otherwise it is dispatched
    /// immediately unless the applied snapshot already covers it.
    pub fn ingest<H: EventHandler + ?Sized>(
        &mut self,
        env: EventEnvelope,
        handler: &mut H,
    ) -> Ingest {
        if self.phase == Phase::Syncing {
            self.buffer.push(env);
            tracing::trace!("Buffered event during sync ({} held)", self.buffer.len());
            return Ingest::Buffered;
        }
        if let Some(cutoff) = &self.last_event_id
            && env.event_id.as_str() <= cutoff.as_str()
        {
            tracing::debug!("Dropping event {} at or before snapshot {}", env.event_id, cutoff);
            return Ingest::Skipped;
        }
        Ingest::Dispatched(dispatch(&env, handler))
    }

    /// Close the sync window with the outcome of the snapshot fetch.
    ///
    /// On success the snapshot is applied via
    /// [`SessionHandler::on_state_sync`] and only buffered events strictly
    /// newer than its `lastEventId` are replayed. On failure every buffered
    /// event is replayed, since there is no cutoff to filter against.
    /// Either way the buffer is emptied and later events dispatch live.
    pub fn complete_sync<H: SessionHandler + ?Sized>(
        &mut self,
        snapshot: Result<Snapshot, TransportError>,
        handler: &mut H,
    ) -> SyncReport {
        if self.phase != Phase::Syncing {
            tracing::warn!("Sync completion outside a sync window ignored");
            return SyncReport::default();
        }
        let buffered = std::mem::take(&mut self.buffer);
        self.phase = Phase::Live;

        match snapshot {
            Ok(snapshot) => {
                let cutoff = snapshot.last_event_id.clone();
                if let Err(e) = handler.on_state_sync(&snapshot) {
                    tracing::warn!("State sync handler failed: {}", e);
                }
                let (fresh, stale): (Vec<_>, Vec<_>) = buffered
                    .into_iter()
                    .partition(|env| env.event_id.as_str() > cutoff.as_str());
                let replayed = dispatch_all(&fresh, handler);
                tracing::info!(
                    "Synced at {}: replayed {} buffered events, dropped {} stale",
                    cutoff,
                    fresh.len(),
                    stale.len()
                );
                self.last_event_id = Some(cutoff.clone());
                SyncReport {
                    cutoff: Some(cutoff),
                    degraded: false,
                    skipped: stale.len(),
                    replayed,
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Snapshot fetch failed ({}); replaying {} buffered events unfiltered",
                    e,
                    buffered.len()
                );
                SyncReport {
                    cutoff: None,
                    degraded: true,
                    skipped: 0,
                    replayed: dispatch_all(&buffered, handler),
                }
            }
        }
    }
}
