//! Client-side session synchronisation: joins a live event stream with a
//! one-shot state snapshot, buffers and filters events across the join, and
//! keeps the subscription alive with exponential-backoff reconnection.
//!
//! [`ConnectionManager`] owns one subscription end to end. It drives a
//! [`Reconciler`] per connection attempt, which in turn hands events to the
//! caller's [`SessionHandler`].

pub mod backoff;
pub mod manager;
pub mod memory;
pub mod reconciler;
pub mod state;
pub mod transport;

pub use backoff::{ReconnectConfig, ReconnectState};
pub use manager::{ConnectionHandle, ConnectionManager};
pub use memory::{AttemptControl, MemoryTransport};
pub use reconciler::{Ingest, Reconciler, SessionHandler, SyncReport};
pub use state::{ConnectionError, ConnectionState, ConnectionStatus, StatusWatch};
pub use transport::{EventStream, EventTransport, Subscription, TransportError};
