//! Server-push combat events: the envelope format, the closed set of event
//! kinds with typed payloads, full-state snapshots, and dispatch to a
//! caller-supplied [`EventHandler`].

pub mod dispatch;
pub mod envelope;
pub mod event;
pub mod snapshot;

pub use dispatch::{
    DispatchOutcome, DispatchSummary, EventHandler, HandlerError, dispatch, dispatch_all,
};
pub use envelope::{DecodeError, EventEnvelope, WireEnvelope};
pub use event::{
    AttackResolved, CombatEnded, CombatPaused, CombatResumed, CombatStarted, DungeonFailure,
    DungeonVictory, EventKind, FeatureActivated, GameEvent, MonsterTurnCompleted,
    MovementCompleted, PlayerDisconnected, PlayerJoined, PlayerLeft, PlayerReady,
    PlayerReconnected, RoomRevealed, TurnEnded, UnknownKind,
};
pub use snapshot::{CombatState, DoorState, MonsterState, PartyMember, RoomState, Snapshot};
