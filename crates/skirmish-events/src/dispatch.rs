//! Routes each envelope to the one handler method for its kind.
//!
//! The dispatcher does no buffering or ordering of its own; it is called
//! once per event, in the order the caller decides.
//!
//! A failing handler is isolated to its own event: the failure is logged
//! with the event id and reported as [`DispatchOutcome::Failed`], and the
//! caller carries on with the next event.

use crate::envelope::EventEnvelope;
use crate::event::{
    AttackResolved, CombatEnded, CombatPaused, CombatResumed, CombatStarted, DungeonFailure,
    DungeonVictory, FeatureActivated, GameEvent, MonsterTurnCompleted, MovementCompleted,
    PlayerDisconnected, PlayerJoined, PlayerLeft, PlayerReady, PlayerReconnected, RoomRevealed,
    TurnEnded,
};

/// Error returned by a handler method.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Receives dispatched events. Every method defaults to doing nothing, so an
/// implementor only overrides the kinds it cares about.
///
/// Each method is handed the full envelope (for the id and timestamp) along
/// with the already-decoded payload.
#[allow(unused_variables)]
pub trait EventHandler {
    fn on_player_joined(
        &mut self,
        env: &EventEnvelope,
        event: &PlayerJoined,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_player_left(
        &mut self,
        env: &EventEnvelope,
        event: &PlayerLeft,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_player_ready(
        &mut self,
        env: &EventEnvelope,
        event: &PlayerReady,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_player_disconnected(
        &mut self,
        env: &EventEnvelope,
        event: &PlayerDisconnected,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_player_reconnected(
        &mut self,
        env: &EventEnvelope,
        event: &PlayerReconnected,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_combat_started(
        &mut self,
        env: &EventEnvelope,
        event: &CombatStarted,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_combat_paused(
        &mut self,
        env: &EventEnvelope,
        event: &CombatPaused,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_combat_resumed(
        &mut self,
        env: &EventEnvelope,
        event: &CombatResumed,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_combat_ended(
        &mut self,
        env: &EventEnvelope,
        event: &CombatEnded,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_movement_completed(
        &mut self,
        env: &EventEnvelope,
        event: &MovementCompleted,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_attack_resolved(
        &mut self,
        env: &EventEnvelope,
        event: &AttackResolved,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_feature_activated(
        &mut self,
        env: &EventEnvelope,
        event: &FeatureActivated,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_turn_ended(
        &mut self,
        env: &EventEnvelope,
        event: &TurnEnded,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_monster_turn_completed(
        &mut self,
        env: &EventEnvelope,
        event: &MonsterTurnCompleted,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_room_revealed(
        &mut self,
        env: &EventEnvelope,
        event: &RoomRevealed,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_dungeon_victory(
        &mut self,
        env: &EventEnvelope,
        event: &DungeonVictory,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    fn on_dungeon_failure(
        &mut self,
        env: &EventEnvelope,
        event: &DungeonFailure,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Called for tags outside the known set, after the dispatcher has
    /// logged them. Nothing is expected to be done here.
    fn on_unrecognized(&mut self, env: &EventEnvelope, kind: &str, payload: &serde_json::Value) {}
}

/// What happened to a single dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The handler accepted the event.
    Handled,
    /// The tag was not recognised; the event was dropped.
    Unrecognized,
    /// The handler returned an error; the event was dropped.
    Failed(HandlerError),
}

/// Hands `env` to the handler method for its kind.
pub fn dispatch<H: EventHandler + ?Sized>(env: &EventEnvelope, handler: &mut H) -> DispatchOutcome {
    let result = match &env.event {
        GameEvent::PlayerJoined(e) => handler.on_player_joined(env, e),
        GameEvent::PlayerLeft(e) => handler.on_player_left(env, e),
        GameEvent::PlayerReady(e) => handler.on_player_ready(env, e),
        GameEvent::PlayerDisconnected(e) => handler.on_player_disconnected(env, e),
        GameEvent::PlayerReconnected(e) => handler.on_player_reconnected(env, e),
        GameEvent::CombatStarted(e) => handler.on_combat_started(env, e),
        GameEvent::CombatPaused(e) => handler.on_combat_paused(env, e),
        GameEvent::CombatResumed(e) => handler.on_combat_resumed(env, e),
        GameEvent::CombatEnded(e) => handler.on_combat_ended(env, e),
        GameEvent::MovementCompleted(e) => handler.on_movement_completed(env, e),
        GameEvent::AttackResolved(e) => handler.on_attack_resolved(env, e),
        GameEvent::FeatureActivated(e) => handler.on_feature_activated(env, e),
        GameEvent::TurnEnded(e) => handler.on_turn_ended(env, e),
        GameEvent::MonsterTurnCompleted(e) => handler.on_monster_turn_completed(env, e),
        GameEvent::RoomRevealed(e) => handler.on_room_revealed(env, e),
        GameEvent::DungeonVictory(e) => handler.on_dungeon_victory(env, e),
        GameEvent::DungeonFailure(e) => handler.on_dungeon_failure(env, e),
        GameEvent::Unrecognized { kind, payload } => {
            tracing::warn!("Dropping event {} with unrecognized kind {:?}", env.event_id, kind);
            handler.on_unrecognized(env, kind, payload);
            return DispatchOutcome::Unrecognized;
        }
    };

    match result {
        Ok(()) => DispatchOutcome::Handled,
        Err(e) => {
            tracing::warn!("Handler for {} event {} failed: {}", env.tag(), env.event_id, e);
            DispatchOutcome::Failed(e)
        }
    }
}

/// Tally of a batch dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub handled: usize,
    pub unrecognized: usize,
    pub failed: usize,
}

impl DispatchSummary {
    pub fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Handled => self.handled += 1,
            DispatchOutcome::Unrecognized => self.unrecognized += 1,
            DispatchOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Number of events dispatched, whatever their outcome.
    pub fn total(&self) -> usize {
        self.handled + self.unrecognized + self.failed
    }
}

/// Dispatches every envelope in order. A failure in one does not stop the
/// rest.
pub fn dispatch_all<'a, H, I>(envelopes: I, handler: &mut H) -> DispatchSummary
where
    H: EventHandler + ?Sized,
    I: IntoIterator<Item = &'a EventEnvelope>,
{
    let mut summary = DispatchSummary::default();
    for env in envelopes {
        summary.record(&dispatch(env, handler));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
        unrecognized: Vec<String>,
    }

    impl EventHandler for Recorder {
        fn on_player_joined(
            &mut self,
            env: &EventEnvelope,
            event: &PlayerJoined,
        ) -> Result<(), HandlerError> {
            self.seen.push(format!("{}:joined:{}", env.event_id, event.player_id));
            Ok(())
        }

        fn on_turn_ended(
            &mut self,
            env: &EventEnvelope,
            _event: &TurnEnded,
        ) -> Result<(), HandlerError> {
            if env.event_id == "bad" {
                return Err(HandlerError::new("turn order out of sync"));
            }
            self.seen.push(format!("{}:turn-ended", env.event_id));
            Ok(())
        }

        fn on_unrecognized(
            &mut self,
            _env: &EventEnvelope,
            kind: &str,
            _payload: &serde_json::Value,
        ) {
            self.unrecognized.push(kind.to_string());
        }
    }

    fn joined(id: &str, player: &str) -> EventEnvelope {
        EventEnvelope::new(
            id,
            0,
            GameEvent::PlayerJoined(PlayerJoined {
                player_id: player.to_string(),
                name: String::new(),
            }),
        )
    }

    fn turn_ended(id: &str) -> EventEnvelope {
        EventEnvelope::new(id, 0, GameEvent::TurnEnded(TurnEnded::default()))
    }

    #[test]
    fn test_routes_to_matching_method() {
        let mut rec = Recorder::default();
        assert_eq!(dispatch(&joined("e1", "p7"), &mut rec), DispatchOutcome::Handled);
        assert_eq!(rec.seen, vec!["e1:joined:p7"]);
    }

    #[test]
    fn test_unhandled_kind_defaults_to_ok() {
        let mut rec = Recorder::default();
        let env = EventEnvelope::new("e2", 0, GameEvent::CombatPaused(CombatPaused::default()));
        assert_eq!(dispatch(&env, &mut rec), DispatchOutcome::Handled);
        assert!(rec.seen.is_empty());
    }

    #[test]
    fn test_unrecognized_is_dropped_not_fatal() {
        let mut rec = Recorder::default();
        let env = EventEnvelope::new(
            "e3",
            0,
            GameEvent::Unrecognized {
                kind: "loot-dropped".to_string(),
                payload: serde_json::Value::Null,
            },
        );
        assert_eq!(dispatch(&env, &mut rec), DispatchOutcome::Unrecognized);
        assert_eq!(rec.unrecognized, vec!["loot-dropped"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_batch() {
        let mut rec = Recorder::default();
        let batch = [turn_ended("a"), turn_ended("bad"), joined("c", "p1")];
        let summary = dispatch_all(&batch, &mut rec);

        assert_eq!(
            summary,
            DispatchSummary {
                handled: 2,
                unrecognized: 0,
                failed: 1
            }
        );
        assert_eq!(summary.total(), 3);
        assert_eq!(rec.seen, vec!["a:turn-ended", "c:joined:p1"]);
    }

    #[test]
    fn test_dispatch_through_trait_object() {
        let mut rec = Recorder::default();
        let handler: &mut dyn EventHandler = &mut rec;
        dispatch(&joined("e9", "p2"), handler);
        assert_eq!(rec.seen.len(), 1);
    }
}
