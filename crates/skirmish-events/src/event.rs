//! The closed set of combat events and their payloads.
//!
//! Every kind the server is known to emit has its own variant in
//! [`GameEvent`]. Tags the client does not recognise are preserved in
//! [`GameEvent::Unrecognized`] so they can be logged and skipped instead of
//! failing the stream.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use skirmish_hex::{CubeCoord, TurnResources};

use crate::snapshot::{CombatState, RoomState};

// ---------------------------------------------------------------------------
// EventKind
// ---------------------------------------------------------------------------

/// Wire tag of a recognised event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    PlayerJoined,
    PlayerLeft,
    PlayerReady,
    PlayerDisconnected,
    PlayerReconnected,
    CombatStarted,
    CombatPaused,
    CombatResumed,
    CombatEnded,
    MovementCompleted,
    AttackResolved,
    FeatureActivated,
    TurnEnded,
    MonsterTurnCompleted,
    RoomRevealed,
    DungeonVictory,
    DungeonFailure,
}

impl EventKind {
    /// Every recognised kind, in wire-documentation order.
    pub const ALL: [EventKind; 17] = [
        Self::PlayerJoined,
        Self::PlayerLeft,
        Self::PlayerReady,
        Self::PlayerDisconnected,
        Self::PlayerReconnected,
        Self::CombatStarted,
        Self::CombatPaused,
        Self::CombatResumed,
        Self::CombatEnded,
        Self::MovementCompleted,
        Self::AttackResolved,
        Self::FeatureActivated,
        Self::TurnEnded,
        Self::MonsterTurnCompleted,
        Self::RoomRevealed,
        Self::DungeonVictory,
        Self::DungeonFailure,
    ];

    /// The kebab-case tag used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PlayerJoined => "player-joined",
            Self::PlayerLeft => "player-left",
            Self::PlayerReady => "player-ready",
            Self::PlayerDisconnected => "player-disconnected",
            Self::PlayerReconnected => "player-reconnected",
            Self::CombatStarted => "combat-started",
            Self::CombatPaused => "combat-paused",
            Self::CombatResumed => "combat-resumed",
            Self::CombatEnded => "combat-ended",
            Self::MovementCompleted => "movement-completed",
            Self::AttackResolved => "attack-resolved",
            Self::FeatureActivated => "feature-activated",
            Self::TurnEnded => "turn-ended",
            Self::MonsterTurnCompleted => "monster-turn-completed",
            Self::RoomRevealed => "room-revealed",
            Self::DungeonVictory => "dungeon-victory",
            Self::DungeonFailure => "dungeon-failure",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag that is not one of the [`EventKind`]s.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event kind {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// GameEvent
// ---------------------------------------------------------------------------

/// A decoded event payload.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined(PlayerJoined),
    PlayerLeft(PlayerLeft),
    PlayerReady(PlayerReady),
    PlayerDisconnected(PlayerDisconnected),
    PlayerReconnected(PlayerReconnected),
    CombatStarted(CombatStarted),
    CombatPaused(CombatPaused),
    CombatResumed(CombatResumed),
    CombatEnded(CombatEnded),
    MovementCompleted(MovementCompleted),
    AttackResolved(AttackResolved),
    FeatureActivated(FeatureActivated),
    TurnEnded(TurnEnded),
    MonsterTurnCompleted(MonsterTurnCompleted),
    RoomRevealed(RoomRevealed),
    DungeonVictory(DungeonVictory),
    DungeonFailure(DungeonFailure),
    /// A tag this client does not know, kept verbatim for logging.
    Unrecognized {
        kind: String,
        payload: serde_json::Value,
    },
}

impl GameEvent {
    /// The recognised kind, or `None` for [`GameEvent::Unrecognized`].
    pub fn kind(&self) -> Option<EventKind> {
        Some(match self {
            Self::PlayerJoined(_) => EventKind::PlayerJoined,
            Self::PlayerLeft(_) => EventKind::PlayerLeft,
            Self::PlayerReady(_) => EventKind::PlayerReady,
            Self::PlayerDisconnected(_) => EventKind::PlayerDisconnected,
            Self::PlayerReconnected(_) => EventKind::PlayerReconnected,
            Self::CombatStarted(_) => EventKind::CombatStarted,
            Self::CombatPaused(_) => EventKind::CombatPaused,
            Self::CombatResumed(_) => EventKind::CombatResumed,
            Self::CombatEnded(_) => EventKind::CombatEnded,
            Self::MovementCompleted(_) => EventKind::MovementCompleted,
            Self::AttackResolved(_) => EventKind::AttackResolved,
            Self::FeatureActivated(_) => EventKind::FeatureActivated,
            Self::TurnEnded(_) => EventKind::TurnEnded,
            Self::MonsterTurnCompleted(_) => EventKind::MonsterTurnCompleted,
            Self::RoomRevealed(_) => EventKind::RoomRevealed,
            Self::DungeonVictory(_) => EventKind::DungeonVictory,
            Self::DungeonFailure(_) => EventKind::DungeonFailure,
            Self::Unrecognized { .. } => return None,
        })
    }

    /// The wire tag, including unrecognised ones.
    pub fn tag(&self) -> &str {
        match self {
            Self::Unrecognized { kind, .. } => kind.as_str(),
            other => other.kind().map_or("", EventKind::as_str),
        }
    }
}

// ---------------------------------------------------------------------------
// Lobby payloads
// ---------------------------------------------------------------------------

/// A player entered the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerJoined {
    pub player_id: String,
    /// Display name.
    pub name: String,
}

/// A player left the session for good.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerLeft {
    pub player_id: String,
}

/// A player toggled their ready flag in the lobby.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerReady {
    pub player_id: String,
    pub ready: bool,
}

/// A player's connection dropped; their character stays in the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerDisconnected {
    pub player_id: String,
}

/// A previously disconnected player is back.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerReconnected {
    pub player_id: String,
}

// ---------------------------------------------------------------------------
// Combat lifecycle payloads
// ---------------------------------------------------------------------------

/// Initiative was rolled and the first turn begins.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatStarted {
    pub combat: CombatState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatPaused {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatResumed {
    /// Whose turn it is after resuming, when the server includes it.
    pub active_entity_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatEnded {
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Turn payloads
// ---------------------------------------------------------------------------

/// An entity finished moving. `resources` carries the mover's updated turn
/// budget when the mover is the active combatant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementCompleted {
    pub entity_id: String,
    /// Cells stepped through, excluding the starting cell.
    pub path: Vec<CubeCoord>,
    /// Final position.
    pub position: Option<CubeCoord>,
    pub resources: Option<TurnResources>,
}

/// The outcome of an attack roll.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AttackResolved {
    pub attacker_id: String,
    pub target_id: String,
    pub hit: bool,
    pub critical: bool,
    pub damage: u32,
    /// The target's hit points after damage.
    pub target_hit_points: Option<i32>,
    pub resources: Option<TurnResources>,
}

/// A class feature or ability was used.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureActivated {
    pub entity_id: String,
    pub feature_id: String,
    pub resources: Option<TurnResources>,
}

/// The active entity ended its turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnEnded {
    pub entity_id: String,
    pub next_entity_id: Option<String>,
    pub round: u32,
    /// Fresh budget for the next entity.
    pub next_resources: Option<TurnResources>,
}

/// The server finished running a monster's turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MonsterTurnCompleted {
    pub monster_id: String,
    pub position: Option<CubeCoord>,
    /// Entities the monster damaged this turn.
    pub targets_hit: Vec<String>,
}

// ---------------------------------------------------------------------------
// Dungeon payloads
// ---------------------------------------------------------------------------

/// A new room became visible, usually after a door opened.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomRevealed {
    pub room: RoomState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DungeonVictory {
    pub rooms_cleared: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DungeonFailure {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert_eq!(
            "player-danced".parse::<EventKind>(),
            Err(UnknownKind("player-danced".to_string()))
        );
    }

    #[test]
    fn test_tag_of_unrecognized_is_preserved() {
        let event = GameEvent::Unrecognized {
            kind: "loot-dropped".to_string(),
            payload: serde_json::Value::Null,
        };
        assert_eq!(event.kind(), None);
        assert_eq!(event.tag(), "loot-dropped");
    }

    #[test]
    fn test_payload_defaults_fill_missing_fields() {
        let moved: MovementCompleted =
            serde_json::from_str(r#"{"entityId":"hero-1","position":{"x":1,"y":0,"z":-1}}"#)
                .unwrap();
        assert_eq!(moved.entity_id, "hero-1");
        assert!(moved.path.is_empty());
        assert_eq!(moved.position, Some(CubeCoord::new(1, 0, -1)));
        assert_eq!(moved.resources, None);
    }
}
