//! Event envelopes as they arrive from the server stream.
//!
//! On the wire an envelope is camelCase JSON:
//!
//! ```json
//! {"eventId": "01HZX3...", "timestampMs": 1718000000000, "kind": "turn-ended", "payload": {...}}
//! ```
//!
//! `eventId` is a ULID, so plain string comparison orders envelopes by
//! creation time.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::event::{EventKind, GameEvent};

/// Undecoded envelope: the tag is a string and the payload untyped JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    pub event_id: String,
    pub timestamp_ms: i64,
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A received event with its typed payload. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub event_id: String,
    pub timestamp_ms: i64,
    pub event: GameEvent,
}

impl EventEnvelope {
    pub fn new(event_id: impl Into<String>, timestamp_ms: i64, event: GameEvent) -> Self {
        Self {
            event_id: event_id.into(),
            timestamp_ms,
            event,
        }
    }

    /// Decodes the payload according to the envelope's tag.
    ///
    /// Unknown tags decode successfully into [`GameEvent::Unrecognized`];
    /// only a known tag with a payload of the wrong shape is an error.
    ///
    /// # Errors
    ///
    /// [`DecodeError::MissingEventId`] for an empty id,
    /// [`DecodeError::Payload`] when the payload does not fit its kind.
    pub fn from_wire(wire: WireEnvelope) -> Result<Self, DecodeError> {
        if wire.event_id.is_empty() {
            return Err(DecodeError::MissingEventId);
        }
        let event = decode_event(&wire.kind, wire.payload)?;
        Ok(Self {
            event_id: wire.event_id,
            timestamp_ms: wire.timestamp_ms,
            event,
        })
    }

    /// Parses and decodes one JSON-encoded envelope.
    ///
    /// # Errors
    ///
    /// [`DecodeError::Json`] if the text is not an envelope, otherwise as
    /// [`Self::from_wire`].
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let wire: WireEnvelope = serde_json::from_str(text)?;
        Self::from_wire(wire)
    }

    /// The recognised kind, or `None` for unrecognised tags.
    pub fn kind(&self) -> Option<EventKind> {
        self.event.kind()
    }

    /// The wire tag.
    pub fn tag(&self) -> &str {
        self.event.tag()
    }
}

fn decode_event(tag: &str, payload: serde_json::Value) -> Result<GameEvent, DecodeError> {
    let Ok(kind) = tag.parse::<EventKind>() else {
        return Ok(GameEvent::Unrecognized {
            kind: tag.to_string(),
            payload,
        });
    };

    // Payload-less kinds may arrive with `null` or no payload at all.
    let payload = if payload.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        payload
    };

    Ok(match kind {
        EventKind::PlayerJoined => GameEvent::PlayerJoined(payload_as(kind, payload)?),
        EventKind::PlayerLeft => GameEvent::PlayerLeft(payload_as(kind, payload)?),
        EventKind::PlayerReady => GameEvent::PlayerReady(payload_as(kind, payload)?),
        EventKind::PlayerDisconnected => GameEvent::PlayerDisconnected(payload_as(kind, payload)?),
        EventKind::PlayerReconnected => GameEvent::PlayerReconnected(payload_as(kind, payload)?),
        EventKind::CombatStarted => GameEvent::CombatStarted(payload_as(kind, payload)?),
        EventKind::CombatPaused => GameEvent::CombatPaused(payload_as(kind, payload)?),
        EventKind::CombatResumed => GameEvent::CombatResumed(payload_as(kind, payload)?),
        EventKind::CombatEnded => GameEvent::CombatEnded(payload_as(kind, payload)?),
        EventKind::MovementCompleted => GameEvent::MovementCompleted(payload_as(kind, payload)?),
        EventKind::AttackResolved => GameEvent::AttackResolved(payload_as(kind, payload)?),
        EventKind::FeatureActivated => GameEvent::FeatureActivated(payload_as(kind, payload)?),
        EventKind::TurnEnded => GameEvent::TurnEnded(payload_as(kind, payload)?),
        EventKind::MonsterTurnCompleted => {
            GameEvent::MonsterTurnCompleted(payload_as(kind, payload)?)
        }
        EventKind::RoomRevealed => GameEvent::RoomRevealed(payload_as(kind, payload)?),
        EventKind::DungeonVictory => GameEvent::DungeonVictory(payload_as(kind, payload)?),
        EventKind::DungeonFailure => GameEvent::DungeonFailure(payload_as(kind, payload)?),
    })
}

fn payload_as<T: DeserializeOwned>(
    kind: EventKind,
    payload: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(|source| DecodeError::Payload { kind, source })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur while decoding an envelope.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The text is not a well-formed envelope.
    #[error("malformed envelope: {0}")]
    Json(#[from] serde_json::Error),

    /// The envelope has an empty `eventId`, so it cannot be ordered.
    #[error("envelope has no event id")]
    MissingEventId,

    /// The payload does not match the shape required by its kind.
    #[error("invalid {kind} payload: {source}")]
    Payload {
        /// The envelope's kind.
        kind: EventKind,
        /// Underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_hex::CubeCoord;

    #[test]
    fn test_decode_movement_completed() {
        let env = EventEnvelope::from_json(
            r#"{
                "eventId": "01HZX3M6Q4T0000000000000A1",
                "timestampMs": 1718000000000,
                "kind": "movement-completed",
                "payload": {
                    "entityId": "hero-1",
                    "path": [{"x": 1, "y": -1, "z": 0}, {"x": 2, "y": -2, "z": 0}],
                    "position": {"x": 2, "y": -2, "z": 0},
                    "resources": {"movementMax": 30, "movementUsed": 10}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(env.event_id, "01HZX3M6Q4T0000000000000A1");
        assert_eq!(env.kind(), Some(EventKind::MovementCompleted));
        let GameEvent::MovementCompleted(moved) = &env.event else {
            panic!("expected movement-completed, got {:?}", env.event);
        };
        assert_eq!(moved.path.len(), 2);
        assert_eq!(moved.position, Some(CubeCoord::new(2, -2, 0)));
        assert_eq!(moved.resources.unwrap().remaining_movement(), 20);
    }

    #[test]
    fn test_unknown_kind_is_not_an_error() {
        let env = EventEnvelope::from_json(
            r#"{"eventId": "01A", "timestampMs": 5, "kind": "weather-changed", "payload": {"rain": true}}"#,
        )
        .unwrap();
        assert_eq!(env.kind(), None);
        assert_eq!(env.tag(), "weather-changed");
    }

    #[test]
    fn test_missing_payload_decodes_for_empty_kinds() {
        let env = EventEnvelope::from_json(
            r#"{"eventId": "01B", "timestampMs": 6, "kind": "combat-resumed"}"#,
        )
        .unwrap();
        assert_eq!(
            env.event,
            GameEvent::CombatResumed(Default::default())
        );
    }

    #[test]
    fn test_wrong_payload_shape_is_rejected() {
        let err = EventEnvelope::from_json(
            r#"{"eventId": "01C", "timestampMs": 7, "kind": "turn-ended", "payload": {"round": "two"}}"#,
        )
        .unwrap_err();
        assert!(
            matches!(err, DecodeError::Payload { kind: EventKind::TurnEnded, .. }),
            "expected payload error, got {err:?}"
        );
    }

    #[test]
    fn test_off_plane_coordinate_is_rejected() {
        let err = EventEnvelope::from_json(
            r#"{"eventId": "01D", "timestampMs": 8, "kind": "monster-turn-completed",
                "payload": {"monsterId": "g", "position": {"x": 1, "y": 1, "z": 1}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::Payload { .. }));
    }

    #[test]
    fn test_empty_event_id_is_rejected() {
        let err = EventEnvelope::from_json(
            r#"{"eventId": "", "timestampMs": 9, "kind": "player-left", "payload": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, DecodeError::MissingEventId));
    }

    #[test]
    fn test_garbage_is_json_error() {
        assert!(matches!(
            EventEnvelope::from_json("not json"),
            Err(DecodeError::Json(_))
        ));
    }
}
