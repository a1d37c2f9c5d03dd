//! A scripted mid-combat join.
//!
//! The player connects while round 2 is under way. Three events are already
//! on the wire when the subscription opens; the snapshot reflects the first
//! two, so only the third is replayed on top of it. Two more events arrive
//! live afterwards, one of a kind this client does not know.

use std::collections::HashMap;
use std::sync::Arc;

use skirmish_config::ConnectionConfig;
use skirmish_events::{
    AttackResolved, DecodeError, EventEnvelope, EventHandler, HandlerError, MonsterTurnCompleted,
    MovementCompleted, Snapshot, TurnEnded,
};
use skirmish_hex::{CubeCoord, Occupancy, TurnResources, legal_destinations};
use skirmish_sync::{
    AttemptControl, ConnectionManager, ConnectionState, MemoryTransport, ReconnectConfig,
    SessionHandler, Subscription,
};
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{debug, info, warn};

const SESSION_ID: &str = "crypt-of-embers";
const PLAYER_ID: &str = "player-2";

const SNAPSHOT: &str = r#"{
    "lastEventId": "01J2F7RZ5W8Q3N4K6M0T9B1C02",
    "room": {
        "roomId": "room-antechamber",
        "name": "Antechamber",
        "bounds": { "min_x": -4, "max_x": 4, "min_y": -4, "max_y": 4 },
        "walls": [ { "x": 2, "y": -1, "z": -1 }, { "x": 2, "y": 0, "z": -2 } ]
    },
    "combat": {
        "round": 2,
        "activeEntityId": "goblin-1",
        "initiative": [ "char-aria", "goblin-1", "char-brannoc" ],
        "resources": { "movementMax": 30, "movementUsed": 10, "actionUsed": false, "bonusActionUsed": false },
        "paused": false
    },
    "party": [
        { "playerId": "player-1", "characterId": "char-aria", "name": "Aria",
          "position": { "x": 0, "y": 0, "z": 0 }, "hitPoints": 17, "maxHitPoints": 22 },
        { "playerId": "player-2", "characterId": "char-brannoc", "name": "Brannoc",
          "position": { "x": -1, "y": 1, "z": 0 }, "hitPoints": 26, "maxHitPoints": 26 }
    ],
    "monsters": [
        { "monsterId": "goblin-1", "kind": "goblin", "position": { "x": 1, "y": -1, "z": 0 }, "hitPoints": 7 }
    ],
    "doors": [
        { "doorId": "door-north", "position": { "x": 0, "y": -3, "z": 3 }, "open": false }
    ]
}"#;

/// Already on the wire when the subscription opens.
const BACKLOG: &str = r#"
{"eventId":"01J2F7RZ5W8Q3N4K6M0T9B1C01","timestampMs":1718031000000,"kind":"movement-completed","payload":{"entityId":"goblin-1","path":[{"x":1,"y":-1,"z":0}],"position":{"x":1,"y":-1,"z":0},"resources":{"movementMax":30,"movementUsed":5,"actionUsed":false,"bonusActionUsed":false}}}
{"eventId":"01J2F7RZ5W8Q3N4K6M0T9B1C02","timestampMs":1718031001500,"kind":"attack-resolved","payload":{"attackerId":"goblin-1","targetId":"char-aria","hit":true,"critical":false,"damage":5,"targetHitPoints":17}}
{"eventId":"01J2F7RZ5W8Q3N4K6M0T9B1C03","timestampMs":1718031002200,"kind":"monster-turn-completed","payload":{"monsterId":"goblin-1","position":{"x":1,"y":-1,"z":0},"targetsHit":["char-aria"]}}
"#;

/// Arrives after the sync completes.
const LIVE: &str = r#"
{"eventId":"01J2F7RZ5W8Q3N4K6M0T9B1C04","timestampMs":1718031002900,"kind":"turn-ended","payload":{"entityId":"goblin-1","nextEntityId":"char-brannoc","round":2,"nextResources":{"movementMax":25,"movementUsed":0,"actionUsed":false,"bonusActionUsed":false}}}
{"eventId":"01J2F7RZ5W8Q3N4K6M0T9B1C05","timestampMs":1718031003100,"kind":"emote-performed","payload":{"entityId":"char-aria","emote":"wave"}}
"#;

/// Errors from the scripted replay.
#[derive(Debug, thiserror::Error)]
pub enum EncounterError {
    #[error("bad event in script: {0}")]
    Decode(#[from] DecodeError),
    #[error("bad snapshot in script: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("connection manager stopped early")]
    ManagerStopped,
    #[error("connection manager panicked: {0}")]
    Join(#[from] JoinError),
}

/// What the player's client shows about the table.
#[derive(Debug, Default)]
pub struct TableView {
    player_id: String,
    hero_id: Option<String>,
    positions: HashMap<String, CubeCoord>,
    occupied: Occupancy,
    active_entity_id: String,
    round: u32,
    resources: TurnResources,
    applied: usize,
}

impl TableView {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            ..Self::default()
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    /// Events applied on top of the last snapshot.
    pub fn applied(&self) -> usize {
        self.applied
    }

    pub fn position_of(&self, entity_id: &str) -> Option<CubeCoord> {
        self.positions.get(entity_id).copied()
    }

    pub fn is_my_turn(&self) -> bool {
        self.hero_id.as_deref() == Some(self.active_entity_id.as_str())
    }

    /// Cells the player's character could move to right now.
    pub fn highlighted_cells(&self) -> usize {
        let Some(origin) = self.hero_id.as_deref().and_then(|id| self.position_of(id)) else {
            return 0;
        };
        if !self.is_my_turn() {
            return 0;
        }
        legal_destinations(origin, self.resources.remaining_movement(), &self.occupied).len()
    }

    fn move_entity(&mut self, entity_id: &str, to: CubeCoord) {
        if let Some(from) = self.positions.insert(entity_id.to_string(), to) {
            self.occupied.remove(&from);
        }
        self.occupied.insert(to);
    }
}

impl EventHandler for TableView {
    fn on_movement_completed(
        &mut self,
        env: &EventEnvelope,
        event: &MovementCompleted,
    ) -> Result<(), HandlerError> {
        let to = event
            .position
            .or_else(|| event.path.last().copied())
            .ok_or_else(|| HandlerError::new("movement without a destination"))?;
        self.move_entity(&event.entity_id, to);
        if let Some(resources) = event.resources {
            self.resources = resources;
        }
        self.applied += 1;
        info!("[{}] {} moved to {}", env.event_id, event.entity_id, to);
        Ok(())
    }

    fn on_attack_resolved(
        &mut self,
        env: &EventEnvelope,
        event: &AttackResolved,
    ) -> Result<(), HandlerError> {
        self.applied += 1;
        if event.hit {
            info!(
                "[{}] {} hit {} for {}",
                env.event_id, event.attacker_id, event.target_id, event.damage
            );
        } else {
            info!("[{}] {} missed {}", env.event_id, event.attacker_id, event.target_id);
        }
        Ok(())
    }

    fn on_monster_turn_completed(
        &mut self,
        env: &EventEnvelope,
        event: &MonsterTurnCompleted,
    ) -> Result<(), HandlerError> {
        if let Some(to) = event.position {
            self.move_entity(&event.monster_id, to);
        }
        self.applied += 1;
        info!(
            "[{}] {} finished its turn ({} targets hit)",
            env.event_id,
            event.monster_id,
            event.targets_hit.len()
        );
        Ok(())
    }

    fn on_turn_ended(
        &mut self,
        env: &EventEnvelope,
        event: &TurnEnded,
    ) -> Result<(), HandlerError> {
        if let Some(next) = &event.next_entity_id {
            self.active_entity_id = next.clone();
        }
        if let Some(resources) = event.next_resources {
            self.resources = resources;
        }
        self.round = self.round.max(event.round);
        self.applied += 1;
        info!("[{}] turn passes to {}", env.event_id, self.active_entity_id);
        if self.is_my_turn() {
            info!("Your turn: {} cells in reach", self.highlighted_cells());
        }
        Ok(())
    }

    fn on_unrecognized(&mut self, env: &EventEnvelope, kind: &str, _payload: &serde_json::Value) {
        debug!("[{}] ignoring {}", env.event_id, kind);
    }
}

impl SessionHandler for TableView {
    fn on_state_sync(&mut self, snapshot: &Snapshot) -> Result<(), HandlerError> {
        self.hero_id = snapshot
            .party
            .iter()
            .find(|m| m.player_id == self.player_id)
            .map(|m| m.character_id.clone());
        self.positions = snapshot
            .party
            .iter()
            .filter_map(|m| m.position.map(|p| (m.character_id.clone(), p)))
            .chain(
                snapshot
                    .monsters
                    .iter()
                    .filter(|m| m.is_alive())
                    .map(|m| (m.monster_id.clone(), m.position)),
            )
            .collect();
        self.occupied = snapshot.occupied_cells();
        self.applied = 0;

        let combat = snapshot
            .combat
            .as_ref()
            .ok_or_else(|| HandlerError::new("snapshot has no combat in progress"))?;
        self.round = combat.round;
        self.active_entity_id = combat.active_entity_id.clone();
        self.resources = combat.resources;
        info!(
            "Synced at {}: round {}, {} to act",
            snapshot.last_event_id, self.round, self.active_entity_id
        );
        Ok(())
    }
}

fn decode_lines(script: &str) -> Result<Vec<EventEnvelope>, DecodeError> {
    script
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(EventEnvelope::from_json)
        .collect()
}

async fn reach(
    status: &mut watch::Receiver<skirmish_sync::ConnectionStatus>,
    state: ConnectionState,
) -> Result<(), EncounterError> {
    status
        .wait_for(|s| s.state == state || s.state.is_terminal())
        .await
        .map_err(|_| EncounterError::ManagerStopped)?;
    if status.borrow().state == state {
        Ok(())
    } else {
        Err(EncounterError::ManagerStopped)
    }
}

/// Join the scripted session mid-combat and return the resulting table.
pub async fn replay_mid_combat_join(
    conn: &ConnectionConfig,
    backoff: ReconnectConfig,
) -> Result<TableView, EncounterError> {
    let backlog = decode_lines(BACKLOG)?;
    let live = decode_lines(LIVE)?;
    let snapshot: Snapshot = serde_json::from_str(SNAPSHOT)?;

    let session_id = if conn.session_id.is_empty() { SESSION_ID } else { &conn.session_id };
    let player_id = if conn.player_id.is_empty() { PLAYER_ID } else { &conn.player_id };

    let transport = Arc::new(MemoryTransport::new());
    let AttemptControl {
        events,
        snapshot: snapshot_reply,
    } = transport.push_attempt();

    let handle = ConnectionManager::spawn(
        Arc::clone(&transport),
        Subscription::new(session_id, player_id),
        backoff,
        TableView::new(player_id),
    );
    let mut status = handle.status();

    reach(&mut status, ConnectionState::Syncing).await?;
    for envelope in backlog {
        events
            .send(Ok(envelope))
            .await
            .map_err(|_| EncounterError::ManagerStopped)?;
    }
    tokio::task::yield_now().await;
    snapshot_reply
        .send(Ok(snapshot))
        .map_err(|_| EncounterError::ManagerStopped)?;
    reach(&mut status, ConnectionState::Connected).await?;

    for envelope in live {
        events
            .send(Ok(envelope))
            .await
            .map_err(|_| EncounterError::ManagerStopped)?;
    }

    // Closing the stream lets the manager drain it before it notices.
    drop(events);
    reach(&mut status, ConnectionState::Disconnected).await?;
    if status.borrow().state.is_reconnecting() {
        warn!("Scripted server went away; stopping instead of reconnecting");
    }

    let view = handle.shutdown().await?;
    info!(
        "Subscription ended in {:?} after {} opens",
        status.borrow().state,
        transport.open_count()
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_decodes() {
        assert_eq!(decode_lines(BACKLOG).unwrap().len(), 3);
        let live = decode_lines(LIVE).unwrap();
        assert_eq!(live.len(), 2);
        assert_eq!(live[1].kind(), None);
        let snapshot: Snapshot = serde_json::from_str(SNAPSHOT).unwrap();
        assert_eq!(snapshot.party.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_applies_only_events_after_snapshot() {
        let view = replay_mid_combat_join(&ConnectionConfig::default(), ReconnectConfig::default())
            .await
            .unwrap();

        // 03 replayed, 04 live; 01/02 are in the snapshot; 05 is unknown.
        assert_eq!(view.applied(), 2);
        assert_eq!(view.round(), 2);
        assert!(view.is_my_turn());
        assert_eq!(view.position_of("goblin-1"), Some(CubeCoord::new(1, -1, 0)));
        assert_eq!(view.resources.remaining_movement(), 25);
        assert!(view.highlighted_cells() > 0);
    }
}
