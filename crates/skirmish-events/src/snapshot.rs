//! Full authoritative session state, fetched once per connection attempt.

use serde::{Deserialize, Serialize};
use skirmish_hex::{CubeCoord, GridBounds, Occupancy, TurnResources};

/// Point-in-time state of the whole session.
///
/// `last_event_id` is the id of the newest event already folded into this
/// state; buffered events at or before it must not be applied again.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub last_event_id: String,
    pub room: Option<RoomState>,
    pub combat: Option<CombatState>,
    pub party: Vec<PartyMember>,
    pub monsters: Vec<MonsterState>,
    pub doors: Vec<DoorState>,
}

impl Snapshot {
    /// Cells nothing may move through: walls, closed doors, and every
    /// positioned party member or living monster.
    pub fn occupied_cells(&self) -> Occupancy {
        let mut occupied = Occupancy::new();
        if let Some(room) = &self.room {
            occupied.extend(room.walls.iter().copied());
        }
        occupied.extend(self.doors.iter().filter(|d| !d.open).map(|d| d.position));
        occupied.extend(self.party.iter().filter_map(|m| m.position));
        occupied.extend(
            self.monsters
                .iter()
                .filter(|m| m.is_alive())
                .map(|m| m.position),
        );
        occupied
    }

    /// Where `entity_id` stands, whether it is a party member or a monster.
    pub fn position_of(&self, entity_id: &str) -> Option<CubeCoord> {
        self.party
            .iter()
            .find(|m| m.character_id == entity_id || m.player_id == entity_id)
            .and_then(|m| m.position)
            .or_else(|| {
                self.monsters
                    .iter()
                    .find(|m| m.monster_id == entity_id)
                    .map(|m| m.position)
            })
    }
}

/// Geometry of the room the party is in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RoomState {
    pub room_id: String,
    pub name: String,
    pub bounds: Option<GridBounds>,
    pub walls: Vec<CubeCoord>,
}

/// Turn order and the active combatant's budget.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CombatState {
    pub round: u32,
    pub active_entity_id: String,
    /// Entity ids in initiative order.
    pub initiative: Vec<String>,
    pub resources: TurnResources,
    pub paused: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PartyMember {
    pub player_id: String,
    pub character_id: String,
    pub name: String,
    /// `None` until the character has been placed on the grid.
    pub position: Option<CubeCoord>,
    pub hit_points: i32,
    pub max_hit_points: i32,
    pub connected: bool,
    pub ready: bool,
}

impl Default for PartyMember {
    fn default() -> Self {
        Self {
            player_id: String::new(),
            character_id: String::new(),
            name: String::new(),
            position: None,
            hit_points: 0,
            max_hit_points: 0,
            connected: true,
            ready: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MonsterState {
    pub monster_id: String,
    /// Monster template, e.g. `"goblin"`.
    pub kind: String,
    pub position: CubeCoord,
    pub hit_points: i32,
}

impl MonsterState {
    pub fn is_alive(&self) -> bool {
        self.hit_points > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DoorState {
    pub door_id: String,
    pub position: CubeCoord,
    pub open: bool,
}
