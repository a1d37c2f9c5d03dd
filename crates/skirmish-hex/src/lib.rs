//! Hex-grid spatial model for tactical combat: cube coordinates, pixel
//! projection, shortest-path construction, and movement-budget validation.
//!
//! Everything here is pure and synchronous. Positions are [`CubeCoord`]s on a
//! pointy-top grid where one step is [`FEET_PER_HEX`] feet of ground.

mod coord;
mod layout;
mod movement;
mod path;

pub use coord::{CoordError, CubeCoord, Occupancy, cells_within};
pub use layout::HexLayout;
pub use movement::{
    MAX_HIGHLIGHT_HEXES, MoveRejected, PathPlanner, TurnResources, legal_destinations,
};
pub use path::{DEFAULT_MAX_DETOUR, GridBounds, MovementPath, PathBuilder};

/// Ground distance covered by a single hex step, in feet.
pub const FEET_PER_HEX: u32 = 5;
