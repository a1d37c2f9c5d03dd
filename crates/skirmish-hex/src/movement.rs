//! Movement budgeting: the click-to-extend path planner and legal-destination
//! highlighting.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CubeCoord, FEET_PER_HEX, MovementPath, Occupancy, PathBuilder, cells_within};

// ---------------------------------------------------------------------------
// TurnResources
// ---------------------------------------------------------------------------

/// What the active combatant has spent this turn.
///
/// Read-only to the client: values change only when an authoritative event
/// or snapshot replaces them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResources {
    /// Movement available this turn, in feet.
    pub movement_max: u32,
    /// Movement already spent this turn, in feet.
    pub movement_used: u32,
    pub action_used: bool,
    pub bonus_action_used: bool,
}

impl TurnResources {
    /// Movement left this turn, in feet. Never underflows.
    pub fn remaining_movement(&self) -> u32 {
        self.movement_max.saturating_sub(self.movement_used)
    }
}

// ---------------------------------------------------------------------------
// MoveRejected
// ---------------------------------------------------------------------------

/// Why a path extension was refused. The tentative path is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoveRejected {
    /// The extended path would cost more than the movement left this turn.
    #[error("path would cost {cost} ft but only {remaining} ft remain")]
    OverBudget {
        /// Total cost of the existing path plus the new segment, in feet.
        cost: u32,
        /// Movement remaining this turn, in feet.
        remaining: u32,
    },
    /// No legal route reaches the target from the current path end.
    #[error("no legal route to {target}")]
    Unreachable {
        /// The cell that was clicked.
        target: CubeCoord,
    },
}

// ---------------------------------------------------------------------------
// PathPlanner
// ---------------------------------------------------------------------------

/// Tentative movement for one entity, extended one click at a time.
///
/// Each extension runs from the current end of the path (or the entity's
/// position when the path is empty) to the clicked cell, and is appended
/// whole or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPlanner {
    position: CubeCoord,
    path: MovementPath,
}

impl PathPlanner {
    /// Starts planning for an entity standing at `position`.
    pub fn new(position: CubeCoord) -> Self {
        Self {
            position,
            path: MovementPath::new(),
        }
    }

    /// The entity's authoritative position.
    pub fn position(&self) -> CubeCoord {
        self.position
    }

    pub fn path(&self) -> &MovementPath {
        &self.path
    }

    /// Where the next segment starts.
    pub fn origin(&self) -> CubeCoord {
        self.path.last().unwrap_or(self.position)
    }

    /// Moves the entity to an authoritative position and drops the
    /// tentative path, which no longer starts from the right cell.
    pub fn reposition(&mut self, position: CubeCoord) {
        self.position = position;
        self.path = MovementPath::new();
    }

    /// Extends the path to `target`.
    ///
    /// The total cost `(existing + segment) × 5 ft` must fit in
    /// `resources.remaining_movement()`. Returns the new path length.
    ///
    /// The builder's detour limit is raised to whatever the remaining budget
    /// can pay for (up to [`MAX_HIGHLIGHT_HEXES`]), so an affordable route
    /// around a wall is never cut off by the search bound.
    ///
    /// # Errors
    ///
    /// [`MoveRejected::Unreachable`] if the builder finds no route (including
    /// clicking the current origin), [`MoveRejected::OverBudget`] if the
    /// extension is too expensive. The path is unchanged in both cases.
    pub fn extend_to(
        &mut self,
        target: CubeCoord,
        builder: &PathBuilder<'_>,
        resources: &TurnResources,
    ) -> Result<usize, MoveRejected> {
        let origin = self.origin();
        let remaining = resources.remaining_movement();
        let affordable = (remaining.saturating_sub(self.path.cost_feet()) / FEET_PER_HEX)
            .min(MAX_HIGHLIGHT_HEXES);
        let detour = affordable.saturating_sub(origin.distance(target));
        let segment = if detour > builder.max_detour() {
            builder.clone().with_max_detour(detour).build(origin, target)
        } else {
            builder.build(origin, target)
        };
        if segment.is_empty() {
            return Err(MoveRejected::Unreachable { target });
        }

        let cost = (self.path.len() + segment.len()) as u32 * FEET_PER_HEX;
        if cost > remaining {
            return Err(MoveRejected::OverBudget { cost, remaining });
        }

        self.path.append(segment);
        Ok(self.path.len())
    }

    /// Discards the tentative path.
    pub fn clear(&mut self) {
        self.path = MovementPath::new();
    }

    /// Hands the tentative path over for execution and resets the planner.
    /// The entity's position is left for the authoritative event to update.
    pub fn take(&mut self) -> MovementPath {
        std::mem::take(&mut self.path)
    }

    /// Cells the path may still be extended to, given what the tentative
    /// path already costs.
    pub fn legal_destinations(
        &self,
        resources: &TurnResources,
        occupied: &Occupancy,
    ) -> HashSet<CubeCoord> {
        let remaining = resources
            .remaining_movement()
            .saturating_sub(self.path.cost_feet());
        legal_destinations(self.origin(), remaining, occupied)
    }
}

// ---------------------------------------------------------------------------
// legal_destinations
// ---------------------------------------------------------------------------

/// Highlighting never scans further than this many steps from the origin,
/// whatever movement budget the server reports.
pub const MAX_HIGHLIGHT_HEXES: u32 = 200;

/// Every unoccupied cell within `floor(remaining_feet / 5)` steps of `origin`,
/// excluding `origin` itself. The radius is capped at
/// [`MAX_HIGHLIGHT_HEXES`].
///
/// This is a highlighting aid: it does not account for walls between
/// `origin` and a cell. The path builder makes the final call when a cell
/// is clicked.
pub fn legal_destinations(
    origin: CubeCoord,
    remaining_feet: u32,
    occupied: &Occupancy,
) -> HashSet<CubeCoord> {
    let remaining_hexes = (remaining_feet / FEET_PER_HEX).min(MAX_HIGHLIGHT_HEXES);
    cells_within(origin, remaining_hexes)
        .into_iter()
        .filter(|cell| *cell != origin && !occupied.contains(cell))
        .collect()
}
