//! Shortest-path construction between two cells around blocked terrain.

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::{CubeCoord, FEET_PER_HEX, Occupancy};

/// How far beyond the straight-line distance a search may wander, in hexes.
pub const DEFAULT_MAX_DETOUR: u32 = 6;

// ---------------------------------------------------------------------------
// MovementPath
// ---------------------------------------------------------------------------

/// A tentative, not-yet-committed move: the ordered cells an entity will
/// step through. The starting cell is not included, so `len()` is the number
/// of steps taken.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementPath {
    steps: Vec<CubeCoord>,
}

impl MovementPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[CubeCoord] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Final cell of the path, if any.
    pub fn last(&self) -> Option<CubeCoord> {
        self.steps.last().copied()
    }

    /// Ground distance covered by the whole path.
    pub fn cost_feet(&self) -> u32 {
        self.steps.len() as u32 * FEET_PER_HEX
    }

    /// Returns `true` if every step is adjacent to its predecessor, with the
    /// first step adjacent to `start`.
    pub fn is_contiguous_from(&self, start: CubeCoord) -> bool {
        let mut prev = start;
        for &step in &self.steps {
            if !prev.is_adjacent(step) {
                return false;
            }
            prev = step;
        }
        true
    }

    /// Appends a segment whose first step is adjacent to [`Self::last`].
    pub(crate) fn append(&mut self, segment: MovementPath) {
        self.steps.extend(segment.steps);
    }

    pub fn into_steps(self) -> Vec<CubeCoord> {
        self.steps
    }
}

// ---------------------------------------------------------------------------
// GridBounds
// ---------------------------------------------------------------------------

/// Inclusive rectangle over the stored `x`/`y` axes. Cells outside it are
/// treated as walls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    pub fn contains(&self, cell: CubeCoord) -> bool {
        (self.min_x..=self.max_x).contains(&cell.x) && (self.min_y..=self.max_y).contains(&cell.y)
    }
}

// ---------------------------------------------------------------------------
// PathBuilder
// ---------------------------------------------------------------------------

/// Breadth-first shortest-path search over the six hex directions.
///
/// The search never steps onto a blocked cell. By default the target itself
/// must also be free; callers that want to path *up to* an occupied cell can
/// opt in with [`PathBuilder::allow_blocked_target`] and apply their own rule
/// about where the mover may stop.
///
/// The search is confined to cells within `distance(start, target) +
/// max_detour` of `start` (and inside the grid bounds, when set), so an
/// unreachable target terminates instead of flooding an unbounded plane.
#[derive(Debug, Clone)]
pub struct PathBuilder<'a> {
    blocked: &'a Occupancy,
    bounds: Option<GridBounds>,
    max_detour: u32,
    allow_blocked_target: bool,
}

impl<'a> PathBuilder<'a> {
    pub fn new(blocked: &'a Occupancy) -> Self {
        Self {
            blocked,
            bounds: None,
            max_detour: DEFAULT_MAX_DETOUR,
            allow_blocked_target: false,
        }
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: GridBounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn with_max_detour(mut self, max_detour: u32) -> Self {
        self.max_detour = max_detour;
        self
    }

    #[must_use]
    pub fn allow_blocked_target(mut self, allow: bool) -> Self {
        self.allow_blocked_target = allow;
        self
    }

    pub fn max_detour(&self) -> u32 {
        self.max_detour
    }

    fn in_bounds(&self, cell: CubeCoord) -> bool {
        self.bounds.is_none_or(|b| b.contains(cell))
    }

    /// Shortest legal path from `start` to `target`, excluding `start`.
    ///
    /// Returns an empty path when `start == target` or when no route exists;
    /// callers treat an empty result as "no move possible".
    pub fn build(&self, start: CubeCoord, target: CubeCoord) -> MovementPath {
        if start == target || !self.in_bounds(target) {
            return MovementPath::new();
        }
        if !self.allow_blocked_target && self.blocked.contains(&target) {
            return MovementPath::new();
        }

        let limit = start.distance(target) + self.max_detour;
        let mut came_from: HashMap<CubeCoord, CubeCoord> = HashMap::new();
        let mut frontier = VecDeque::from([start]);

        while let Some(current) = frontier.pop_front() {
            for next in current.neighbors() {
                if next == start || came_from.contains_key(&next) {
                    continue;
                }
                if next.distance(start) > limit || !self.in_bounds(next) {
                    continue;
                }
                if next == target {
                    came_from.insert(next, current);
                    return reconstruct(&came_from, start, target);
                }
                if self.blocked.contains(&next) {
                    continue;
                }
                came_from.insert(next, current);
                frontier.push_back(next);
            }
        }

        MovementPath::new()
    }
}

fn reconstruct(
    came_from: &HashMap<CubeCoord, CubeCoord>,
    start: CubeCoord,
    target: CubeCoord,
) -> MovementPath {
    let mut steps = vec![target];
    let mut cursor = target;
    while let Some(&prev) = came_from.get(&cursor) {
        if prev == start {
            break;
        }
        steps.push(prev);
        cursor = prev;
    }
    steps.reverse();
    MovementPath { steps }
}
