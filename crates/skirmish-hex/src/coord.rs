//! Cube coordinates on a pointy-top hex grid.
//!
//! A cell is an integer triple `(x, y, z)` constrained to the plane
//! `x + y + z = 0`. Distance is the largest axis delta, which equals the
//! number of single-cell steps between two cells.

use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CubeCoord
// ---------------------------------------------------------------------------

/// A single hex cell in cube coordinates.
///
/// Constructed values always satisfy `x + y + z == 0`. Code paths that build
/// a coordinate from trusted arithmetic assert this in debug builds; values
/// arriving from the wire are rejected during deserialization instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawCube")]
pub struct CubeCoord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// The six unit steps, starting east and turning counter-clockwise.
///
/// Path search explores neighbours in this order, which makes tie-breaks
/// between equal-length routes deterministic.
pub const DIRECTIONS: [CubeCoord; 6] = [
    CubeCoord { x: 1, y: 0, z: -1 },
    CubeCoord { x: 1, y: -1, z: 0 },
    CubeCoord { x: 0, y: -1, z: 1 },
    CubeCoord { x: -1, y: 0, z: 1 },
    CubeCoord { x: -1, y: 1, z: 0 },
    CubeCoord { x: 0, y: 1, z: -1 },
];

impl CubeCoord {
    /// The grid origin `(0, 0, 0)`.
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    /// Create a coordinate from all three components.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `x + y + z != 0`.
    #[must_use]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        debug_assert!(on_plane(x, y, z), "cube coordinate ({x},{y},{z}) is off the x+y+z=0 plane");
        Self { x, y, z }
    }

    /// Create a coordinate from the two stored axes, deriving `z`.
    #[must_use]
    pub fn from_axial(x: i32, y: i32) -> Self {
        Self { x, y, z: -x - y }
    }

    /// Number of hex steps between `self` and `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// Returns `true` if the two cells share an edge.
    #[must_use]
    pub fn is_adjacent(self, other: Self) -> bool {
        self.distance(other) == 1
    }

    /// The six cells sharing an edge with this one, in [`DIRECTIONS`] order.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        DIRECTIONS.map(|d| self + d)
    }

    /// Canonical `"x,y,z"` key used by occupancy sets on the wire.
    #[must_use]
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Returns `true` if the invariant `x + y + z == 0` holds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        on_plane(self.x, self.y, self.z)
    }
}

/// Plane check widened to `i64` so extreme wire values cannot wrap to zero.
fn on_plane(x: i32, y: i32, z: i32) -> bool {
    i64::from(x) + i64::from(y) + i64::from(z) == 0
}

impl Add for CubeCoord {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for CubeCoord {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl fmt::Display for CubeCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for CubeCoord {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let mut next = || -> Result<i32, CoordError> {
            let part = parts
                .next()
                .ok_or_else(|| CoordError::Malformed(s.to_string()))?;
            part.trim()
                .parse()
                .map_err(|_| CoordError::BadComponent(part.to_string()))
        };
        let (x, y, z) = (next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(CoordError::Malformed(s.to_string()));
        }
        RawCube { x, y, z }.try_into()
    }
}

/// Unvalidated wire shape of a [`CubeCoord`].
#[derive(Deserialize)]
struct RawCube {
    x: i32,
    y: i32,
    z: i32,
}

impl TryFrom<RawCube> for CubeCoord {
    type Error = CoordError;

    fn try_from(raw: RawCube) -> Result<Self, Self::Error> {
        let coord = CubeCoord {
            x: raw.x,
            y: raw.y,
            z: raw.z,
        };
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(CoordError::OffPlane {
                x: raw.x,
                y: raw.y,
                z: raw.z,
            })
        }
    }
}

/// Errors produced when reading coordinates from external input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordError {
    /// The key did not have exactly three comma-separated parts.
    #[error("malformed cell key {0:?}")]
    Malformed(String),
    /// One of the parts was not an integer.
    #[error("invalid coordinate component {0:?}")]
    BadComponent(String),
    /// The components do not sum to zero.
    #[error("cube coordinate ({x},{y},{z}) is off the x+y+z=0 plane")]
    OffPlane {
        /// X component.
        x: i32,
        /// Y component.
        y: i32,
        /// Z component.
        z: i32,
    },
}

// ---------------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------------

const MAX_PREALLOC_CELLS: u64 = 1 << 20;
const MAX_RADIUS: u32 = 1 << 30;

/// Every cell at distance `<= radius` from `center`, including `center`.
///
/// `radius` is clamped to 2^30 so the axial offsets stay in `i32`.
#[must_use]
pub fn cells_within(center: CubeCoord, radius: u32) -> Vec<CubeCoord> {
    let radius = radius.min(MAX_RADIUS);
    let r = i32::try_from(radius).unwrap_or(i32::MAX);
    let count = 3 * u64::from(radius) * (u64::from(radius) + 1) + 1;
    let capacity = usize::try_from(count.min(MAX_PREALLOC_CELLS)).unwrap_or(0);
    let mut cells = Vec::with_capacity(capacity);
    for dx in -r..=r {
        let lo = (-r).max(-dx - r);
        let hi = r.min(-dx + r);
        for dy in lo..=hi {
            cells.push(center + CubeCoord::from_axial(dx, dy));
        }
    }
    cells
}

// ---------------------------------------------------------------------------
// Occupancy
// ---------------------------------------------------------------------------

/// A set of cells that movement may not pass through (units, walls, closed
/// doors).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Occupancy {
    cells: HashSet<CubeCoord>,
}

impl Occupancy {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `"x,y,z"` keys as sent by the server.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoordError`] encountered.
    pub fn from_keys<I, S>(keys: I) -> Result<Self, CoordError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter()
            .map(|k| k.as_ref().parse::<CubeCoord>())
            .collect()
    }

    /// Marks a cell occupied. Returns `false` if it already was.
    pub fn insert(&mut self, cell: CubeCoord) -> bool {
        self.cells.insert(cell)
    }

    /// Frees a cell. Returns `false` if it was not occupied.
    pub fn remove(&mut self, cell: &CubeCoord) -> bool {
        self.cells.remove(cell)
    }

    pub fn contains(&self, cell: &CubeCoord) -> bool {
        self.cells.contains(cell)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CubeCoord> {
        self.cells.iter()
    }
}

impl FromIterator<CubeCoord> for Occupancy {
    fn from_iter<T: IntoIterator<Item = CubeCoord>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Extend<CubeCoord> for Occupancy {
    fn extend<T: IntoIterator<Item = CubeCoord>>(&mut self, iter: T) {
        self.cells.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_examples() {
        let origin = CubeCoord::ORIGIN;
        assert_eq!(origin.distance(origin), 0);
        assert_eq!(CubeCoord::new(1, -1, 0).distance(origin), 1);
        assert_eq!(CubeCoord::new(2, -1, -1).distance(origin), 2);
    }

    #[test]
    fn test_distance_is_symmetric_and_half_manhattan() {
        let a = CubeCoord::new(3, -5, 2);
        let b = CubeCoord::new(-1, 2, -1);
        assert_eq!(a.distance(b), b.distance(a));
        let manhattan = a.x.abs_diff(b.x) + a.y.abs_diff(b.y) + a.z.abs_diff(b.z);
        assert_eq!(a.distance(b), manhattan / 2);
    }

    #[test]
    fn test_neighbors_are_adjacent_and_valid() {
        let center = CubeCoord::new(2, -3, 1);
        let neighbors = center.neighbors();
        for n in neighbors {
            assert!(n.is_valid());
            assert!(center.is_adjacent(n));
        }
        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);
    }

    #[test]
    fn test_from_axial_derives_z() {
        let c = CubeCoord::from_axial(4, -7);
        assert_eq!(c, CubeCoord::new(4, -7, 3));
    }

    #[test]
    fn test_key_roundtrip() {
        let c = CubeCoord::new(-2, 5, -3);
        assert_eq!(c.key(), "-2,5,-3");
        assert_eq!(c.key().parse::<CubeCoord>().unwrap(), c);
    }

    #[test]
    fn test_bad_keys_rejected() {
        assert_eq!(
            "1,2".parse::<CubeCoord>(),
            Err(CoordError::Malformed("1,2".to_string()))
        );
        assert_eq!(
            "1,a,2".parse::<CubeCoord>(),
            Err(CoordError::BadComponent("a".to_string()))
        );
        assert_eq!(
            "1,1,1".parse::<CubeCoord>(),
            Err(CoordError::OffPlane { x: 1, y: 1, z: 1 })
        );
        assert!("1,-1,0,0".parse::<CubeCoord>().is_err());
    }

    #[test]
    fn test_deserialize_rejects_off_plane() {
        let ok: CubeCoord = serde_json::from_str(r#"{"x":1,"y":-1,"z":0}"#).unwrap();
        assert_eq!(ok, CubeCoord::new(1, -1, 0));
        let bad = serde_json::from_str::<CubeCoord>(r#"{"x":1,"y":1,"z":0}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_extreme_components_do_not_wrap_onto_plane() {
        assert_eq!(
            "2147483647,2147483647,2".parse::<CubeCoord>(),
            Err(CoordError::OffPlane {
                x: i32::MAX,
                y: i32::MAX,
                z: 2
            })
        );
        let err = serde_json::from_str::<CubeCoord>(r#"{"x":2147483647,"y":2147483647,"z":2}"#)
            .unwrap_err();
        assert!(err.to_string().contains("off the x+y+z=0 plane"), "{err}");

        let extreme = CubeCoord::new(i32::MAX, i32::MIN + 1, 0);
        assert!(extreme.is_valid());
    }

    #[test]
    fn test_cells_within_counts() {
        assert_eq!(cells_within(CubeCoord::ORIGIN, 0), vec![CubeCoord::ORIGIN]);
        assert_eq!(cells_within(CubeCoord::ORIGIN, 1).len(), 7);
        assert_eq!(cells_within(CubeCoord::ORIGIN, 3).len(), 37);

        let center = CubeCoord::new(5, -2, -3);
        for cell in cells_within(center, 2) {
            assert!(cell.is_valid());
            assert!(cell.distance(center) <= 2);
        }
    }

    #[test]
    fn test_occupancy_from_keys() {
        let occ = Occupancy::from_keys(["0,0,0", "1,-1,0"]).unwrap();
        assert_eq!(occ.len(), 2);
        assert!(occ.contains(&CubeCoord::new(1, -1, 0)));
        assert!(Occupancy::from_keys(["0,0"]).is_err());
    }
}
