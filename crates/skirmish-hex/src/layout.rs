//! Pixel projection for pointy-top hexes.

use glam::Vec2;

use crate::CubeCoord;

const SQRT_3: f32 = 1.732_050_8;

/// Maps cells to screen-space pixel centres and back.
///
/// `size` is the distance from a hex centre to any of its corners. Only the
/// stored `x` and `y` axes take part in the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexLayout {
    pub size: f32,
}

impl HexLayout {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    /// Centre of `cell` in pixels: `(s·√3·(x + y/2), s·1.5·y)`.
    #[must_use]
    pub fn to_pixel(&self, cell: CubeCoord) -> Vec2 {
        let x = cell.x as f32;
        let y = cell.y as f32;
        Vec2::new(self.size * SQRT_3 * (x + y / 2.0), self.size * 1.5 * y)
    }

    /// The cell containing the pixel `point`.
    #[must_use]
    pub fn from_pixel(&self, point: Vec2) -> CubeCoord {
        let y = point.y / (1.5 * self.size);
        let x = point.x / (SQRT_3 * self.size) - y / 2.0;
        cube_round(x, y, -x - y)
    }
}

/// Rounds fractional cube components to the nearest cell, fixing up the
/// component with the largest rounding error so the result stays on-plane.
fn cube_round(x: f32, y: f32, z: f32) -> CubeCoord {
    let (mut rx, mut ry, mut rz) = (x.round(), y.round(), z.round());
    let dx = (rx - x).abs();
    let dy = (ry - y).abs();
    let dz = (rz - z).abs();

    if dx > dy && dx > dz {
        rx = -ry - rz;
    } else if dy > dz {
        ry = -rx - rz;
    } else {
        rz = -rx - ry;
    }
    CubeCoord::new(rx as i32, ry as i32, rz as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cells_within;

    #[test]
    fn test_origin_projects_to_zero() {
        let layout = HexLayout::new(32.0);
        assert_eq!(layout.to_pixel(CubeCoord::ORIGIN), Vec2::ZERO);
    }

    #[test]
    fn test_projection_formula() {
        let layout = HexLayout::new(10.0);
        let p = layout.to_pixel(CubeCoord::new(1, 2, -3));
        assert!((p.x - 10.0 * SQRT_3 * 2.0).abs() < 1e-4);
        assert!((p.y - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_pixel_roundtrip() {
        let layout = HexLayout::new(24.0);
        for cell in cells_within(CubeCoord::new(3, -1, -2), 4) {
            assert_eq!(layout.from_pixel(layout.to_pixel(cell)), cell);
        }
    }

    #[test]
    fn test_from_pixel_near_centre_snaps_to_cell() {
        let layout = HexLayout::new(20.0);
        let cell = CubeCoord::new(-2, 1, 1);
        let nudged = layout.to_pixel(cell) + Vec2::new(4.0, -3.0);
        assert_eq!(layout.from_pixel(nudged), cell);
    }
}
