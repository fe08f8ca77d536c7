//! Uniform axis-aligned grid partition.

use crate::error::BuildError;
use crate::math::{IVec3, UVec3, Vec3};
use crate::params::GridParameters;

/// Fixed number of cells per axis, anchored at the ReGIR centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPartition {
    cells: UVec3,
}

impl GridPartition {
    /// Validate the cell counts and build the grid.
    pub fn build(cells_x: u32, cells_y: u32, cells_z: u32) -> Result<Self, BuildError> {
        if cells_x == 0 || cells_y == 0 || cells_z == 0 {
            return Err(BuildError::invalid(format!(
                "grid cell counts must be positive, got {cells_x}x{cells_y}x{cells_z}"
            )));
        }

        let total = cells_x as u64 * cells_y as u64 * cells_z as u64;
        if total > u32::MAX as u64 {
            return Err(BuildError::invalid(format!(
                "grid of {cells_x}x{cells_y}x{cells_z} cells is not addressable with 32-bit indices"
            )));
        }

        tracing::debug!(cells_x, cells_y, cells_z, total, "built ReGIR grid");
        Ok(Self {
            cells: UVec3::new(cells_x, cells_y, cells_z),
        })
    }

    pub fn cells(&self) -> UVec3 {
        self.cells
    }

    pub fn total_cells(&self) -> u32 {
        self.cells.x * self.cells.y * self.cells.z
    }

    /// Integer cell coordinates of a position, clamped into the grid.
    #[inline]
    pub fn cell_coords(&self, world_pos: Vec3, center: Vec3, cell_size: f32) -> UVec3 {
        // Float-to-int casts saturate and send NaN to 0, so every input lands somewhere.
        let raw = ((world_pos - center) / cell_size).floor();
        let coords = IVec3::new(raw.x as i32, raw.y as i32, raw.z as i32);
        let max = self.cells.as_ivec3() - IVec3::ONE;
        coords.clamp(IVec3::ZERO, max).as_uvec3()
    }

    /// Flat index of the cell containing `world_pos`; out-of-range positions saturate.
    #[inline]
    pub fn locate(&self, world_pos: Vec3, center: Vec3, cell_size: f32) -> u32 {
        let c = self.cell_coords(world_pos, center, cell_size);
        c.x + c.y * self.cells.x + c.z * self.cells.x * self.cells.y
    }

    /// Offset applied to a presampling position: up to half a cell per axis at full jitter.
    pub fn jitter_offset(&self, cell_size: f32, sampling_jitter: f32, rand: [f32; 3]) -> Vec3 {
        (Vec3::from_array(rand) - Vec3::splat(0.5)) * (cell_size * sampling_jitter)
    }

    pub fn parameters(&self) -> GridParameters {
        GridParameters {
            cells_x: self.cells.x,
            cells_y: self.cells.y,
            cells_z: self.cells.z,
            _pad: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_axes() {
        assert!(matches!(
            GridPartition::build(0, 4, 4),
            Err(BuildError::InvalidConfig(_))
        ));
        assert!(matches!(
            GridPartition::build(4, 4, 0),
            Err(BuildError::InvalidConfig(_))
        ));
        assert!(GridPartition::build(65536, 65536, 2).is_err());
    }

    #[test]
    fn locates_near_origin() {
        let grid = GridPartition::build(4, 4, 4).unwrap();
        assert_eq!(grid.locate(Vec3::splat(0.1), Vec3::ZERO, 1.0), 0);
    }

    #[test]
    fn flat_index_is_x_major() {
        let grid = GridPartition::build(4, 3, 2).unwrap();
        let idx = grid.locate(Vec3::new(2.5, 1.5, 1.5), Vec3::ZERO, 1.0);
        assert_eq!(idx, 2 + 4 + 4 * 3);
        assert_eq!(grid.total_cells(), 24);
    }

    #[test]
    fn respects_center_and_cell_size() {
        let grid = GridPartition::build(8, 8, 8).unwrap();
        let center = Vec3::new(-10.0, 0.0, 5.0);
        // (x, y, z) = (2, 1, 3) cells of size 2
        let idx = grid.locate(Vec3::new(-5.5, 3.0, 11.9), center, 2.0);
        assert_eq!(idx, 2 + 8 + 3 * 64);
    }

    #[test]
    fn out_of_range_positions_saturate() {
        let grid = GridPartition::build(4, 4, 4).unwrap();
        assert_eq!(grid.locate(Vec3::splat(-100.0), Vec3::ZERO, 1.0), 0);
        assert_eq!(grid.locate(Vec3::splat(1e30), Vec3::ZERO, 1.0), 63);
        assert_eq!(grid.locate(Vec3::new(f32::NAN, 0.5, 0.5), Vec3::ZERO, 1.0), 0);
        assert_eq!(grid.locate(Vec3::new(9.0, -9.0, 0.0), Vec3::ZERO, 1.0), 3);
    }

    #[test]
    fn jitter_is_centered_and_bounded() {
        let grid = GridPartition::build(4, 4, 4).unwrap();
        assert_eq!(grid.jitter_offset(2.0, 1.0, [0.5; 3]), Vec3::ZERO);
        let corner = grid.jitter_offset(2.0, 1.0, [0.0, 0.999, 0.0]);
        assert!(corner.abs().max_element() <= 1.0);
    }
}
