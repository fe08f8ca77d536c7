//! Azimuthal rings of the onion.

use std::f32::consts::TAU;

use crate::params::OnionRing;

impl OnionRing {
    /// Ring of `cell_count` equal-angle cells starting at `cell_offset` within a sub-layer.
    pub fn new(cell_count: u32, cell_offset: u32) -> Self {
        let inv_cell_angle = cell_count as f32 / TAU;
        Self {
            cell_angle: 1.0 / inv_cell_angle,
            inv_cell_angle,
            cell_offset,
            cell_count,
        }
    }

    /// Cell index for an azimuth in `(0, 2*pi]`.
    ///
    /// The clamp folds a full turn, and any rounding overshoot, into the last cell.
    #[inline]
    pub fn locate_cell(&self, azimuth: f32) -> u32 {
        let bucket = (azimuth * self.inv_cell_angle).floor() as u32;
        self.cell_offset + bucket.min(self.cell_count - 1)
    }
}
