//! Concentric shells of the onion.
//!
//! A layer group is split radially into sub-layers whose radii grow
//! geometrically, then by elevation into rings, then by azimuth into cells.
//! Ring 0 is the equatorial band. Every ring above it is mirrored below the
//! equator, so it contributes `2 * cell_count` cells to each sub-layer.

use std::f32::consts::TAU;

use crate::math::{self, Vec3};
use crate::params::{OnionLayerGroup, OnionRing};

/// Radii within this many ulps (per sub-layer of depth) below a boundary snap onto it,
/// so `sublayer_radius(i)` maps back to sub-layer `i` despite `powi`/`ln` rounding.
const SUBLAYER_SNAP_ULPS: f32 = 4.0;

/// Rings for a group with `equatorial_cells` cells at the equator.
///
/// `equatorial_cells` must be a positive multiple of 4; the last ring is a
/// single-cell polar cap. Returns the rings and the cell count of one sub-layer.
pub(crate) fn build_rings(equatorial_cells: u32) -> (Vec<OnionRing>, u32) {
    let equatorial_angle = TAU / equatorial_cells as f32;
    let ring_count = equatorial_cells / 4 + 1;

    let mut rings = Vec::with_capacity(ring_count as usize);
    rings.push(OnionRing::new(equatorial_cells, 0));

    let mut cells_per_layer = equatorial_cells;
    for ring_index in 1..ring_count {
        let elevation = ring_index as f32 * equatorial_angle;
        let cell_count = ((equatorial_cells as f32 * elevation.cos()).floor() as u32).max(1);
        rings.push(OnionRing::new(cell_count, cells_per_layer));
        cells_per_layer += cell_count * 2;
    }

    (rings, cells_per_layer)
}

impl OnionLayerGroup {
    /// Radius where sub-layer `index` begins.
    pub fn sublayer_radius(&self, index: u32) -> f32 {
        if index >= self.layer_count {
            return self.outer_radius;
        }
        self.inner_radius * self.layer_scale.powi(index as i32)
    }

    /// Sub-layer containing distance `r` from the centre, clamped into the group.
    #[inline]
    pub fn sublayer_index(&self, r: f32) -> u32 {
        if self.inner_radius <= 0.0 || r <= self.inner_radius {
            return 0;
        }
        let t = (r / self.inner_radius).ln() * self.inv_log_layer_scale;
        // A relative radius error of e moves t by e * inv_log_layer_scale.
        let snap = SUBLAYER_SNAP_ULPS * f32::EPSILON * (1.0 + t) * self.inv_log_layer_scale.max(1.0);
        ((t + snap).floor() as u32).min(self.layer_count - 1)
    }

    /// Ring index for an elevation, folded onto the northern hemisphere.
    #[inline]
    pub fn ring_index(&self, elevation: f32) -> u32 {
        let k = (elevation.abs() * self.inv_equatorial_cell_angle + 0.5).floor() as u32;
        k.min(self.ring_count - 1)
    }

    /// Flat cell index for a position relative to the centre.
    ///
    /// `rings` is the partition's ring arena; this group reads
    /// `rings[ring_offset..ring_offset + ring_count]`.
    #[inline]
    pub fn locate(&self, rel: Vec3, r: f32, rings: &[OnionRing]) -> u32 {
        if r <= 0.0 {
            return self.layer_cell_offset;
        }

        let layer = self.sublayer_index(r);
        let elevation = math::elevation(rel.z, r);
        let ring_index = self.ring_index(elevation);
        let ring = &rings[(self.ring_offset + ring_index) as usize];

        let mut cell = ring.locate_cell(math::azimuth(rel.x, rel.y));
        if elevation < 0.0 && ring_index > 0 {
            cell += ring.cell_count;
        }

        self.layer_cell_offset + layer * self.cells_per_layer + cell
    }

    pub fn total_cells(&self) -> u32 {
        self.layer_count * self.cells_per_layer
    }

    /// Largest distance from a cell's centre to its outer corner, per sub-layer.
    ///
    /// Feeds the jitter curve: the radius a presampling position may wander
    /// while staying representative of its cell.
    pub(crate) fn max_cell_radii<'a>(
        &'a self,
        rings: &'a [OnionRing],
    ) -> impl Iterator<Item = (f32, f32)> + 'a {
        (0..self.layer_count).map(move |layer| {
            let inner = self.sublayer_radius(layer);
            let outer = self.sublayer_radius(layer + 1);
            let middle = (inner + outer) * 0.5;

            let max_cell_radius = rings
                .iter()
                .enumerate()
                .map(|(ring_index, ring)| {
                    let mid_elevation = self.equatorial_cell_angle * ring_index as f32;
                    let corner_elevation = if ring_index == 0 {
                        self.equatorial_cell_angle * 0.5
                    } else {
                        mid_elevation - self.equatorial_cell_angle * 0.5
                    };
                    let mid = math::spherical_to_cartesian(middle, 0.0, mid_elevation);
                    let corner =
                        math::spherical_to_cartesian(outer, ring.cell_angle * 0.5, corner_elevation);
                    mid.distance(corner)
                })
                .fold(0.0f32, f32::max);

            (middle, max_cell_radius)
        })
    }
}
