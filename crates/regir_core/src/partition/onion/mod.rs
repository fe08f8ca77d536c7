//! Onion partition: nested concentric shells around the ReGIR centre.
//!
//! Cells near the centre are small and grow with distance, so the solid angle
//! a cell subtends from the centre stays roughly constant. Groups and rings
//! live in the fixed-size [`OnionParameters`] record and reference each other
//! only through offsets, so the record can be handed to the sampling stage as is.

mod builder;
mod layer_group;
mod ring;

pub use builder::{LayerGroupSpec, OnionGrowth};

use crate::math::Vec3;
use crate::params::{OnionLayerGroup, OnionParameters, OnionRing};

#[derive(Debug, Clone, PartialEq)]
pub struct OnionPartition {
    params: OnionParameters,
    num_rings: u32,
    total_cells: u32,
}

impl OnionPartition {
    /// The built layer groups, innermost first.
    pub fn groups(&self) -> &[OnionLayerGroup] {
        &self.params.layers[..self.params.num_layer_groups as usize]
    }

    /// The ring arena shared by all groups.
    pub fn rings(&self) -> &[OnionRing] {
        &self.params.rings[..self.num_rings as usize]
    }

    pub fn num_layer_groups(&self) -> u32 {
        self.params.num_layer_groups
    }

    pub fn num_rings(&self) -> u32 {
        self.num_rings
    }

    pub fn total_cells(&self) -> u32 {
        self.total_cells
    }

    /// Radius of the central cell; zero when the first shell starts at the centre.
    pub fn central_radius(&self) -> f32 {
        self.params.layers[0].inner_radius
    }

    pub fn outer_radius(&self) -> f32 {
        self.groups()[self.groups().len() - 1].outer_radius
    }

    pub fn parameters(&self) -> &OnionParameters {
        &self.params
    }

    /// Layer group owning distance `r`, or `None` inside the central cell.
    ///
    /// Groups own `(inner, outer]`; distances past the last group saturate into it.
    #[inline]
    pub fn group_index(&self, r: f32) -> Option<usize> {
        let groups = self.groups();
        if r <= groups[0].inner_radius {
            return None;
        }
        Some(
            groups
                .iter()
                .position(|g| r <= g.outer_radius)
                .unwrap_or(groups.len() - 1),
        )
    }

    /// Flat cell index of `world_pos`. Never fails: out-of-range and
    /// non-finite positions resolve to a valid cell.
    #[inline]
    pub fn locate(&self, world_pos: Vec3, center: Vec3) -> u32 {
        let rel = world_pos - center;
        let r = rel.length();
        match self.group_index(r) {
            Some(index) => self.params.layers[index].locate(rel, r, &self.params.rings),
            // Central cell, or the first cell of a shell that starts at the centre.
            None => 0,
        }
    }

    /// Approximate radius of the cell at distance `distance` from the centre.
    pub fn jitter_radius(&self, distance: f32) -> f32 {
        let groups = self.groups();
        if distance < groups[groups.len() - 1].inner_radius {
            self.params.cubic_root_factor * distance.cbrt()
        } else {
            self.params.linear_factor * distance
        }
    }

    /// Offset applied to a presampling position, scaled by the local cell radius.
    pub fn jitter_offset(
        &self,
        world_pos: Vec3,
        center: Vec3,
        sampling_jitter: f32,
        rand: [f32; 3],
    ) -> Vec3 {
        let radius = self.jitter_radius(world_pos.distance(center));
        (Vec3::from_array(rand) * 2.0 - Vec3::ONE) * (sampling_jitter * radius)
    }
}
