//! ReGIR Core
//!
//! Spatial partitions that bucket scene lights into world-space cells:
//! - Uniform grid
//! - Onion (concentric shells of rings of azimuthal cells)
//! - Point-to-cell lookup
//! - Fixed-layout parameter records shared with the sampling stage

pub mod context;
pub mod error;
pub mod math;
pub mod params;
pub mod partition;

pub use glam;

pub use context::{DynamicParameters, ReGirContext, StaticParameters};
pub use error::BuildError;
pub use params::{
    CommonParameters, FallbackMode, GridParameters, OnionLayerGroup, OnionParameters,
    OnionRing, ParameterBlock, PresamplingMode, ONION_MAX_LAYER_GROUPS, ONION_MAX_RINGS,
};
pub use partition::grid::GridPartition;
pub use partition::onion::{LayerGroupSpec, OnionGrowth, OnionPartition};
pub use partition::{Partition, ReGirMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a uniform grid partition.
pub fn build_grid(cells_x: u32, cells_y: u32, cells_z: u32) -> Result<GridPartition, BuildError> {
    GridPartition::build(cells_x, cells_y, cells_z)
}

/// Build an onion partition reaching at least `scene_radius` from the centre.
pub fn build_onion(
    scene_radius: f32,
    target_lights_per_cell: u32,
    growth: &OnionGrowth,
) -> Result<OnionPartition, BuildError> {
    OnionPartition::build(scene_radius, target_lights_per_cell, growth)
}

/// Map a world position to its flat cell index.
///
/// Returns `None` only when ReGIR is disabled.
pub fn locate(
    partition: &Partition,
    world_pos: math::Vec3,
    common: &CommonParameters,
) -> Option<u32> {
    partition.locate(world_pos, common)
}
