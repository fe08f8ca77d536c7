//! Spatial partitions and the point-to-cell locator.

pub mod grid;
pub mod onion;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::params::{CommonParameters, GridParameters, OnionParameters};
use grid::GridPartition;
use onion::OnionPartition;

/// Which partition shape is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReGirMode {
    /// ReGIR is off; nothing is built and no cell is ever located.
    Disabled,
    Grid,
    #[default]
    Onion,
}

impl ReGirMode {
    /// Numeric id understood by the sampling stage.
    pub const fn id(self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Grid => 1,
            Self::Onion => 2,
        }
    }
}

/// A built partition of whichever shape is active.
#[derive(Debug, Clone, PartialEq)]
pub enum Partition {
    Disabled,
    Grid(GridPartition),
    Onion(OnionPartition),
}

impl Partition {
    pub fn mode(&self) -> ReGirMode {
        match self {
            Self::Disabled => ReGirMode::Disabled,
            Self::Grid(_) => ReGirMode::Grid,
            Self::Onion(_) => ReGirMode::Onion,
        }
    }

    pub fn total_cells(&self) -> u32 {
        match self {
            Self::Disabled => 0,
            Self::Grid(grid) => grid.total_cells(),
            Self::Onion(onion) => onion.total_cells(),
        }
    }

    /// Number of RIS buffer entries the presampling pass writes.
    pub fn ris_slot_count(&self, lights_per_cell: u32) -> u64 {
        self.total_cells() as u64 * lights_per_cell as u64
    }

    /// Flat cell index for `world_pos`, or `None` when disabled.
    #[inline]
    pub fn locate(&self, world_pos: Vec3, common: &CommonParameters) -> Option<u32> {
        match self {
            Self::Disabled => None,
            Self::Grid(grid) => Some(grid.locate(world_pos, common.center(), common.cell_size)),
            Self::Onion(onion) => Some(onion.locate(world_pos, common.center())),
        }
    }

    /// Locate many positions in parallel; empty when disabled.
    pub fn locate_batch(&self, positions: &[Vec3], common: &CommonParameters) -> Vec<u32> {
        if matches!(self, Self::Disabled) {
            return Vec::new();
        }
        positions
            .par_iter()
            .map(|&p| self.locate(p, common).unwrap_or_default())
            .collect()
    }

    /// Presampling position for `world_pos`, jittered by up to about one cell.
    ///
    /// `rand` holds three uniforms in `[0, 1)`.
    pub fn jitter_position(&self, world_pos: Vec3, common: &CommonParameters, rand: [f32; 3]) -> Vec3 {
        let offset = match self {
            Self::Disabled => Vec3::ZERO,
            Self::Grid(grid) => grid.jitter_offset(common.cell_size, common.sampling_jitter, rand),
            Self::Onion(onion) => {
                onion.jitter_offset(world_pos, common.center(), common.sampling_jitter, rand)
            }
        };
        world_pos + offset
    }

    pub fn grid_parameters(&self) -> GridParameters {
        match self {
            Self::Grid(grid) => grid.parameters(),
            _ => GridParameters::default(),
        }
    }

    pub fn onion_parameters(&self) -> OnionParameters {
        match self {
            Self::Onion(onion) => *onion.parameters(),
            _ => OnionParameters::default(),
        }
    }
}
