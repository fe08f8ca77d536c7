//! ReGIR context: owns the active partition and its parameters.
//!
//! Lookups load an `Arc` snapshot of the installed partition without taking
//! a lock. A rebuild constructs the complete replacement first and publishes
//! it with a single store only when it succeeded, so readers never see a
//! partially built structure and a failed rebuild keeps the previous one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::error::BuildError;
use crate::math::Vec3;
use crate::params::{CommonParameters, FallbackMode, ParameterBlock, PresamplingMode};
use crate::partition::grid::GridPartition;
use crate::partition::onion::{OnionGrowth, OnionPartition};
use crate::partition::{Partition, ReGirMode};

/// Parameters that change the partition's shape; changing them needs a rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticParameters {
    pub mode: ReGirMode,
    pub grid_cells: [u32; 3],
    pub onion: OnionGrowth,
    /// World-space radius the onion must cover.
    pub scene_radius: f32,
    pub lights_per_cell: u32,
}

impl Default for StaticParameters {
    fn default() -> Self {
        Self {
            mode: ReGirMode::default(),
            grid_cells: [16, 16, 16],
            onion: OnionGrowth::default(),
            scene_radius: 100.0,
            lights_per_cell: 512,
        }
    }
}

impl StaticParameters {
    pub fn build_partition(&self) -> Result<Partition, BuildError> {
        if self.lights_per_cell == 0 {
            return Err(BuildError::invalid("lights per cell must be positive"));
        }
        let partition = match self.mode {
            ReGirMode::Disabled => Partition::Disabled,
            ReGirMode::Grid => {
                let [x, y, z] = self.grid_cells;
                Partition::Grid(GridPartition::build(x, y, z)?)
            }
            ReGirMode::Onion => Partition::Onion(OnionPartition::build(
                self.scene_radius,
                self.lights_per_cell,
                &self.onion,
            )?),
        };

        let slots = partition.ris_slot_count(self.lights_per_cell);
        if slots > u32::MAX as u64 {
            return Err(BuildError::capacity("RIS slots", slots, u32::MAX as u64));
        }
        Ok(partition)
    }
}

/// Per-frame parameters; they never change the partition's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicParameters {
    pub center: Vec3,
    /// Grid cell edge length in world units.
    pub cell_size: f32,
    /// Fraction of a cell presampling positions are jittered by, in `[0, 1)`.
    pub sampling_jitter: f32,
    pub presampling_mode: PresamplingMode,
    pub fallback_mode: FallbackMode,
    pub build_samples: u32,
    /// First RIS buffer entry owned by ReGIR.
    pub ris_buffer_offset: u32,
}

impl Default for DynamicParameters {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            cell_size: 1.0,
            sampling_jitter: 0.5,
            presampling_mode: PresamplingMode::default(),
            fallback_mode: FallbackMode::default(),
            build_samples: 8,
            ris_buffer_offset: 0,
        }
    }
}

impl DynamicParameters {
    pub fn validate(&self) -> Result<(), BuildError> {
        if !self.center.is_finite() {
            return Err(BuildError::invalid(format!("center must be finite, got {}", self.center)));
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(BuildError::invalid(format!(
                "cell size must be positive, got {}",
                self.cell_size
            )));
        }
        if !(0.0..1.0).contains(&self.sampling_jitter) {
            return Err(BuildError::invalid(format!(
                "sampling jitter must be in [0, 1), got {}",
                self.sampling_jitter
            )));
        }
        if self.build_samples == 0 {
            return Err(BuildError::invalid("build sample count must be positive"));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Installed {
    static_params: StaticParameters,
    partition: Arc<Partition>,
}

#[derive(Debug)]
pub struct ReGirContext {
    installed: ArcSwap<Installed>,
    dynamic: ArcSwap<DynamicParameters>,
}

impl ReGirContext {
    pub fn new(
        static_params: StaticParameters,
        dynamic: DynamicParameters,
    ) -> Result<Self, BuildError> {
        dynamic.validate()?;
        let partition = static_params.build_partition()?;
        tracing::info!(
            mode = ?partition.mode(),
            cells = partition.total_cells(),
            "ReGIR context created"
        );
        Ok(Self {
            installed: ArcSwap::from_pointee(Installed {
                static_params,
                partition: Arc::new(partition),
            }),
            dynamic: ArcSwap::from_pointee(dynamic),
        })
    }

    /// Rebuild with new static parameters, swapping the result in on success.
    pub fn rebuild(&self, static_params: StaticParameters) -> Result<(), BuildError> {
        let partition = match static_params.build_partition() {
            Ok(partition) => partition,
            Err(err) => {
                tracing::warn!(%err, "ReGIR rebuild rejected, keeping previous partition");
                return Err(err);
            }
        };

        let cells = partition.total_cells();
        let mode = partition.mode();
        let previous = self.installed.swap(Arc::new(Installed {
            static_params,
            partition: Arc::new(partition),
        }));
        tracing::info!(
            ?mode,
            old_cells = previous.partition.total_cells(),
            cells,
            "ReGIR partition rebuilt"
        );
        Ok(())
    }

    pub fn set_dynamic_parameters(&self, dynamic: DynamicParameters) -> Result<(), BuildError> {
        dynamic.validate()?;
        self.dynamic.store(Arc::new(dynamic));
        Ok(())
    }

    pub fn dynamic_parameters(&self) -> DynamicParameters {
        **self.dynamic.load()
    }

    pub fn static_parameters(&self) -> StaticParameters {
        self.installed.load().static_params
    }

    /// Snapshot of the installed partition; stays valid across rebuilds.
    pub fn partition(&self) -> Arc<Partition> {
        Arc::clone(&self.installed.load().partition)
    }

    fn snapshot(&self) -> (StaticParameters, Arc<Partition>) {
        let installed = self.installed.load();
        (installed.static_params, Arc::clone(&installed.partition))
    }

    fn common_for(&self, lights_per_cell: u32) -> CommonParameters {
        let dynamic = self.dynamic_parameters();
        let mut common = CommonParameters {
            local_light_sampling_fallback_mode: dynamic.fallback_mode.id(),
            ris_buffer_offset: dynamic.ris_buffer_offset,
            lights_per_cell,
            cell_size: dynamic.cell_size,
            sampling_jitter: dynamic.sampling_jitter,
            local_light_presampling_mode: dynamic.presampling_mode.id(),
            num_regir_build_samples: dynamic.build_samples,
            ..Default::default()
        };
        common.set_center(dynamic.center);
        common
    }

    pub fn common_parameters(&self) -> CommonParameters {
        self.common_for(self.static_parameters().lights_per_cell)
    }

    /// The full binary block for the sampling stage.
    pub fn parameter_block(&self) -> ParameterBlock {
        let (static_params, partition) = self.snapshot();
        ParameterBlock {
            common: self.common_for(static_params.lights_per_cell),
            grid: partition.grid_parameters(),
            onion: partition.onion_parameters(),
        }
    }

    pub fn locate(&self, world_pos: Vec3) -> Option<u32> {
        let (static_params, partition) = self.snapshot();
        partition.locate(world_pos, &self.common_for(static_params.lights_per_cell))
    }

    /// RIS buffer entries ReGIR needs after `ris_buffer_offset`.
    pub fn ris_slot_count(&self) -> u64 {
        let (static_params, partition) = self.snapshot();
        partition.ris_slot_count(static_params.lights_per_cell)
    }
}
