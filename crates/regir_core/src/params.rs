//! Fixed-layout parameter records shared with the sampling stage.
//!
//! Every record is `#[repr(C)]` with 4-byte fields and explicit padding so it
//! can be copied byte-for-byte into a constant buffer. Field order and sizes
//! are part of the contract; consumers never see dynamically sized data.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::math::Vec3;

pub const ONION_MAX_LAYER_GROUPS: usize = 8;
pub const ONION_MAX_RINGS: usize = 52;

/// One concentric shell of the onion, subdivided into sub-layers, rings and cells.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct OnionLayerGroup {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub inv_log_layer_scale: f32,
    pub layer_count: u32,

    pub inv_equatorial_cell_angle: f32,
    pub cells_per_layer: u32,
    pub ring_offset: u32,
    pub ring_count: u32,

    pub equatorial_cell_angle: f32,
    pub layer_scale: f32,
    pub layer_cell_offset: u32,
    pub _pad: u32,
}

/// One band of constant elevation, split into equal-angle azimuthal cells.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct OnionRing {
    pub cell_angle: f32,
    pub inv_cell_angle: f32,
    pub cell_offset: u32,
    pub cell_count: u32,
}

/// How the presampling pass picks local lights for each cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresamplingMode {
    Uniform,
    /// Resample by light power.
    #[default]
    PowerRis,
}

/// Light selection used when a cell has no usable candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackMode {
    #[default]
    Uniform,
    PowerRis,
}

impl PresamplingMode {
    pub const fn id(self) -> u32 {
        match self {
            Self::Uniform => 0,
            Self::PowerRis => 1,
        }
    }
}

impl FallbackMode {
    pub const fn id(self) -> u32 {
        match self {
            Self::Uniform => 0,
            Self::PowerRis => 1,
        }
    }
}

/// Runtime configuration shared by both partition shapes and the presampling pass.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct CommonParameters {
    pub local_light_sampling_fallback_mode: u32,
    pub center_x: f32,
    pub center_y: f32,
    pub center_z: f32,

    pub ris_buffer_offset: u32,
    pub lights_per_cell: u32,
    pub cell_size: f32,
    pub sampling_jitter: f32,

    pub local_light_presampling_mode: u32,
    /// Candidate lights drawn per RIS slot during presampling.
    pub num_regir_build_samples: u32,
    pub _pad0: u32,
    pub _pad1: u32,
}

impl CommonParameters {
    pub fn center(&self) -> Vec3 {
        Vec3::new(self.center_x, self.center_y, self.center_z)
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.center_x = center.x;
        self.center_y = center.y;
        self.center_z = center.z;
    }

    /// Range of RIS buffer slots owned by `cell`.
    pub fn ris_slice(&self, cell: u32) -> std::ops::Range<u64> {
        let start = self.ris_buffer_offset as u64 + cell as u64 * self.lights_per_cell as u64;
        start..start + self.lights_per_cell as u64
    }
}

impl Default for CommonParameters {
    fn default() -> Self {
        Self {
            local_light_sampling_fallback_mode: FallbackMode::default().id(),
            center_x: 0.0,
            center_y: 0.0,
            center_z: 0.0,
            ris_buffer_offset: 0,
            lights_per_cell: 512,
            cell_size: 1.0,
            sampling_jitter: 0.5,
            local_light_presampling_mode: PresamplingMode::default().id(),
            num_regir_build_samples: 8,
            _pad0: 0,
            _pad1: 0,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct GridParameters {
    pub cells_x: u32,
    pub cells_y: u32,
    pub cells_z: u32,
    pub _pad: u32,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OnionParameters {
    pub layers: [OnionLayerGroup; ONION_MAX_LAYER_GROUPS],
    pub rings: [OnionRing; ONION_MAX_RINGS],

    pub num_layer_groups: u32,
    pub cubic_root_factor: f32,
    pub linear_factor: f32,
    pub _pad: f32,
}

impl Default for OnionParameters {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Everything the sampling stage reads, in upload order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParameterBlock {
    pub common: CommonParameters,
    pub grid: GridParameters,
    pub onion: OnionParameters,
}

impl ParameterBlock {
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}
