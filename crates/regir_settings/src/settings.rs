//! Settings management

use std::path::Path;

use regir_core::math::Vec3;
use regir_core::{
    BuildError, DynamicParameters, FallbackMode, OnionGrowth, PresamplingMode, ReGirMode,
    StaticParameters,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings rejected: {0}")]
    Invalid(#[from] BuildError),
}

/// ReGIR settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: ReGirMode,
    /// World-space radius the onion must cover.
    pub scene_radius: f32,
    pub lights_per_cell: u32,
    pub center: [f32; 3],
    pub cell_size: f32,
    pub sampling_jitter: f32,
    pub presampling: PresamplingMode,
    pub fallback: FallbackMode,
    pub build_samples: u32,
    pub ris_buffer_offset: u32,
    pub grid: GridSettings,
    pub onion: OnionGrowth,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    pub cells_x: u32,
    pub cells_y: u32,
    pub cells_z: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            cells_x: 16,
            cells_y: 16,
            cells_z: 16,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let statics = StaticParameters::default();
        let dynamic = DynamicParameters::default();
        Self {
            mode: statics.mode,
            scene_radius: statics.scene_radius,
            lights_per_cell: statics.lights_per_cell,
            center: dynamic.center.to_array(),
            cell_size: dynamic.cell_size,
            sampling_jitter: dynamic.sampling_jitter,
            presampling: dynamic.presampling_mode,
            fallback: dynamic.fallback_mode,
            build_samples: dynamic.build_samples,
            ris_buffer_offset: dynamic.ris_buffer_offset,
            grid: GridSettings::default(),
            onion: statics.onion,
        }
    }
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        tracing::debug!(path = %path.display(), mode = ?settings.mode, "loaded ReGIR settings");
        Ok(settings)
    }

    pub fn static_parameters(&self) -> StaticParameters {
        StaticParameters {
            mode: self.mode,
            grid_cells: [self.grid.cells_x, self.grid.cells_y, self.grid.cells_z],
            onion: self.onion,
            scene_radius: self.scene_radius,
            lights_per_cell: self.lights_per_cell,
        }
    }

    pub fn dynamic_parameters(&self) -> DynamicParameters {
        DynamicParameters {
            center: Vec3::from_array(self.center),
            cell_size: self.cell_size,
            sampling_jitter: self.sampling_jitter,
            presampling_mode: self.presampling,
            fallback_mode: self.fallback,
            build_samples: self.build_samples,
            ris_buffer_offset: self.ris_buffer_offset,
        }
    }

    /// Split into core parameters, checking the per-frame values up front.
    pub fn into_parameters(self) -> Result<(StaticParameters, DynamicParameters), SettingsError> {
        let dynamic = self.dynamic_parameters();
        dynamic.validate()?;
        Ok((self.static_parameters(), dynamic))
    }
}
