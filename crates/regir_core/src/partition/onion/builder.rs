//! Onion construction.
//!
//! Groups are validated and laid out first; nothing is written into the
//! fixed-size record until the whole configuration is known to fit.

use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use super::layer_group::build_rings;
use super::OnionPartition;
use crate::error::BuildError;
use crate::params::{OnionLayerGroup, OnionParameters, ONION_MAX_LAYER_GROUPS, ONION_MAX_RINGS};

/// One explicitly described shell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerGroupSpec {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub layer_count: u32,
    /// Cells in the equatorial ring. Must be a positive multiple of 4.
    pub equatorial_cells: u32,
}

/// Tunables for the automatic onion builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnionGrowth {
    /// Number of layer groups. Every group but the last is a single detail sub-layer.
    pub layer_groups: u32,
    /// Minimum sub-layer count of the outermost group.
    pub coverage_layers: u32,
    /// Equatorial cells of the innermost group.
    pub base_partitions: u32,
    /// Extra equatorial cells per group outward.
    pub partition_step: u32,
    /// Radius of the central cell, in world units.
    pub central_radius: f32,
}

impl Default for OnionGrowth {
    fn default() -> Self {
        Self {
            layer_groups: 5,
            coverage_layers: 10,
            base_partitions: 8,
            partition_step: 4,
            central_radius: 1.0,
        }
    }
}

impl OnionGrowth {
    /// Derive explicit group specs reaching at least `scene_radius`.
    pub fn group_specs(&self, scene_radius: f32) -> Result<Vec<LayerGroupSpec>, BuildError> {
        if !(scene_radius.is_finite() && scene_radius > 0.0) {
            return Err(BuildError::invalid(format!(
                "scene radius must be positive and finite, got {scene_radius}"
            )));
        }
        check_group_count(self.layer_groups as usize)?;
        if self.coverage_layers == 0 {
            return Err(BuildError::invalid("coverage layer count must be positive"));
        }
        if self.base_partitions == 0 || self.base_partitions % 4 != 0 || self.partition_step % 4 != 0 {
            return Err(BuildError::invalid(format!(
                "partitions must be positive multiples of 4 (base {}, step {})",
                self.base_partitions, self.partition_step
            )));
        }
        if !(self.central_radius.is_finite() && self.central_radius > 0.0) {
            return Err(BuildError::degenerate(format!(
                "central radius must be positive and finite, got {}",
                self.central_radius
            )));
        }

        // The outermost group is the widest; bounding it bounds every group.
        let widest = (self.layer_groups - 1)
            .checked_mul(self.partition_step)
            .and_then(|step| step.checked_add(self.base_partitions))
            .ok_or_else(|| {
                BuildError::invalid(format!(
                    "equatorial cells overflow over {} groups (base {}, step {})",
                    self.layer_groups, self.base_partitions, self.partition_step
                ))
            })?;
        let widest_rings = (widest / 4 + 1) as u64;
        if widest_rings > ONION_MAX_RINGS as u64 {
            return Err(BuildError::capacity("rings", widest_rings, ONION_MAX_RINGS as u64));
        }

        let mut specs = Vec::with_capacity(self.layer_groups as usize);
        let mut inner_radius = self.central_radius;
        for group_index in 0..self.layer_groups {
            let partitions = self.base_partitions + group_index * self.partition_step;
            // Radial thickness of a sub-layer matches the width of an equatorial cell.
            let layer_scale = (partitions as f32 + PI) / (partitions as f32 - PI);

            let layer_count = if group_index + 1 < self.layer_groups {
                1
            } else {
                let needed = if scene_radius > inner_radius {
                    ((scene_radius / inner_radius).ln() / layer_scale.ln()).ceil() as u32
                } else {
                    1
                };
                needed.max(self.coverage_layers)
            };

            let outer_radius = inner_radius * layer_scale.powi(layer_count as i32);
            specs.push(LayerGroupSpec {
                inner_radius,
                outer_radius,
                layer_count,
                equatorial_cells: partitions,
            });
            inner_radius = outer_radius;
        }

        Ok(specs)
    }
}

fn check_group_count(count: usize) -> Result<(), BuildError> {
    if count == 0 {
        return Err(BuildError::invalid("an onion needs at least one layer group"));
    }
    if count > ONION_MAX_LAYER_GROUPS {
        return Err(BuildError::capacity(
            "layer groups",
            count as u64,
            ONION_MAX_LAYER_GROUPS as u64,
        ));
    }
    Ok(())
}

fn check_spec(index: usize, spec: &LayerGroupSpec, prev_outer: Option<f32>) -> Result<(), BuildError> {
    if spec.layer_count == 0 {
        return Err(BuildError::invalid(format!("group {index}: layer count must be positive")));
    }
    if spec.equatorial_cells == 0 || spec.equatorial_cells % 4 != 0 {
        return Err(BuildError::invalid(format!(
            "group {index}: equatorial cells must be a positive multiple of 4, got {}",
            spec.equatorial_cells
        )));
    }
    if !(spec.inner_radius.is_finite() && spec.outer_radius.is_finite()) || spec.inner_radius < 0.0 {
        return Err(BuildError::degenerate(format!(
            "group {index}: radii must be finite and non-negative ({} .. {})",
            spec.inner_radius, spec.outer_radius
        )));
    }
    if spec.outer_radius <= spec.inner_radius {
        return Err(BuildError::degenerate(format!(
            "group {index}: zero-span shell ({} .. {})",
            spec.inner_radius, spec.outer_radius
        )));
    }
    match prev_outer {
        Some(prev) if prev != spec.inner_radius => {
            return Err(BuildError::degenerate(format!(
                "group {index}: inner radius {} does not meet previous outer radius {prev}",
                spec.inner_radius
            )));
        }
        None if spec.inner_radius == 0.0 && spec.layer_count != 1 => {
            return Err(BuildError::degenerate(format!(
                "group {index}: a shell starting at the centre cannot have {} logarithmic sub-layers",
                spec.layer_count
            )));
        }
        _ => {}
    }
    Ok(())
}

impl OnionPartition {
    /// Build from explicit, contiguous groups ordered by radius.
    pub fn from_groups(specs: &[LayerGroupSpec]) -> Result<Self, BuildError> {
        Self::from_groups_with_budget(specs, 1)
    }

    /// Automatic builder: detail groups around the centre, coverage out to `scene_radius`.
    pub fn build(
        scene_radius: f32,
        target_lights_per_cell: u32,
        growth: &OnionGrowth,
    ) -> Result<Self, BuildError> {
        if target_lights_per_cell == 0 {
            return Err(BuildError::invalid("lights per cell must be positive"));
        }
        let specs = growth.group_specs(scene_radius)?;
        let onion = Self::from_groups_with_budget(&specs, target_lights_per_cell)?;
        tracing::info!(
            scene_radius,
            groups = onion.num_layer_groups(),
            rings = onion.num_rings(),
            cells = onion.total_cells(),
            "built ReGIR onion"
        );
        Ok(onion)
    }

    /// Shared path of both builders. `lights_per_cell` bounds the RIS slot count.
    fn from_groups_with_budget(specs: &[LayerGroupSpec], lights_per_cell: u32) -> Result<Self, BuildError> {
        check_group_count(specs.len())?;

        let mut prev_outer = None;
        let mut total_rings = 0usize;
        for (index, spec) in specs.iter().enumerate() {
            check_spec(index, spec, prev_outer)?;
            prev_outer = Some(spec.outer_radius);
            total_rings += (spec.equatorial_cells / 4 + 1) as usize;
        }
        if total_rings > ONION_MAX_RINGS {
            return Err(BuildError::capacity("rings", total_rings as u64, ONION_MAX_RINGS as u64));
        }

        let mut params = OnionParameters::default();
        let mut num_rings = 0usize;
        // Cell 0 is the central ball when the first shell leaves one.
        let mut total_cells: u64 = if specs[0].inner_radius > 0.0 { 1 } else { 0 };

        for (index, spec) in specs.iter().enumerate() {
            let (rings, cells_per_layer) = build_rings(spec.equatorial_cells);

            let (layer_scale, inv_log_layer_scale) = if spec.inner_radius > 0.0 {
                let scale = (spec.outer_radius / spec.inner_radius).powf(1.0 / spec.layer_count as f32);
                (scale, 1.0 / scale.ln())
            } else {
                (1.0, 0.0)
            };
            let equatorial_cell_angle = TAU / spec.equatorial_cells as f32;

            let group = OnionLayerGroup {
                inner_radius: spec.inner_radius,
                outer_radius: spec.outer_radius,
                inv_log_layer_scale,
                layer_count: spec.layer_count,
                inv_equatorial_cell_angle: 1.0 / equatorial_cell_angle,
                cells_per_layer,
                ring_offset: num_rings as u32,
                ring_count: rings.len() as u32,
                equatorial_cell_angle,
                layer_scale,
                layer_cell_offset: total_cells as u32,
                _pad: 0,
            };

            tracing::debug!(
                group = index,
                inner = spec.inner_radius,
                outer = spec.outer_radius,
                layers = spec.layer_count,
                rings = rings.len(),
                cells_per_layer,
                "onion layer group"
            );

            params.rings[num_rings..num_rings + rings.len()].copy_from_slice(&rings);
            params.layers[index] = group;
            num_rings += rings.len();

            total_cells += spec.layer_count as u64 * cells_per_layer as u64;
            let slots = total_cells.saturating_mul(lights_per_cell as u64);
            if slots > u32::MAX as u64 {
                return Err(BuildError::capacity("RIS slots", slots, u32::MAX as u64));
            }
        }

        params.num_layer_groups = specs.len() as u32;
        let (cubic_root_factor, linear_factor) = jitter_curve(&params, specs.len());
        params.cubic_root_factor = cubic_root_factor;
        params.linear_factor = linear_factor;

        Ok(Self {
            params,
            num_rings: num_rings as u32,
            total_cells: total_cells as u32,
        })
    }
}

/// Fit the jitter radius curve: `cubic * cbrt(d)` through the detail groups,
/// `linear * d` through the outermost one. Each factor is the median of its samples.
fn jitter_curve(params: &OnionParameters, num_groups: usize) -> (f32, f32) {
    let mut cubic_root_factors = Vec::new();
    let mut linear_factors = Vec::new();

    for (index, group) in params.layers[..num_groups].iter().enumerate() {
        let start = group.ring_offset as usize;
        let rings = &params.rings[start..start + group.ring_count as usize];
        for (middle, cell_radius) in group.max_cell_radii(rings) {
            if index + 1 < num_groups {
                cubic_root_factors.push(cell_radius / middle.cbrt());
            } else {
                linear_factors.push(cell_radius / middle);
            }
        }
    }

    (median(&mut cubic_root_factors), median(&mut linear_factors))
}

fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(f32::total_cmp);
    values[values.len() / 2]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(inner: f32, outer: f32, layer_count: u32, equatorial_cells: u32) -> LayerGroupSpec {
        LayerGroupSpec {
            inner_radius: inner,
            outer_radius: outer,
            layer_count,
            equatorial_cells,
        }
    }

    #[test]
    fn default_growth_reaches_scene_radius() {
        let onion = OnionPartition::build(500.0, 512, &OnionGrowth::default()).unwrap();
        let last = onion.groups().last().unwrap();
        assert_eq!(onion.num_layer_groups(), 5);
        assert!(last.outer_radius >= 500.0 * 0.999);
        assert!(last.layer_count >= 10);
        assert_eq!(onion.groups()[0].inner_radius, 1.0);
    }

    #[test]
    fn eight_default_groups_use_the_whole_ring_budget() {
        let growth = OnionGrowth {
            layer_groups: 8,
            ..Default::default()
        };
        let onion = OnionPartition::build(100.0, 16, &growth).unwrap();
        assert_eq!(onion.num_rings() as usize, ONION_MAX_RINGS);
    }

    #[test]
    fn nine_groups_exceed_capacity() {
        let growth = OnionGrowth {
            layer_groups: 9,
            ..Default::default()
        };
        assert!(matches!(
            OnionPartition::build(100.0, 16, &growth),
            Err(BuildError::CapacityExceeded { requested: 9, limit: 8, .. })
        ));

        let specs: Vec<LayerGroupSpec> = (0..9)
            .map(|i| spec(1.0 + i as f32, 2.0 + i as f32, 1, 4))
            .collect();
        assert!(matches!(
            OnionPartition::from_groups(&specs),
            Err(BuildError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn too_many_rings_exceed_capacity() {
        let growth = OnionGrowth {
            layer_groups: 8,
            base_partitions: 12,
            ..Default::default()
        };
        assert!(matches!(
            OnionPartition::build(100.0, 16, &growth),
            Err(BuildError::CapacityExceeded { what: "rings", .. })
        ));
    }

    #[test]
    fn ris_slot_budget_is_enforced() {
        let growth = OnionGrowth::default();
        assert!(matches!(
            OnionPartition::build(1e6, u32::MAX / 2, &growth),
            Err(BuildError::CapacityExceeded { what: "RIS slots", .. })
        ));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let growth = OnionGrowth::default();
        assert!(matches!(OnionPartition::build(0.0, 8, &growth), Err(BuildError::InvalidConfig(_))));
        assert!(matches!(OnionPartition::build(f32::NAN, 8, &growth), Err(BuildError::InvalidConfig(_))));
        assert!(matches!(OnionPartition::build(10.0, 0, &growth), Err(BuildError::InvalidConfig(_))));
        let odd = OnionGrowth { base_partitions: 6, ..growth };
        assert!(matches!(OnionPartition::build(10.0, 8, &odd), Err(BuildError::InvalidConfig(_))));
        let none = OnionGrowth { layer_groups: 0, ..growth };
        assert!(matches!(OnionPartition::build(10.0, 8, &none), Err(BuildError::InvalidConfig(_))));
        let flat = OnionGrowth { central_radius: 0.0, ..growth };
        assert!(matches!(OnionPartition::build(10.0, 8, &flat), Err(BuildError::DegenerateGeometry(_))));
    }

    #[test]
    fn oversized_partition_growth_is_an_error() {
        let wrapping = OnionGrowth {
            layer_groups: 3,
            partition_step: 0x8000_0000,
            ..Default::default()
        };
        assert!(matches!(
            OnionPartition::build(100.0, 8, &wrapping),
            Err(BuildError::InvalidConfig(_))
        ));

        let too_wide = OnionGrowth {
            layer_groups: 2,
            partition_step: 1 << 20,
            ..Default::default()
        };
        assert!(matches!(
            OnionPartition::build(100.0, 8, &too_wide),
            Err(BuildError::CapacityExceeded { what: "rings", .. })
        ));

        let huge_base = OnionGrowth {
            layer_groups: 1,
            base_partitions: u32::MAX - 3,
            ..Default::default()
        };
        assert!(matches!(
            OnionPartition::build(100.0, 8, &huge_base),
            Err(BuildError::CapacityExceeded { what: "rings", .. })
        ));
    }

    #[test]
    fn degenerate_groups_are_rejected() {
        let cases = [
            vec![spec(2.0, 2.0, 1, 8)],
            vec![spec(3.0, 2.0, 1, 8)],
            vec![spec(0.0, 10.0, 3, 8)],
            vec![spec(1.0, 2.0, 1, 8), spec(2.5, 4.0, 1, 8)],
            vec![spec(1.0, 2.0, 1, 8), spec(1.5, 4.0, 1, 8)],
            vec![spec(1.0, f32::INFINITY, 1, 8)],
        ];
        for specs in cases {
            assert!(
                matches!(OnionPartition::from_groups(&specs), Err(BuildError::DegenerateGeometry(_))),
                "{specs:?}"
            );
        }
        assert!(matches!(
            OnionPartition::from_groups(&[spec(1.0, 2.0, 0, 8)]),
            Err(BuildError::InvalidConfig(_))
        ));
        assert!(matches!(OnionPartition::from_groups(&[]), Err(BuildError::InvalidConfig(_))));
    }

    #[test]
    fn cell_offsets_are_contiguous() {
        let onion = OnionPartition::build(200.0, 64, &OnionGrowth::default()).unwrap();
        let mut expected = 1;
        for group in onion.groups() {
            assert_eq!(group.layer_cell_offset, expected);
            expected += group.total_cells();
        }
        assert_eq!(onion.total_cells(), expected);

        let mut ring_offset = 0;
        for group in onion.groups() {
            assert_eq!(group.ring_offset, ring_offset);
            ring_offset += group.ring_count;
        }
        assert_eq!(ring_offset, onion.num_rings());
    }

    #[test]
    fn jitter_curve_factors_are_fitted() {
        let onion = OnionPartition::build(200.0, 64, &OnionGrowth::default()).unwrap();
        let params = onion.parameters();
        assert!(params.cubic_root_factor > 0.0);
        assert!(params.linear_factor > 0.0);

        let single = OnionPartition::from_groups(&[spec(1.0, 50.0, 4, 8)]).unwrap();
        assert_eq!(single.parameters().cubic_root_factor, 0.0);
        assert!(single.parameters().linear_factor > 0.0);
    }

    #[test]
    fn rebuilding_is_bit_identical() {
        let growth = OnionGrowth {
            layer_groups: 7,
            ..Default::default()
        };
        let a = OnionPartition::build(321.0, 128, &growth).unwrap();
        let b = OnionPartition::build(321.0, 128, &growth).unwrap();
        assert_eq!(
            bytemuck::bytes_of(a.parameters()),
            bytemuck::bytes_of(b.parameters())
        );
    }

    #[test]
    fn median_picks_the_middle_sample() {
        assert_eq!(median(&mut []), 0.0);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
    }
}
