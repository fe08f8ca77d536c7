//! Whole-partition properties of the locator, checked over sampled positions.

use std::f32::consts::TAU;

use regir_core::math::{DeterministicRng, Vec3};
use regir_core::{
    build_grid, build_onion, locate, BuildError, CommonParameters, LayerGroupSpec, OnionGrowth,
    OnionPartition, Partition,
};

fn onions() -> Vec<OnionPartition> {
    let mut out = vec![
        build_onion(100.0, 64, &OnionGrowth::default()).unwrap(),
        build_onion(
            2000.0,
            16,
            &OnionGrowth {
                layer_groups: 8,
                ..Default::default()
            },
        )
        .unwrap(),
        build_onion(
            5.0,
            512,
            &OnionGrowth {
                layer_groups: 1,
                coverage_layers: 3,
                ..Default::default()
            },
        )
        .unwrap(),
    ];
    out.push(
        OnionPartition::from_groups(&[
            LayerGroupSpec {
                inner_radius: 0.0,
                outer_radius: 2.0,
                layer_count: 1,
                equatorial_cells: 4,
            },
            LayerGroupSpec {
                inner_radius: 2.0,
                outer_radius: 30.0,
                layer_count: 6,
                equatorial_cells: 20,
            },
        ])
        .unwrap(),
    );
    out
}

#[test]
fn every_position_maps_inside_the_partition() {
    let mut rng = DeterministicRng::new(0x5eed);
    let common = CommonParameters::default();

    for onion in onions() {
        let total = onion.total_cells();
        let reach = onion.outer_radius() * 1.5;
        let partition = Partition::Onion(onion);
        for _ in 0..20_000 {
            let p = rng.next_in_ball(reach);
            let cell = locate(&partition, p, &common).unwrap();
            assert!(cell < total, "{p:?} -> {cell} of {total}");
        }
    }

    let grid = Partition::Grid(build_grid(5, 3, 7).unwrap());
    for _ in 0..20_000 {
        let p = rng.next_in_ball(20.0);
        assert!(locate(&grid, p, &common).unwrap() < 105);
    }
}

#[test]
fn every_onion_cell_is_reachable() {
    let onion = build_onion(
        12.0,
        8,
        &OnionGrowth {
            layer_groups: 2,
            coverage_layers: 2,
            ..Default::default()
        },
    )
    .unwrap();
    let mut seen = vec![false; onion.total_cells() as usize];

    // Sweep the centre of every (sub-layer, ring, cell) explicitly.
    seen[0] = onion.locate(Vec3::ZERO, Vec3::ZERO) == 0;
    for group in onion.groups() {
        let rings = &onion.rings()[group.ring_offset as usize..][..group.ring_count as usize];
        for layer in 0..group.layer_count {
            let r = (group.sublayer_radius(layer) + group.sublayer_radius(layer + 1)) * 0.5;
            for (k, ring) in rings.iter().enumerate() {
                let elevation = k as f32 * group.equatorial_cell_angle;
                let elevation = elevation.min(std::f32::consts::FRAC_PI_2 - 1e-3);
                for sign in [1.0f32, -1.0] {
                    for c in 0..ring.cell_count {
                        let azimuth = (c as f32 + 0.5) * ring.cell_angle;
                        let p = regir_core::math::spherical_to_cartesian(r, azimuth, sign * elevation);
                        seen[onion.locate(p, Vec3::ZERO) as usize] = true;
                    }
                }
            }
        }
    }

    let missing: Vec<usize> = seen
        .iter()
        .enumerate()
        .filter(|(_, s)| !**s)
        .map(|(i, _)| i)
        .collect();
    assert!(missing.is_empty(), "unreachable cells: {missing:?}");
}

#[test]
fn distinct_groups_get_distinct_bases() {
    for onion in onions() {
        let groups = onion.groups();
        for (i, a) in groups.iter().enumerate() {
            for b in &groups[i + 1..] {
                let r1 = (a.inner_radius + a.outer_radius) * 0.5;
                let r2 = (b.inner_radius + b.outer_radius) * 0.5;
                let c1 = onion.locate(Vec3::new(0.0, r1, 0.0), Vec3::ZERO);
                let c2 = onion.locate(Vec3::new(0.0, r2, 0.0), Vec3::ZERO);
                assert!(c1 < b.layer_cell_offset);
                assert!(c2 >= b.layer_cell_offset);
                assert_ne!(a.layer_cell_offset, b.layer_cell_offset);
            }
        }
    }
}

#[test]
fn ring_cells_cover_the_full_circle() {
    for onion in onions() {
        for ring in onion.rings() {
            assert!((ring.cell_count as f32 * ring.cell_angle - TAU).abs() < 1e-4);
        }
    }
}

#[test]
fn sublayer_lookup_inverts_radius_progression() {
    for onion in onions() {
        for group in onion.groups() {
            if group.inner_radius == 0.0 {
                continue;
            }
            for i in 0..group.layer_count {
                assert_eq!(group.sublayer_index(group.sublayer_radius(i)), i);
            }
        }
    }
}

#[test]
fn identical_inputs_rebuild_identically() {
    let a = build_onion(777.0, 32, &OnionGrowth::default()).unwrap();
    let b = build_onion(777.0, 32, &OnionGrowth::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(build_grid(3, 4, 5).unwrap(), build_grid(3, 4, 5).unwrap());
}

#[test]
fn grid_scenario_from_origin() {
    let grid = Partition::Grid(build_grid(4, 4, 4).unwrap());
    let common = CommonParameters {
        cell_size: 1.0,
        ..CommonParameters::default()
    };
    assert_eq!(locate(&grid, Vec3::splat(0.1), &common), Some(0));
}

#[test]
fn nine_layer_groups_are_rejected() {
    let growth = OnionGrowth {
        layer_groups: 9,
        ..Default::default()
    };
    assert!(matches!(
        build_onion(100.0, 8, &growth),
        Err(BuildError::CapacityExceeded { .. })
    ));
}
