//! ReGIR Runtime
//!
//! Builds the configured partition, reports its layout and writes the
//! parameter block the sampling stage uploads.
//!
//! ```text
//! regir [settings.json] [--probe x,y,z]... [--survey N] [--dump out.bin] [--print-defaults]
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use regir_core::math::{DeterministicRng, Vec3};
use regir_core::{Partition, ReGirContext};
use regir_metrics::{time_phase, BuildProfiler, CellHistogram};
use regir_settings::Settings;

/// ReGIR - spatial light-cell partition builder
#[derive(Parser, Debug)]
#[command(name = "regir", version, about)]
struct Args {
    /// Settings file (JSON). Built-in defaults when omitted.
    settings: Option<PathBuf>,

    /// World position to resolve to a cell, as x,y,z. Repeatable.
    #[arg(long = "probe", value_name = "X,Y,Z", value_parser = parse_vec3, allow_hyphen_values = true)]
    probes: Vec<Vec3>,

    /// Scatter this many random positions and report cell occupancy
    #[arg(long, value_name = "N")]
    survey: Option<usize>,

    /// Write the binary parameter block to this path
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    /// Print the default settings as JSON
    #[arg(long)]
    print_defaults: bool,
}

fn parse_vec3(text: &str) -> Result<Vec3, String> {
    let parts = text
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| format!("invalid position '{text}': {err}"))?;
    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("position '{text}' needs three components")),
    }
}

fn log_layout(partition: &Partition) {
    match partition {
        Partition::Disabled => tracing::info!("ReGIR disabled, nothing to build"),
        Partition::Grid(grid) => {
            let cells = grid.cells();
            tracing::info!(x = cells.x, y = cells.y, z = cells.z, total = grid.total_cells(), "grid layout");
        }
        Partition::Onion(onion) => {
            tracing::info!(
                central_radius = onion.central_radius(),
                outer_radius = onion.outer_radius(),
                rings = onion.num_rings(),
                total = onion.total_cells(),
                "onion layout"
            );
            for (index, group) in onion.groups().iter().enumerate() {
                tracing::info!(
                    group = index,
                    inner = group.inner_radius,
                    outer = group.outer_radius,
                    layers = group.layer_count,
                    rings = group.ring_count,
                    cells_per_layer = group.cells_per_layer,
                    first_cell = group.layer_cell_offset,
                    "layer group"
                );
            }
        }
    }
}

/// Scatter positions over the covered volume and report how evenly cells fill.
fn survey(context: &ReGirContext, samples: usize, profiler: &mut BuildProfiler) {
    let partition = context.partition();
    let common = context.common_parameters();
    let reach = match partition.as_ref() {
        Partition::Disabled => return,
        Partition::Grid(grid) => grid.cells().max_element() as f32 * common.cell_size,
        Partition::Onion(onion) => onion.outer_radius(),
    };

    let mut rng = DeterministicRng::new(0x7e61_2024);
    let positions: Vec<Vec3> = (0..samples)
        .map(|_| common.center() + rng.next_in_ball(reach))
        .collect();
    let cells = time_phase!(profiler, "survey", { partition.locate_batch(&positions, &common) });

    let mut histogram = CellHistogram::new(partition.total_cells());
    for cell in cells {
        histogram.record(cell);
    }
    let summary = histogram.summary();
    tracing::info!(
        samples = summary.samples,
        empty = summary.empty_cells,
        min = summary.min,
        max = summary.max,
        mean = summary.mean,
        cv = summary.coefficient_of_variation,
        "cell occupancy"
    );
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    tracing::info!("ReGIR v{}", regir_core::VERSION);

    let settings = match &args.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if args.print_defaults {
        println!("{}", Settings::default().to_json_string()?);
    }

    let mut profiler = BuildProfiler::new();
    let (static_params, dynamic_params) = settings.into_parameters()?;
    let context = time_phase!(profiler, "build", {
        ReGirContext::new(static_params, dynamic_params)
    })
    .context("building ReGIR partition")?;

    let partition = context.partition();
    log_layout(&partition);
    tracing::info!(slots = context.ris_slot_count(), "RIS buffer entries");

    for probe in &args.probes {
        match context.locate(*probe) {
            Some(cell) => {
                let slice = context.common_parameters().ris_slice(cell);
                tracing::info!(position = %probe, cell, ris_start = slice.start, ris_end = slice.end, "probe");
            }
            None => tracing::info!(position = %probe, "probe skipped, ReGIR disabled"),
        }
    }

    if let Some(samples) = args.survey {
        survey(&context, samples, &mut profiler);
    }

    if let Some(path) = &args.dump {
        let block = context.parameter_block();
        std::fs::write(path, block.as_bytes())
            .with_context(|| format!("writing parameter block to {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = block.as_bytes().len(), "parameter block written");
    }

    for (phase, elapsed) in profiler.iter() {
        tracing::debug!(phase, ?elapsed, "timing");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("regir").chain(list.iter().copied()))
    }

    #[test]
    fn parses_full_command_line() {
        let parsed = args(&[
            "scene.json", "--probe", "1,2,3", "--probe", "-4,0,0.5", "--survey", "500", "--dump", "out.bin",
        ])
        .unwrap();
        assert_eq!(parsed.settings, Some(PathBuf::from("scene.json")));
        assert_eq!(parsed.probes, vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(-4.0, 0.0, 0.5)]);
        assert_eq!(parsed.survey, Some(500));
        assert_eq!(parsed.dump, Some(PathBuf::from("out.bin")));
        assert!(!parsed.print_defaults);
    }

    #[test]
    fn rejects_malformed_arguments() {
        assert!(args(&["--probe", "1,2"]).is_err());
        assert!(args(&["--probe"]).is_err());
        assert!(args(&["--survey", "lots"]).is_err());
        assert!(args(&["--verbose"]).is_err());
        assert!(args(&["a.json", "b.json"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
