//! ReGIR Metrics - build timing and cell occupancy
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use regir_metrics::{BuildProfiler, CellHistogram};
//!
//! let mut profiler = BuildProfiler::new();
//! let partition = profiler.time_phase("build", || build());
//!
//! let mut histogram = CellHistogram::new(partition.total_cells());
//! for cell in cells { histogram.record(cell); }
//! println!("empty cells: {}", histogram.summary().empty_cells);
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod histogram;
#[cfg(feature = "metrics")]
mod profiler;

#[cfg(feature = "metrics")]
pub use histogram::CellHistogram;
#[cfg(feature = "metrics")]
pub use profiler::BuildProfiler;

/// Occupancy statistics over all cells of a partition.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OccupancySummary {
    pub samples: u64,
    pub cells: usize,
    pub empty_cells: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    /// Standard deviation divided by the mean; 0 for a perfectly even spread.
    pub coefficient_of_variation: f64,
}

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a build phase (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $name:expr, $body:block) => {
        $profiler.time_phase($name, || $body)
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct BuildProfiler;

#[cfg(not(feature = "metrics"))]
impl BuildProfiler {
    pub fn new() -> Self { Self }
    pub fn time_phase<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn get_timing(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn reset(&mut self) {}
    pub fn iter(&self) -> impl Iterator<Item = (&str, std::time::Duration)> { std::iter::empty() }
}

#[cfg(not(feature = "metrics"))]
pub struct CellHistogram;

#[cfg(not(feature = "metrics"))]
impl CellHistogram {
    pub fn new(_cells: u32) -> Self { Self }
    pub fn record(&mut self, _cell: u32) {}
    pub fn count(&self, _cell: u32) -> u64 { 0 }
    pub fn out_of_range(&self) -> u64 { 0 }
    pub fn summary(&self) -> OccupancySummary { OccupancySummary::default() }
}
