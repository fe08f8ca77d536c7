//! Profiler for timing named build phases

use std::time::{Duration, Instant};

/// Accumulated wall time per phase, kept in first-seen order.
pub struct BuildProfiler {
    timings: Vec<(String, Duration)>,
}

impl BuildProfiler {
    pub fn new() -> Self {
        Self {
            timings: Vec::new(),
        }
    }

    pub fn time_phase<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        match self.timings.iter_mut().find(|(n, _)| n == name) {
            Some((_, total)) => *total += elapsed,
            None => self.timings.push((name.to_string(), elapsed)),
        }
        result
    }

    pub fn get_timing(&self, name: &str) -> Duration {
        self.timings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| *d)
            .unwrap_or(Duration::ZERO)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Duration)> {
        self.timings.iter().map(|(n, d)| (n.as_str(), *d))
    }
}

impl Default for BuildProfiler {
    fn default() -> Self {
        Self::new()
    }
}
