//! Per-cell sample counts for judging how evenly a partition spreads space

use crate::OccupancySummary;

pub struct CellHistogram {
    counts: Vec<u64>,
    /// Samples that landed outside `0..cells`; a correct locator keeps this at 0.
    out_of_range: u64,
}

impl CellHistogram {
    pub fn new(cells: u32) -> Self {
        Self {
            counts: vec![0; cells as usize],
            out_of_range: 0,
        }
    }

    pub fn record(&mut self, cell: u32) {
        match self.counts.get_mut(cell as usize) {
            Some(count) => *count += 1,
            None => self.out_of_range += 1,
        }
    }

    pub fn count(&self, cell: u32) -> u64 {
        self.counts.get(cell as usize).copied().unwrap_or(0)
    }

    pub fn out_of_range(&self) -> u64 {
        self.out_of_range
    }

    pub fn summary(&self) -> OccupancySummary {
        if self.counts.is_empty() {
            return OccupancySummary::default();
        }

        let samples: u64 = self.counts.iter().sum();
        let mean = samples as f64 / self.counts.len() as f64;
        let variance = self
            .counts
            .iter()
            .map(|&c| {
                let d = c as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / self.counts.len() as f64;

        OccupancySummary {
            samples,
            cells: self.counts.len(),
            empty_cells: self.counts.iter().filter(|&&c| c == 0).count(),
            min: self.counts.iter().copied().min().unwrap_or(0),
            max: self.counts.iter().copied().max().unwrap_or(0),
            mean,
            coefficient_of_variation: if mean > 0.0 { variance.sqrt() / mean } else { 0.0 },
        }
    }
}
