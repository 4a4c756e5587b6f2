//! Per-level activity histograms.
//!
//! A histogram is a dense array of non-negative activity indexed by grid
//! level, paired with the level prices. Volume profiles and TPO letter counts
//! both produce one, and the value-area resolver consumes either.

use crate::grid::PriceGrid;
use profile_core::{Bar, Error, Result};

/// Activity per price level.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    levels: Vec<f64>,
    values: Vec<f64>,
}

impl Histogram {
    /// Create a histogram from level prices and their activity.
    pub fn new(levels: Vec<f64>, values: Vec<f64>) -> Result<Self> {
        if levels.len() != values.len() {
            return Err(Error::data(format!(
                "histogram has {} levels but {} values",
                levels.len(),
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(Error::data(format!(
                "histogram activity must be finite and non-negative, got {bad}"
            )));
        }
        Ok(Self { levels, values })
    }

    /// Create a histogram with zero activity at every level.
    pub fn zeros(levels: Vec<f64>) -> Self {
        let values = vec![0.0; levels.len()];
        Self { levels, values }
    }

    /// Add activity to a level.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn add(&mut self, index: usize, amount: f64) {
        self.values[index] += amount;
    }

    /// Level prices.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Activity per level.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no levels.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Total activity.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Index of the level with the most activity, first occurrence on ties.
    pub fn max_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.values.iter().enumerate() {
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((i, v));
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Close-price volume histogram over a whole bar series.
///
/// Each bar adds its full volume to the bin holding its close, so the profile
/// shape is an approximation from closes rather than intrabar coverage. Bins
/// are right-open; closes at or above the top edge land in the last bin.
pub fn accumulate_closes(bars: &[Bar], grid: &PriceGrid) -> Result<Histogram> {
    if grid.bin_count() == 0 {
        return Err(Error::invalid_range("grid needs at least two edges to form a bin"));
    }

    let lower_edges = grid.levels()[..grid.bin_count()].to_vec();
    let mut histogram = Histogram::zeros(lower_edges);

    for bar in bars {
        histogram.add(grid.bin_index(bar.close), bar.volume);
    }

    Ok(histogram)
}
