//! Price-level grid construction.
//!
//! A grid is an ordered, strictly increasing sequence of prices built for one
//! analysis window. Tick grids step by a fixed price increment and are padded
//! by one step so the window high is always covered. Bin grids place `N`
//! evenly spaced edges exactly on `[low, high]`, giving `N - 1` bins.

use profile_core::{series_range, Bar, Error, Result};
use std::ops::Range;

/// Relative slack when deciding whether `(high - low) / tick` is integral.
const RATIO_EPSILON: f64 = 1e-9;

/// Grid spacing specification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridSpec {
    /// Fixed price step between levels.
    Tick(f64),
    /// Number of evenly spaced edges.
    Bins(usize),
}

/// Ordered price levels for one analysis window.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceGrid {
    levels: Vec<f64>,
    spec: GridSpec,
}

impl PriceGrid {
    /// Build a grid over `[low, high]`.
    pub fn build(low: f64, high: f64, spec: GridSpec) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(Error::invalid_range(format!(
                "bounds must be finite, got [{low}, {high}]"
            )));
        }
        if high < low {
            return Err(Error::invalid_range(format!("high {high} is below low {low}")));
        }

        let levels = match spec {
            GridSpec::Tick(tick) => tick_levels(low, high, tick)?,
            GridSpec::Bins(count) => bin_edges(low, high, count)?,
        };

        Ok(Self { levels, spec })
    }

    /// Build a grid spanning the lowest low and highest high of a series.
    pub fn from_bars(bars: &[Bar], spec: GridSpec) -> Result<Self> {
        let (low, high) = series_range(bars)
            .ok_or_else(|| Error::invalid_range("cannot build a grid over an empty series"))?;
        Self::build(low, high, spec)
    }

    /// Grid prices in increasing order.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Spacing specification the grid was built with.
    pub fn spec(&self) -> GridSpec {
        self.spec
    }

    /// Number of levels (edges, for a bin grid).
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the grid holds no levels. Never true for a built grid.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Number of bins between consecutive levels.
    pub fn bin_count(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Index of the right-open bin `[edge[i], edge[i + 1])` containing `price`.
    ///
    /// Prices below the first edge clamp to bin 0 and prices at or above the
    /// last edge clamp to the top bin, so every price lands somewhere.
    pub fn bin_index(&self, price: f64) -> usize {
        let at_or_below = self.levels.partition_point(|&edge| edge <= price);
        at_or_below
            .saturating_sub(1)
            .min(self.bin_count().saturating_sub(1))
    }

    /// Indices of the levels inside the inclusive price interval `[low, high]`.
    pub fn span(&self, low: f64, high: f64) -> Range<usize> {
        let start = self.levels.partition_point(|&level| level < low);
        let end = self.levels.partition_point(|&level| level <= high);
        start..end.max(start)
    }
}

fn tick_levels(low: f64, high: f64, tick: f64) -> Result<Vec<f64>> {
    if !tick.is_finite() || tick <= 0.0 {
        return Err(Error::invalid_range(format!("tick size must be positive, got {tick}")));
    }

    let ratio = (high - low) / tick;
    let rounded = ratio.round();
    let mut steps = if (ratio - rounded).abs() <= RATIO_EPSILON * rounded.max(1.0) {
        rounded
    } else {
        ratio.ceil()
    };
    // Snapping may leave the top level a rounding error below `high`.
    if low + steps * tick < high {
        steps += 1.0;
    }

    if steps > u32::MAX as f64 {
        return Err(Error::invalid_range(format!(
            "tick size {tick} yields too many levels over [{low}, {high}]"
        )));
    }

    // Multiplying from `low` instead of accumulating keeps levels exact
    // whenever `low` and `tick` are.
    Ok((0..=steps as usize).map(|i| low + i as f64 * tick).collect())
}

fn bin_edges(low: f64, high: f64, count: usize) -> Result<Vec<f64>> {
    if count < 2 {
        return Err(Error::invalid_range(format!(
            "bin grid needs at least 2 edges, got {count}"
        )));
    }
    if high == low {
        return Err(Error::invalid_range(format!(
            "bin grid over the single price {low} has no width"
        )));
    }

    let step = (high - low) / (count - 1) as f64;
    let mut edges: Vec<f64> = (0..count).map(|i| low + i as f64 * step).collect();
    edges[count - 1] = high;
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_tick_grid_pads_high() {
        let grid = PriceGrid::build(100.0, 125.0, GridSpec::Tick(10.0)).unwrap();
        assert_eq!(grid.levels(), &[100.0, 110.0, 120.0, 130.0]);
    }

    #[test]
    fn test_tick_grid_exact_multiple() {
        // Same as numpy arange(100, 130 + 10, 10).
        let grid = PriceGrid::build(100.0, 130.0, GridSpec::Tick(10.0)).unwrap();
        assert_eq!(grid.levels(), &[100.0, 110.0, 120.0, 130.0]);
    }

    #[test]
    fn test_tick_grid_properties() {
        let cases = [
            (0.1, 0.75, 0.05),
            (42_000.5, 42_310.0, 0.5),
            (1.0, 1.0, 0.25),
            (19.88, 33.38, 0.5),
        ];
        for (low, high, tick) in cases {
            let grid = PriceGrid::build(low, high, GridSpec::Tick(tick)).unwrap();
            let levels = grid.levels();

            assert_eq!(levels[0], low);
            assert!(levels.windows(2).all(|w| w[0] < w[1]));
            assert!(levels.iter().all(|&l| l >= low && l < high + tick));
            // The last level is the first one at or above `high`.
            assert!(*levels.last().unwrap() >= high);
            if levels.len() > 1 {
                assert!(levels[levels.len() - 2] < high);
            }
        }
    }

    #[test]
    fn test_bin_grid_is_linspace() {
        let grid = PriceGrid::build(0.0, 10.0, GridSpec::Bins(5)).unwrap();
        assert_eq!(grid.levels(), &[0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(grid.bin_count(), 4);
    }

    #[test]
    fn test_bin_grid_last_edge_exact() {
        let grid = PriceGrid::build(0.1, 0.7, GridSpec::Bins(7)).unwrap();
        assert_eq!(*grid.levels().last().unwrap(), 0.7);
        assert_relative_eq!(grid.levels()[3], 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_bin_index_right_open_and_clamped() {
        let grid = PriceGrid::build(0.0, 10.0, GridSpec::Bins(5)).unwrap();
        assert_eq!(grid.bin_index(0.0), 0);
        assert_eq!(grid.bin_index(2.4), 0);
        assert_eq!(grid.bin_index(2.5), 1);
        assert_eq!(grid.bin_index(9.9), 3);
        // At or above the top edge clamps into the last bin.
        assert_eq!(grid.bin_index(10.0), 3);
        assert_eq!(grid.bin_index(12.0), 3);
        assert_eq!(grid.bin_index(-1.0), 0);
    }

    #[test]
    fn test_span_inclusive() {
        let grid = PriceGrid::build(100.0, 150.0, GridSpec::Tick(10.0)).unwrap();
        assert_eq!(grid.span(110.0, 130.0), 1..4);
        assert_eq!(grid.span(111.0, 119.0), 2..2);
        assert_eq!(grid.span(120.0, 120.0), 2..3);
    }

    #[test]
    fn test_tick_grid_covers_series_high() {
        // (33.38 - 19.88) / 0.5 snaps to 27, but 19.88 + 27 * 0.5 < 33.38.
        let grid = PriceGrid::build(19.88, 33.38, GridSpec::Tick(0.5)).unwrap();

        assert_eq!(grid.len(), 29);
        // The series high sits below the top level, not above it.
        assert_eq!(grid.span(33.38, 40.0), 28..29);
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(matches!(
            PriceGrid::build(10.0, 5.0, GridSpec::Tick(1.0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PriceGrid::build(0.0, 5.0, GridSpec::Tick(0.0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PriceGrid::build(0.0, 5.0, GridSpec::Tick(-1.0)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PriceGrid::build(0.0, 5.0, GridSpec::Bins(1)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PriceGrid::build(5.0, 5.0, GridSpec::Bins(10)),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(
            PriceGrid::build(f64::NAN, 5.0, GridSpec::Tick(1.0)),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_from_bars_empty() {
        assert!(matches!(
            PriceGrid::from_bars(&[], GridSpec::Bins(10)),
            Err(Error::InvalidRange(_))
        ));
    }
}
