//! Footprint decomposition.
//!
//! Splits each bar's taker buy and sell volume evenly over every grid level
//! inside the bar's `[low, high]` range. Volume is assumed uniform across the
//! range, so the output is an estimate of where trading happened, not a
//! measurement.

use crate::grid::PriceGrid;
use crate::histogram::Histogram;
use profile_core::{Bar, Error, FootprintRecord, Result, Size, TimestampMs};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A bar too narrow to contain any grid level. Its volume is left out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegenerateBar {
    /// Bar timestamp.
    pub timestamp: TimestampMs,
    /// Bar low.
    pub low: f64,
    /// Bar high.
    pub high: f64,
}

/// Buy/sell totals at one grid level across all decomposed bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFootprint {
    /// Grid level price.
    pub price: f64,
    /// Total taker buy volume at the level.
    pub buy_volume: Size,
    /// Total taker sell volume at the level.
    pub sell_volume: Size,
}

impl LevelFootprint {
    /// Buy minus sell volume.
    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }
}

/// Footprint of a bar series.
#[derive(Debug, Clone, Default)]
pub struct Footprint {
    /// One record per (bar, spanned level), in bar order then price order.
    pub records: Vec<FootprintRecord>,
    /// Bars that spanned no level.
    pub skipped: Vec<DegenerateBar>,
    ladder: Vec<LevelFootprint>,
}

impl Footprint {
    /// Per-level buy/sell totals for every grid level, low to high.
    pub fn level_totals(&self) -> &[LevelFootprint] {
        &self.ladder
    }

    /// Total traded volume per level, for value-area resolution.
    pub fn volume_histogram(&self) -> Result<Histogram> {
        let (levels, values) = self
            .ladder
            .iter()
            .map(|l| (l.price, l.buy_volume + l.sell_volume))
            .unzip();
        Histogram::new(levels, values)
    }
}

/// Decomposer bound to the grid of one analysis window.
pub struct FootprintDecomposer<'a> {
    grid: &'a PriceGrid,
}

impl<'a> FootprintDecomposer<'a> {
    /// Create a decomposer over `grid`.
    pub fn new(grid: &'a PriceGrid) -> Self {
        Self { grid }
    }

    /// Footprint records of a single bar.
    ///
    /// Returns an empty vector when the bar spans no grid level. Fails when
    /// the bar does not report taker buy volume.
    pub fn decompose_bar(&self, bar: &Bar) -> Result<Vec<FootprintRecord>> {
        let (buy, sell) = taker_split(bar)?;
        let span = self.grid.span(bar.low, bar.high);
        if span.is_empty() {
            return Ok(Vec::new());
        }

        let level_count = span.len() as f64;
        let buy_volume = buy / level_count;
        let sell_volume = sell / level_count;

        Ok(self.grid.levels()[span]
            .iter()
            .map(|&price| FootprintRecord {
                timestamp: bar.timestamp,
                price,
                buy_volume,
                sell_volume,
            })
            .collect())
    }

    /// Decompose every bar of a series.
    pub fn decompose(&self, bars: &[Bar]) -> Result<Footprint> {
        let mut ladder: Vec<LevelFootprint> = self
            .grid
            .levels()
            .iter()
            .map(|&price| LevelFootprint {
                price,
                buy_volume: 0.0,
                sell_volume: 0.0,
            })
            .collect();
        let mut records = Vec::new();
        let mut skipped = Vec::new();

        for bar in bars {
            let bar_records = self.decompose_bar(bar)?;
            if bar_records.is_empty() {
                debug!(
                    timestamp = bar.timestamp,
                    low = bar.low,
                    high = bar.high,
                    "bar spans no grid level, volume skipped"
                );
                skipped.push(DegenerateBar {
                    timestamp: bar.timestamp,
                    low: bar.low,
                    high: bar.high,
                });
                continue;
            }

            let first = self.grid.span(bar.low, bar.high).start;
            for (offset, record) in bar_records.iter().enumerate() {
                let level = &mut ladder[first + offset];
                level.buy_volume += record.buy_volume;
                level.sell_volume += record.sell_volume;
            }
            records.extend(bar_records);
        }

        Ok(Footprint {
            records,
            skipped,
            ladder,
        })
    }
}

fn taker_split(bar: &Bar) -> Result<(f64, f64)> {
    match (bar.taker_buy_volume, bar.taker_sell_volume()) {
        (Some(buy), Some(sell)) => Ok((buy, sell)),
        _ => Err(Error::data(format!(
            "bar at {} has no taker buy volume",
            bar.timestamp
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridSpec;
    use approx::assert_abs_diff_eq;

    fn make_bar(ts: i64, low: f64, high: f64, volume: f64, buy: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: low,
            high,
            low,
            close: high,
            volume,
            taker_buy_volume: Some(buy),
        }
    }

    fn grid() -> PriceGrid {
        PriceGrid::build(100.0, 200.0, GridSpec::Tick(10.0)).unwrap()
    }

    #[test]
    fn test_even_split_across_levels() {
        let grid = grid();
        let decomposer = FootprintDecomposer::new(&grid);

        let records = decomposer.decompose_bar(&make_bar(0, 105.0, 142.0, 9.0, 6.0)).unwrap();

        // Levels 110, 120, 130, 140.
        let prices: Vec<f64> = records.iter().map(|r| r.price).collect();
        assert_eq!(prices, vec![110.0, 120.0, 130.0, 140.0]);
        assert_abs_diff_eq!(records[0].buy_volume, 1.5);
        assert_abs_diff_eq!(records[0].sell_volume, 0.75);
    }

    #[test]
    fn test_buy_sell_conserved_per_bar() {
        let grid = PriceGrid::build(0.0, 1.0, GridSpec::Tick(0.01)).unwrap();
        let decomposer = FootprintDecomposer::new(&grid);
        let bar = make_bar(0, 0.137, 0.871, 17.3, 9.1);

        let records = decomposer.decompose_bar(&bar).unwrap();

        let buy: f64 = records.iter().map(|r| r.buy_volume).sum();
        let sell: f64 = records.iter().map(|r| r.sell_volume).sum();
        assert_abs_diff_eq!(buy, 9.1, epsilon = 1e-9);
        assert_abs_diff_eq!(sell, 17.3 - 9.1, epsilon = 1e-9);
    }

    #[test]
    fn test_flat_bar_on_level_emits_one_record() {
        let grid = grid();
        let decomposer = FootprintDecomposer::new(&grid);

        let records = decomposer.decompose_bar(&make_bar(0, 120.0, 120.0, 4.0, 1.0)).unwrap();

        assert_eq!(records.len(), 1);
        assert_abs_diff_eq!(records[0].buy_volume, 1.0);
        assert_abs_diff_eq!(records[0].sell_volume, 3.0);
    }

    #[test]
    fn test_degenerate_bar_skipped() {
        let grid = grid();
        let decomposer = FootprintDecomposer::new(&grid);
        let bars = vec![
            make_bar(0, 121.0, 129.0, 5.0, 2.0),
            make_bar(60_000, 120.0, 130.0, 2.0, 1.0),
        ];

        let footprint = decomposer.decompose(&bars).unwrap();

        assert_eq!(footprint.skipped.len(), 1);
        assert_eq!(footprint.skipped[0].timestamp, 0);
        assert_eq!(footprint.records.len(), 2);
    }

    #[test]
    fn test_level_totals_and_histogram() {
        let grid = grid();
        let decomposer = FootprintDecomposer::new(&grid);
        let bars = vec![
            make_bar(0, 110.0, 120.0, 4.0, 4.0),
            make_bar(1, 120.0, 120.0, 3.0, 0.0),
        ];

        let footprint = decomposer.decompose(&bars).unwrap();

        let at_120 = &footprint.level_totals()[2];
        assert_eq!(at_120.price, 120.0);
        assert_abs_diff_eq!(at_120.buy_volume, 2.0);
        assert_abs_diff_eq!(at_120.sell_volume, 3.0);
        assert_abs_diff_eq!(at_120.delta(), -1.0);

        let hist = footprint.volume_histogram().unwrap();
        assert_eq!(hist.len(), grid.len());
        assert_abs_diff_eq!(hist.total(), 7.0);
        assert_eq!(hist.max_index(), Some(2));
    }

    #[test]
    fn test_missing_taker_volume_is_error() {
        let grid = grid();
        let decomposer = FootprintDecomposer::new(&grid);
        let mut bar = make_bar(0, 110.0, 120.0, 1.0, 0.5);
        bar.taker_buy_volume = None;

        assert!(matches!(decomposer.decompose_bar(&bar), Err(Error::Data(_))));
    }
}
