//! TPO (time price opportunity) profile.
//!
//! Bars are resampled into fixed periods and every grid level inside a
//! period's `[low, high]` is marked for that period. Coverage is stored as a
//! level-by-period matrix; letters are only rendered for display. A period's
//! letter is the first letter of its weekday name, so periods on the same
//! weekday share a letter.

use crate::grid::PriceGrid;
use crate::histogram::Histogram;
use chrono::{Datelike, Weekday};
use profile_core::{ts_to_datetime, Bar, Error, Result, TimestampMs};
use profile_ingestion::resample;

/// Default TPO period length.
pub const DEFAULT_TPO_PERIOD_MS: i64 = 30 * 60_000;

/// Aggregated range of one TPO period.
#[derive(Debug, Clone, PartialEq)]
pub struct TpoPeriod {
    /// Period start (ms).
    pub start: TimestampMs,
    /// Lowest low in the period.
    pub low: f64,
    /// Highest high in the period.
    pub high: f64,
    /// Last close in the period.
    pub close: f64,
    /// Display letter.
    pub letter: char,
}

fn weekday_letter(day: Weekday) -> char {
    match day {
        Weekday::Mon => 'M',
        Weekday::Tue | Weekday::Thu => 'T',
        Weekday::Wed => 'W',
        Weekday::Fri => 'F',
        Weekday::Sat | Weekday::Sun => 'S',
    }
}

/// Level-by-period coverage matrix.
#[derive(Debug, Clone)]
pub struct TpoProfile {
    levels: Vec<f64>,
    periods: Vec<TpoPeriod>,
    // Level-major: cell (level, period) at `level * periods.len() + period`.
    marks: Vec<bool>,
}

impl TpoProfile {
    /// Build a profile over `grid` from bars resampled into `period_ms` periods.
    pub fn build(bars: &[Bar], grid: &PriceGrid, period_ms: i64) -> Result<Self> {
        let resampled = resample(bars, period_ms)?;

        let periods = resampled
            .iter()
            .map(|p| {
                let start = ts_to_datetime(p.timestamp).ok_or_else(|| {
                    Error::data(format!("period start {} is out of range", p.timestamp))
                })?;
                Ok(TpoPeriod {
                    start: p.timestamp,
                    low: p.low,
                    high: p.high,
                    close: p.close,
                    letter: weekday_letter(start.weekday()),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let width = periods.len();
        let mut marks = vec![false; grid.len() * width];
        for (col, period) in periods.iter().enumerate() {
            for row in grid.span(period.low, period.high) {
                marks[row * width + col] = true;
            }
        }

        Ok(Self {
            levels: grid.levels().to_vec(),
            periods,
            marks,
        })
    }

    /// Level prices.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// Periods in time order.
    pub fn periods(&self) -> &[TpoPeriod] {
        &self.periods
    }

    /// Whether `period` traded through `level`.
    pub fn is_marked(&self, level: usize, period: usize) -> bool {
        self.marks[level * self.periods.len() + period]
    }

    fn row(&self, level: usize) -> &[bool] {
        let width = self.periods.len();
        &self.marks[level * width..(level + 1) * width]
    }

    /// Number of periods marking a level.
    pub fn count_at(&self, level: usize) -> usize {
        self.row(level).iter().filter(|&&m| m).count()
    }

    /// Letters marking a level, in period order.
    pub fn letters_at(&self, level: usize) -> String {
        self.row(level)
            .iter()
            .zip(&self.periods)
            .filter(|(marked, _)| **marked)
            .map(|(_, p)| p.letter)
            .collect()
    }

    /// Total marks across the profile.
    pub fn total_marks(&self) -> usize {
        self.marks.iter().filter(|&&m| m).count()
    }

    /// Per-level mark counts, as the activity histogram of the profile.
    pub fn counts(&self) -> Histogram {
        let mut histogram = Histogram::zeros(self.levels.clone());
        for level in 0..self.levels.len() {
            histogram.add(level, self.count_at(level) as f64);
        }
        histogram
    }
}
