//! Fixed-period bar resampling.
//!
//! Folds a bar series into coarser, epoch-aligned periods (e.g. 30-minute
//! TPO periods). Periods without any input bar are not emitted.

use profile_core::{ts_to_bucket, Bar, Error, Result, TimestampMs};
use std::collections::BTreeMap;

/// A period that's currently being built.
#[derive(Debug, Clone)]
struct PeriodInProgress {
    start: TimestampMs,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    taker_buy_volume: Option<f64>,
}

impl PeriodInProgress {
    fn new(start: TimestampMs, bar: &Bar) -> Self {
        Self {
            start,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            taker_buy_volume: bar.taker_buy_volume,
        }
    }

    fn add_bar(&mut self, bar: &Bar) {
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.close = bar.close;
        self.volume += bar.volume;
        // Buy volume is only known if every member bar reports it.
        self.taker_buy_volume = match (self.taker_buy_volume, bar.taker_buy_volume) {
            (Some(acc), Some(buy)) => Some(acc + buy),
            _ => None,
        };
    }

    fn to_bar(&self) -> Bar {
        Bar {
            timestamp: self.start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            taker_buy_volume: self.taker_buy_volume,
        }
    }
}

/// Resampler folding bars into fixed-length periods.
pub struct BarResampler {
    period_ms: i64,
    periods: BTreeMap<TimestampMs, PeriodInProgress>,
}

impl BarResampler {
    /// Create a new resampler for the given period length.
    pub fn new(period_ms: i64) -> Result<Self> {
        if period_ms <= 0 {
            return Err(Error::config(format!(
                "resample period must be positive, got {period_ms} ms"
            )));
        }
        Ok(Self {
            period_ms,
            periods: BTreeMap::new(),
        })
    }

    /// Add a bar. Bars must arrive in chronological order within a period
    /// for open/close to be meaningful.
    pub fn add_bar(&mut self, bar: &Bar) {
        let start = ts_to_bucket(bar.timestamp, self.period_ms);
        self.periods
            .entry(start)
            .and_modify(|p| p.add_bar(bar))
            .or_insert_with(|| PeriodInProgress::new(start, bar));
    }

    /// Add multiple bars.
    pub fn add_bars(&mut self, bars: &[Bar]) {
        for bar in bars {
            self.add_bar(bar);
        }
    }

    /// Emit all periods in chronological order.
    pub fn finish(self) -> Vec<Bar> {
        self.periods.values().map(PeriodInProgress::to_bar).collect()
    }
}

/// Resample a bar series into `period_ms` periods.
pub fn resample(bars: &[Bar], period_ms: i64) -> Result<Vec<Bar>> {
    let mut resampler = BarResampler::new(period_ms)?;
    resampler.add_bars(bars);
    Ok(resampler.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: i64 = 60_000;

    fn make_bar(ts: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open,
            high,
            low,
            close,
            volume: 1.0,
            taker_buy_volume: Some(0.5),
        }
    }

    #[test]
    fn test_single_period() {
        let bars = vec![
            make_bar(0, 100.0, 105.0, 99.0, 104.0),
            make_bar(15 * MINUTE, 104.0, 110.0, 101.0, 108.0),
        ];

        let periods = resample(&bars, 30 * MINUTE).unwrap();

        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].timestamp, 0);
        assert!((periods[0].open - 100.0).abs() < 1e-10);
        assert!((periods[0].high - 110.0).abs() < 1e-10);
        assert!((periods[0].low - 99.0).abs() < 1e-10);
        assert!((periods[0].close - 108.0).abs() < 1e-10);
        assert!((periods[0].volume - 2.0).abs() < 1e-10);
        assert_eq!(periods[0].taker_buy_volume, Some(1.0));
    }

    #[test]
    fn test_empty_periods_absent() {
        let bars = vec![
            make_bar(0, 1.0, 1.0, 1.0, 1.0),
            make_bar(95 * MINUTE, 2.0, 2.0, 2.0, 2.0),
        ];

        let periods = resample(&bars, 30 * MINUTE).unwrap();

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[1].timestamp, 90 * MINUTE);
    }

    #[test]
    fn test_unknown_buy_volume_propagates() {
        let mut bar = make_bar(MINUTE, 1.0, 1.0, 1.0, 1.0);
        bar.taker_buy_volume = None;
        let bars = vec![make_bar(0, 1.0, 1.0, 1.0, 1.0), bar];

        let periods = resample(&bars, 30 * MINUTE).unwrap();
        assert_eq!(periods[0].taker_buy_volume, None);
    }

    #[test]
    fn test_zero_period_rejected() {
        assert!(BarResampler::new(0).is_err());
    }
}
