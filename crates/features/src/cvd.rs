//! Cumulative volume delta.
//!
//! Running sum of trade quantities signed by aggressor side: market buys add,
//! market sells (buyer was maker) subtract. One point is emitted per trade.

use profile_core::{CvdPoint, Result, TimestampMs, Trade};
use profile_ingestion::{ClassificationStats, TradeClassifier, TradePager, TradeSource};

/// Running CVD accumulator.
#[derive(Debug, Default)]
pub struct CvdTracker {
    cvd: f64,
    classifier: TradeClassifier,
}

impl CvdTracker {
    /// Create a tracker starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a trade into the running value.
    pub fn push(&mut self, trade: &Trade) -> CvdPoint {
        let side = self.classifier.classify(trade);
        self.cvd += trade.quantity * side.sign_f64();
        CvdPoint {
            timestamp: trade.timestamp,
            cvd: self.cvd,
            price: trade.price,
        }
    }

    /// Current running value.
    pub fn value(&self) -> f64 {
        self.cvd
    }

    /// Taker buy quantity seen so far.
    pub fn buy_volume(&self) -> f64 {
        self.classifier.stats().buy_volume
    }

    /// Taker sell quantity seen so far.
    pub fn sell_volume(&self) -> f64 {
        self.classifier.stats().sell_volume
    }

    /// Buy/sell totals seen so far.
    pub fn stats(&self) -> &ClassificationStats {
        self.classifier.stats()
    }

    /// Clear all state.
    pub fn reset(&mut self) {
        self.cvd = 0.0;
        self.classifier.reset_stats();
    }

    /// Fold a batch of trades in chronological order, continuing from the
    /// current value. Trades sharing a timestamp keep their input order.
    pub fn extend(&mut self, trades: &[Trade]) -> Vec<CvdPoint> {
        let mut ordered: Vec<&Trade> = trades.iter().collect();
        ordered.sort_by_key(|t| t.timestamp);
        ordered.into_iter().map(|t| self.push(t)).collect()
    }

    /// Drain a trade source over `[start, end)` and fold every trade.
    pub fn drain<S>(
        &mut self,
        pager: &TradePager,
        source: &mut S,
        start: TimestampMs,
        end: TimestampMs,
    ) -> Result<Vec<CvdPoint>>
    where
        S: TradeSource + ?Sized,
    {
        let trades = pager.drain(source, start, end)?;
        Ok(self.extend(&trades))
    }

    /// CVD series over a batch of trades, starting from zero.
    pub fn series(trades: &[Trade]) -> Vec<CvdPoint> {
        Self::new().extend(trades)
    }
}
