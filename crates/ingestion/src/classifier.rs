//! Trade side inference from the maker flag.
//!
//! A trade whose buyer rested on the book was initiated by a seller, so it
//! counts as market-sell pressure; every other trade is market-buy pressure.

use profile_core::{Trade, TradeSide};

/// Statistics about the classified trade flow.
#[derive(Debug, Clone, Default)]
pub struct ClassificationStats {
    /// Total trades classified.
    pub total_trades: u64,
    /// Trades classified as buy.
    pub buy_trades: u64,
    /// Trades classified as sell.
    pub sell_trades: u64,
    /// Total volume processed.
    pub total_volume: f64,
    /// Buy volume.
    pub buy_volume: f64,
    /// Sell volume.
    pub sell_volume: f64,
}

impl ClassificationStats {
    /// Buy minus sell volume.
    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Trade classifier that tags trades with their aggressor side.
#[derive(Debug, Default)]
pub struct TradeClassifier {
    stats: ClassificationStats,
}

impl TradeClassifier {
    /// Create a new trade classifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a single trade and fold it into the statistics.
    pub fn classify(&mut self, trade: &Trade) -> TradeSide {
        let side = trade.side();

        self.stats.total_trades += 1;
        self.stats.total_volume += trade.quantity;
        match side {
            TradeSide::Buy => {
                self.stats.buy_trades += 1;
                self.stats.buy_volume += trade.quantity;
            }
            TradeSide::Sell => {
                self.stats.sell_trades += 1;
                self.stats.sell_volume += trade.quantity;
            }
        }

        side
    }

    /// Get classification statistics.
    pub fn stats(&self) -> &ClassificationStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}
