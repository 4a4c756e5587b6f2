//! Core data types for the market-profile system.

use chrono::{DateTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// Timestamp in milliseconds since Unix epoch (UTC).
pub type TimestampMs = i64;

/// Size/quantity type.
pub type Size = f64;

/// Floor a timestamp to the start of its `interval_ms` bucket.
///
/// Buckets are left-closed and aligned to the Unix epoch, so negative
/// timestamps floor towards negative infinity.
#[inline]
pub fn ts_to_bucket(ts_ms: TimestampMs, interval_ms: i64) -> TimestampMs {
    ts_ms.div_euclid(interval_ms) * interval_ms
}

/// Convert a millisecond timestamp to a UTC datetime.
#[inline]
pub fn ts_to_datetime(ts_ms: TimestampMs) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_ms)
}

/// An OHLCV candle for one analyzed interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Interval open time (ms).
    pub timestamp: TimestampMs,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Total base-asset volume.
    pub volume: Size,
    /// Volume bought by takers, when the provider reports it.
    pub taker_buy_volume: Option<Size>,
}

impl Bar {
    /// Volume sold by takers (`volume - taker_buy_volume`).
    #[inline]
    pub fn taker_sell_volume(&self) -> Option<Size> {
        self.taker_buy_volume.map(|buy| self.volume - buy)
    }
}

/// Lowest low and highest high of a bar series.
///
/// Returns `None` for an empty series.
pub fn series_range(bars: &[Bar]) -> Option<(f64, f64)> {
    let low = bars.iter().map(|b| OrderedFloat(b.low)).min()?;
    let high = bars.iter().map(|b| OrderedFloat(b.high)).max()?;
    Some((low.0, high.0))
}

/// A single executed trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Execution time (ms).
    pub timestamp: TimestampMs,
    /// Trade price.
    pub price: f64,
    /// Trade quantity (base asset).
    pub quantity: Size,
    /// Whether the buyer was the resting (maker) side.
    pub is_buyer_maker: bool,
    /// Provider trade identifier, when available.
    pub trade_id: Option<u64>,
}

impl Trade {
    /// Aggressor side of the trade.
    #[inline]
    pub fn side(&self) -> TradeSide {
        TradeSide::from_buyer_maker(self.is_buyer_maker)
    }

    /// Quantity signed by aggressor side (positive for market buys).
    #[inline]
    pub fn signed_quantity(&self) -> f64 {
        self.quantity * self.side().sign_f64()
    }
}

/// Aggressor side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i8)]
pub enum TradeSide {
    /// Taker bought from a resting ask.
    Buy = 1,
    /// Taker sold into a resting bid.
    Sell = -1,
}

impl TradeSide {
    /// A maker buyer means the taker sold.
    #[inline]
    pub fn from_buyer_maker(is_buyer_maker: bool) -> Self {
        if is_buyer_maker {
            TradeSide::Sell
        } else {
            TradeSide::Buy
        }
    }

    /// Get the sign as i8.
    #[inline]
    pub fn sign(self) -> i8 {
        self as i8
    }

    /// Get the sign as f64.
    #[inline]
    pub fn sign_f64(self) -> f64 {
        self.sign() as f64
    }
}

/// Buy/sell volume attributed to one price level of one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    /// Bar timestamp.
    pub timestamp: TimestampMs,
    /// Grid level price.
    pub price: f64,
    /// Taker buy volume attributed to the level.
    pub buy_volume: Size,
    /// Taker sell volume attributed to the level.
    pub sell_volume: Size,
}

impl FootprintRecord {
    /// Buy minus sell volume at the level.
    #[inline]
    pub fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }
}

/// Point of control and value area resolved from a histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    /// Level price with the most activity.
    pub point_of_control: f64,
    /// Lowest level price inside the value area.
    pub value_area_low: f64,
    /// Highest level price inside the value area.
    pub value_area_high: f64,
    /// Level index of the point of control.
    pub poc_index: usize,
    /// Level index of the value area low.
    pub low_index: usize,
    /// Level index of the value area high.
    pub high_index: usize,
    /// Fraction of total activity inside the value area.
    pub coverage: f64,
    /// Total activity in the histogram.
    pub total_activity: f64,
}

impl ValueArea {
    /// Number of levels inside the value area.
    #[inline]
    pub fn level_count(&self) -> usize {
        self.high_index - self.low_index + 1
    }

    /// Whether a level index falls inside the value area.
    #[inline]
    pub fn contains_index(&self, index: usize) -> bool {
        index >= self.low_index && index <= self.high_index
    }
}

/// One point of the cumulative volume delta series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CvdPoint {
    /// Trade timestamp.
    pub timestamp: TimestampMs,
    /// Running signed volume after this trade.
    pub cvd: f64,
    /// Trade price.
    pub price: f64,
}

/// Trade count and volume for one fixed-interval bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBucket {
    /// Bucket start (ms).
    pub timestamp: TimestampMs,
    /// Trades in the bucket.
    pub tps: u64,
    /// Quantity traded in the bucket.
    pub vps: Size,
}
