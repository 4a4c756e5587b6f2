//! Configuration structures for the market-profile system.

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration for the profile engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Instrument configuration.
    pub instrument: InstrumentConfig,
    /// Value Area configuration.
    pub value_area: ValueAreaConfig,
    /// Session window configuration.
    pub session: SessionConfig,
    /// TPO profile configuration.
    pub tpo: TpoConfig,
    /// Cumulative volume delta configuration.
    pub cvd: CvdConfig,
    /// Trade-rate configuration.
    pub rate: RateConfig,
}

impl Config {
    /// Parse a configuration from JSON. Missing sections take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check value constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if !(self.instrument.tick_size.is_finite() && self.instrument.tick_size > 0.0) {
            return Err(Error::config(format!(
                "tick_size must be positive, got {}",
                self.instrument.tick_size
            )));
        }
        if self.instrument.num_bins < 2 {
            return Err(Error::config(format!(
                "num_bins must be at least 2, got {}",
                self.instrument.num_bins
            )));
        }
        let fraction = self.value_area.fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::config(format!(
                "value area fraction must be in (0, 1], got {fraction}"
            )));
        }
        if self.session.duration_hours == 0 || self.session.duration_hours > 24 {
            return Err(Error::config(format!(
                "session duration must be 1..=24 hours, got {}",
                self.session.duration_hours
            )));
        }
        if self.tpo.period_minutes == 0 {
            return Err(Error::config("tpo period_minutes must be positive"));
        }
        if self.cvd.page_limit == 0 {
            return Err(Error::config("cvd page_limit must be positive"));
        }
        if self.rate.interval_ms <= 0 {
            return Err(Error::config("rate interval_ms must be positive"));
        }
        Ok(())
    }
}

/// Instrument-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Trading symbol (e.g., "BTCUSDT").
    pub symbol: String,
    /// Price step of the tick grid (footprint and TPO views).
    pub tick_size: f64,
    /// Edge count of the bin grid (volume and session profiles).
    pub num_bins: usize,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            symbol: "BTCUSDT".to_string(),
            tick_size: 10.0,
            num_bins: 100,
        }
    }
}

/// Value Area computation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueAreaConfig {
    /// Target VA coverage (e.g., 0.70 for 70%).
    pub fraction: f64,
}

impl Default for ValueAreaConfig {
    fn default() -> Self {
        Self { fraction: 0.70 }
    }
}

/// Recurring daily session window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Window start, UTC time of day.
    pub start: NaiveTime,
    /// Window length in hours.
    pub duration_hours: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            start: NaiveTime::default(),
            duration_hours: 8,
        }
    }
}

/// TPO profile configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TpoConfig {
    /// Length of one TPO period in minutes.
    pub period_minutes: u32,
}

impl Default for TpoConfig {
    fn default() -> Self {
        Self { period_minutes: 30 }
    }
}

impl TpoConfig {
    /// Period length in milliseconds.
    pub fn period_ms(&self) -> i64 {
        i64::from(self.period_minutes) * 60_000
    }
}

/// How the trade pager advances between pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCursor {
    /// Next request starts one millisecond after the page's last trade.
    #[default]
    NextMillisecond,
    /// Next request starts at the page's last timestamp; trades already
    /// seen are dropped by `(timestamp, trade_id)`.
    TradeId,
}

/// Cumulative volume delta configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CvdConfig {
    /// Maximum trades per page requested from the source.
    pub page_limit: usize,
    /// Cursor policy between pages.
    pub cursor: PageCursor,
}

impl Default for CvdConfig {
    fn default() -> Self {
        Self {
            page_limit: 1000,
            cursor: PageCursor::NextMillisecond,
        }
    }
}

/// Fill policy for intervals without trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateFill {
    /// Empty buckets are absent from the output.
    #[default]
    Sparse,
    /// Empty buckets between the first and last trade are zero-filled.
    Dense,
}

/// Trade-rate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateConfig {
    /// Bucket length in milliseconds.
    pub interval_ms: i64,
    /// Fill policy for empty buckets.
    pub fill: RateFill,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1_000,
            fill: RateFill::Sparse,
        }
    }
}
