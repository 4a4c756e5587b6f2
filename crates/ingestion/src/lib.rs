//! Data ingestion and normalization for the market-profile system.
//!
//! This crate handles:
//! - Provider tuple validation (candles, trades)
//! - Trade side inference from the maker flag
//! - Fixed-period bar resampling
//! - Exhaustive draining of paginated trade sources

pub mod classifier;
pub mod pager;
pub mod records;
pub mod resampler;

pub use classifier::{ClassificationStats, TradeClassifier};
pub use pager::{TradePager, TradeSource};
pub use records::{normalize_klines, normalize_trades, RawKline, RawTrade};
pub use resampler::{resample, BarResampler};
