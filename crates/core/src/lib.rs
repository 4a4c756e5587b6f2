//! Core types and configuration for the market-profile system.
//!
//! This crate provides shared types used across all other crates:
//! - Market data records (bars, trades)
//! - Derived output records (footprint rows, value areas, CVD points, rate buckets)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, PageCursor, RateFill};
pub use error::{Error, Result};
pub use types::*;
