//! Profile computation for the market-profile system.
//!
//! This crate handles:
//! - Price-level grids (tick and bin)
//! - Close-volume histograms
//! - Footprint decomposition
//! - Value Area computation (POC, VAH, VAL)
//! - Session segmentation
//! - TPO profiles
//! - Cumulative volume delta
//! - Trade-rate resampling

pub mod grid;
pub mod histogram;
pub mod footprint;
pub mod value_area;
pub mod session;
pub mod tpo;
pub mod cvd;
pub mod rate;
pub mod engine;

pub use grid::{GridSpec, PriceGrid};
pub use histogram::{accumulate_closes, Histogram};
pub use footprint::{DegenerateBar, Footprint, FootprintDecomposer, LevelFootprint};
pub use value_area::ValueAreaResolver;
pub use session::{Session, SessionWindow};
pub use tpo::{TpoPeriod, TpoProfile};
pub use cvd::CvdTracker;
pub use rate::{trade_rates, RateStats};
pub use engine::{
    AnalysisUnit, InstrumentAnalysis, MarketProfile, MarketProfileRow, ProfileEngine,
    SessionFailure, SessionProfile, SessionProfileSet, TradeRates, UnitReport, VolumeProfile,
};
