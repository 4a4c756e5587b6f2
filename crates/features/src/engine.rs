//! Profile computation engine.
//!
//! Wires grids, histograms, value areas, sessions, TPO, footprint, CVD and
//! trade rates together from one [`Config`]. Each call is one analysis unit;
//! a structural error aborts that unit only.

use crate::{
    cvd::CvdTracker,
    footprint::{Footprint, FootprintDecomposer},
    grid::{GridSpec, PriceGrid},
    histogram::accumulate_closes,
    rate::{trade_rates, RateStats},
    session::{self, SessionWindow},
    tpo::TpoProfile,
    value_area::ValueAreaResolver,
};
use profile_core::{
    series_range, Bar, Config, CvdPoint, Error, RateBucket, Result, TimestampMs, Trade,
    ValueArea,
};
use profile_ingestion::{TradePager, TradeSource};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Close-volume profile of a whole series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    /// Bin edges, one more than the number of bins.
    pub price_bins: Vec<f64>,
    /// Volume per bin.
    pub volume_profile: Vec<f64>,
    pub poc: f64,
    pub value_area_min: f64,
    pub value_area_max: f64,
}

/// Volume profile and summary of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub session: u32,
    pub start_time: TimestampMs,
    pub end_time: TimestampMs,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub poc: f64,
    pub value_area_min: f64,
    pub value_area_max: f64,
    /// Price range of the whole series, shared by every session.
    pub price_range: f64,
    /// Volume per bin of the shared grid.
    pub volume_profile: Vec<f64>,
    /// Edges of the shared grid.
    pub price_bins: Vec<f64>,
}

/// A session that could not be profiled.
#[derive(Debug)]
pub struct SessionFailure {
    /// Session id.
    pub session: u32,
    /// Why it failed.
    pub error: Error,
}

/// Session profiles of a series plus the sessions that failed.
#[derive(Debug, Default)]
pub struct SessionProfileSet {
    pub profiles: Vec<SessionProfile>,
    pub failures: Vec<SessionFailure>,
}

/// One level of a market (TPO) profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProfileRow {
    pub price_level: f64,
    pub tpo_count: usize,
    pub is_poc: bool,
    pub in_value_area: bool,
    /// Letters of the periods marking the level, in period order.
    pub tpo_letters: String,
}

/// Market profile: per-level rows and the TPO value area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Rows from lowest to highest level.
    pub rows: Vec<MarketProfileRow>,
    pub poc: f64,
    pub va_low: f64,
    pub va_high: f64,
}

/// Trade-rate series with its summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRates {
    pub buckets: Vec<RateBucket>,
    /// `None` when there were no trades.
    pub stats: Option<RateStats>,
}

/// Bars of one instrument to analyze.
#[derive(Debug, Clone)]
pub struct AnalysisUnit {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

/// Everything computed for one instrument.
#[derive(Debug, Clone)]
pub struct InstrumentAnalysis {
    pub volume_profile: VolumeProfile,
    pub market_profile: MarketProfile,
    pub footprint: Footprint,
}

/// Outcome of one batch unit.
#[derive(Debug)]
pub struct UnitReport {
    pub symbol: String,
    pub result: Result<InstrumentAnalysis>,
}

/// Profile engine.
pub struct ProfileEngine {
    /// Configuration.
    config: Config,
    /// Value Area resolver.
    resolver: ValueAreaResolver,
    /// Session window.
    window: SessionWindow,
    /// Trade pager for CVD.
    pager: TradePager,
}

impl ProfileEngine {
    /// Create a new engine from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config: config.clone(),
            resolver: ValueAreaResolver::new(config.value_area.fraction)?,
            window: SessionWindow::from_duration(
                config.session.start,
                config.session.duration_hours,
            ),
            pager: TradePager::new(config.cvd.page_limit, config.cvd.cursor),
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn bin_spec(&self) -> GridSpec {
        GridSpec::Bins(self.config.instrument.num_bins)
    }

    fn tick_spec(&self) -> GridSpec {
        GridSpec::Tick(self.config.instrument.tick_size)
    }

    /// Close-volume profile over the whole series.
    pub fn volume_profile(&self, bars: &[Bar]) -> Result<VolumeProfile> {
        let grid = PriceGrid::from_bars(bars, self.bin_spec())?;
        let histogram = accumulate_closes(bars, &grid)?;
        let va = self.resolver.resolve(&histogram)?;

        info!(
            bars = bars.len(),
            poc = va.point_of_control,
            va_low = va.value_area_low,
            va_high = va.value_area_high,
            "volume profile computed"
        );

        Ok(VolumeProfile {
            price_bins: grid.levels().to_vec(),
            volume_profile: histogram.values().to_vec(),
            poc: va.point_of_control,
            value_area_min: va.value_area_low,
            value_area_max: va.value_area_high,
        })
    }

    /// Per-session volume profiles on one grid spanning the whole series.
    ///
    /// Sessions that cannot be resolved are reported in `failures`; the rest
    /// are still profiled.
    pub fn session_profiles(&self, bars: &[Bar]) -> Result<SessionProfileSet> {
        let grid = PriceGrid::from_bars(bars, self.bin_spec())?;
        let (series_low, series_high) = series_range(bars)
            .ok_or_else(|| Error::invalid_range("cannot profile an empty series"))?;
        let sessions = session::split(bars, &self.window)?;
        let mut set = SessionProfileSet::default();

        for session in &sessions {
            let profile = accumulate_closes(session.bars, &grid).and_then(|histogram| {
                let va = self.resolver.resolve(&histogram)?;
                let (low, high) = session
                    .range()
                    .ok_or_else(|| Error::data(format!("session {} has no bars", session.id)))?;
                Ok(SessionProfile {
                    session: session.id,
                    start_time: session.start_time(),
                    end_time: session.end_time(),
                    open: session.open(),
                    high,
                    low,
                    close: session.close(),
                    volume: session.volume(),
                    poc: va.point_of_control,
                    value_area_min: va.value_area_low,
                    value_area_max: va.value_area_high,
                    price_range: series_high - series_low,
                    volume_profile: histogram.values().to_vec(),
                    price_bins: grid.levels().to_vec(),
                })
            });

            match profile {
                Ok(profile) => set.profiles.push(profile),
                Err(error) => {
                    warn!(session = session.id, %error, "session profile skipped");
                    set.failures.push(SessionFailure {
                        session: session.id,
                        error,
                    });
                }
            }
        }

        info!(
            sessions = sessions.len(),
            failed = set.failures.len(),
            "session profiles computed"
        );
        Ok(set)
    }

    /// TPO market profile on the tick grid.
    pub fn market_profile(&self, bars: &[Bar]) -> Result<MarketProfile> {
        let grid = PriceGrid::from_bars(bars, self.tick_spec())?;
        let tpo = TpoProfile::build(bars, &grid, self.config.tpo.period_ms())?;
        let va: ValueArea = self.resolver.resolve(&tpo.counts())?;

        let rows = tpo
            .levels()
            .iter()
            .enumerate()
            .map(|(level, &price_level)| MarketProfileRow {
                price_level,
                tpo_count: tpo.count_at(level),
                is_poc: level == va.poc_index,
                in_value_area: va.contains_index(level),
                tpo_letters: tpo.letters_at(level),
            })
            .collect();

        info!(
            periods = tpo.periods().len(),
            letters = tpo.total_marks(),
            poc = va.point_of_control,
            "market profile computed"
        );

        Ok(MarketProfile {
            rows,
            poc: va.point_of_control,
            va_low: va.value_area_low,
            va_high: va.value_area_high,
        })
    }

    /// Footprint on the tick grid.
    pub fn footprint(&self, bars: &[Bar]) -> Result<Footprint> {
        let grid = PriceGrid::from_bars(bars, self.tick_spec())?;
        let footprint = FootprintDecomposer::new(&grid).decompose(bars)?;

        info!(
            records = footprint.records.len(),
            skipped = footprint.skipped.len(),
            "footprint computed"
        );
        Ok(footprint)
    }

    /// Cumulative volume delta over every trade the source holds in `[start, end)`.
    pub fn cumulative_delta<S>(
        &self,
        source: &mut S,
        start: TimestampMs,
        end: TimestampMs,
    ) -> Result<Vec<CvdPoint>>
    where
        S: TradeSource + ?Sized,
    {
        let mut tracker = CvdTracker::new();
        let series = tracker.drain(&self.pager, source, start, end)?;
        info!(
            trades = series.len(),
            buy_volume = tracker.buy_volume(),
            sell_volume = tracker.sell_volume(),
            delta = tracker.stats().delta(),
            "cumulative delta computed"
        );
        Ok(series)
    }

    /// Trade-rate buckets at the configured interval.
    pub fn trade_rates(&self, trades: &[Trade]) -> Result<TradeRates> {
        let buckets = trade_rates(trades, self.config.rate.interval_ms, self.config.rate.fill)?;
        let stats = RateStats::from_buckets(&buckets);
        Ok(TradeRates { buckets, stats })
    }

    /// Volume profile, market profile and footprint of one instrument.
    pub fn analyze(&self, bars: &[Bar]) -> Result<InstrumentAnalysis> {
        Ok(InstrumentAnalysis {
            volume_profile: self.volume_profile(bars)?,
            market_profile: self.market_profile(bars)?,
            footprint: self.footprint(bars)?,
        })
    }

    /// Analyze several instruments; a failing unit does not affect the others.
    pub fn analyze_batch(&self, units: &[AnalysisUnit]) -> Vec<UnitReport> {
        units
            .iter()
            .map(|unit| {
                let result = self.analyze(&unit.bars);
                if let Err(error) = &result {
                    warn!(symbol = %unit.symbol, %error, "instrument analysis failed");
                }
                UnitReport {
                    symbol: unit.symbol.clone(),
                    result,
                }
            })
            .collect()
    }
}
