//! PyO3 bindings for the market-profile Rust components.
//!
//! Exposes the profile engine to the Python plotting and export scripts:
//! - Volume, session and market (TPO) profiles
//! - Footprint decomposition
//! - Cumulative volume delta from a Python trade source
//! - Trade-rate resampling

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use profile_core::{
    Bar as RustBar, Config as RustConfig, CvdPoint as RustCvdPoint, Error as RustError,
    FootprintRecord as RustFootprintRecord, RateBucket as RustRateBucket,
    Result as RustResult, TimestampMs, Trade as RustTrade, ValueArea as RustValueArea,
};
use profile_features::{Histogram, ProfileEngine, ValueAreaResolver};
use profile_ingestion::TradeSource;

fn to_py_err(err: RustError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ============================================================================
// Python-exposed Types
// ============================================================================

/// A candle with optional taker buy volume.
#[pyclass]
#[derive(Clone)]
pub struct Bar {
    #[pyo3(get, set)]
    pub timestamp: i64,
    #[pyo3(get, set)]
    pub open: f64,
    #[pyo3(get, set)]
    pub high: f64,
    #[pyo3(get, set)]
    pub low: f64,
    #[pyo3(get, set)]
    pub close: f64,
    #[pyo3(get, set)]
    pub volume: f64,
    #[pyo3(get, set)]
    pub taker_buy_volume: Option<f64>,
}

#[pymethods]
impl Bar {
    #[new]
    #[pyo3(signature = (timestamp, open, high, low, close, volume, taker_buy_volume=None))]
    fn new(
        timestamp: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        taker_buy_volume: Option<f64>,
    ) -> Self {
        Bar { timestamp, open, high, low, close, volume, taker_buy_volume }
    }

    fn __repr__(&self) -> String {
        format!(
            "Bar(timestamp={}, o={}, h={}, l={}, c={}, v={})",
            self.timestamp, self.open, self.high, self.low, self.close, self.volume
        )
    }
}

impl From<Bar> for RustBar {
    fn from(b: Bar) -> Self {
        RustBar {
            timestamp: b.timestamp,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
            taker_buy_volume: b.taker_buy_volume,
        }
    }
}

/// A single trade from the exchange.
#[pyclass]
#[derive(Clone)]
pub struct Trade {
    #[pyo3(get, set)]
    pub timestamp: i64,
    #[pyo3(get, set)]
    pub price: f64,
    #[pyo3(get, set)]
    pub quantity: f64,
    #[pyo3(get, set)]
    pub is_buyer_maker: bool,
    #[pyo3(get, set)]
    pub trade_id: Option<u64>,
}

#[pymethods]
impl Trade {
    #[new]
    #[pyo3(signature = (timestamp, price, quantity, is_buyer_maker, trade_id=None))]
    fn new(
        timestamp: i64,
        price: f64,
        quantity: f64,
        is_buyer_maker: bool,
        trade_id: Option<u64>,
    ) -> Self {
        Trade { timestamp, price, quantity, is_buyer_maker, trade_id }
    }

    /// Quantity signed by aggressor side.
    #[getter]
    fn signed_quantity(&self) -> f64 {
        RustTrade::from(self.clone()).signed_quantity()
    }

    fn __repr__(&self) -> String {
        format!(
            "Trade(timestamp={}, price={}, quantity={}, is_buyer_maker={})",
            self.timestamp, self.price, self.quantity, self.is_buyer_maker
        )
    }
}

impl From<Trade> for RustTrade {
    fn from(t: Trade) -> Self {
        RustTrade {
            timestamp: t.timestamp,
            price: t.price,
            quantity: t.quantity,
            is_buyer_maker: t.is_buyer_maker,
            trade_id: t.trade_id,
        }
    }
}

/// Value Area output.
#[pyclass]
#[derive(Clone)]
pub struct ValueArea {
    #[pyo3(get)]
    pub point_of_control: f64,
    #[pyo3(get)]
    pub value_area_low: f64,
    #[pyo3(get)]
    pub value_area_high: f64,
    #[pyo3(get)]
    pub poc_index: usize,
    #[pyo3(get)]
    pub low_index: usize,
    #[pyo3(get)]
    pub high_index: usize,
    #[pyo3(get)]
    pub coverage: f64,
    #[pyo3(get)]
    pub total_activity: f64,
}

impl From<RustValueArea> for ValueArea {
    fn from(va: RustValueArea) -> Self {
        ValueArea {
            point_of_control: va.point_of_control,
            value_area_low: va.value_area_low,
            value_area_high: va.value_area_high,
            poc_index: va.poc_index,
            low_index: va.low_index,
            high_index: va.high_index,
            coverage: va.coverage,
            total_activity: va.total_activity,
        }
    }
}

/// Buy/sell volume attributed to one price level of one bar.
#[pyclass]
#[derive(Clone)]
pub struct FootprintRecord {
    #[pyo3(get)]
    pub timestamp: i64,
    #[pyo3(get)]
    pub price: f64,
    #[pyo3(get)]
    pub buy_volume: f64,
    #[pyo3(get)]
    pub sell_volume: f64,
}

#[pymethods]
impl FootprintRecord {
    #[getter]
    fn delta(&self) -> f64 {
        self.buy_volume - self.sell_volume
    }
}

impl From<RustFootprintRecord> for FootprintRecord {
    fn from(r: RustFootprintRecord) -> Self {
        FootprintRecord {
            timestamp: r.timestamp,
            price: r.price,
            buy_volume: r.buy_volume,
            sell_volume: r.sell_volume,
        }
    }
}

/// Running CVD after one trade.
#[pyclass]
#[derive(Clone)]
pub struct CvdPoint {
    #[pyo3(get)]
    pub timestamp: i64,
    #[pyo3(get)]
    pub cvd: f64,
    #[pyo3(get)]
    pub price: f64,
}

impl From<RustCvdPoint> for CvdPoint {
    fn from(p: RustCvdPoint) -> Self {
        CvdPoint {
            timestamp: p.timestamp,
            cvd: p.cvd,
            price: p.price,
        }
    }
}

/// Trade count and volume of one interval.
#[pyclass]
#[derive(Clone)]
pub struct RateBucket {
    #[pyo3(get)]
    pub timestamp: i64,
    #[pyo3(get)]
    pub tps: u64,
    #[pyo3(get)]
    pub vps: f64,
}

impl From<RustRateBucket> for RateBucket {
    fn from(b: RustRateBucket) -> Self {
        RateBucket {
            timestamp: b.timestamp,
            tps: b.tps,
            vps: b.vps,
        }
    }
}

// ============================================================================
// Trade source backed by a Python callable
// ============================================================================

/// Calls `callback(start, end, limit)` and expects a list of `Trade`.
struct PyTradeSource<'a, 'py> {
    callback: &'a Bound<'py, PyAny>,
}

impl TradeSource for PyTradeSource<'_, '_> {
    fn fetch_trades(
        &mut self,
        start: TimestampMs,
        end: TimestampMs,
        limit: usize,
    ) -> RustResult<Vec<RustTrade>> {
        let page: Vec<Trade> = self
            .callback
            .call1((start, end, limit))
            .and_then(|obj| obj.extract())
            .map_err(|e| RustError::source(e.to_string()))?;
        Ok(page.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// Python-exposed Engine Classes
// ============================================================================

fn to_rust_bars(bars: Vec<Bar>) -> Vec<RustBar> {
    bars.into_iter().map(Into::into).collect()
}

/// Profile computation engine.
#[pyclass]
pub struct PyProfileEngine {
    inner: ProfileEngine,
}

#[pymethods]
impl PyProfileEngine {
    /// Create an engine, optionally from a JSON configuration string.
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => RustConfig::from_json(json).map_err(to_py_err)?,
            None => RustConfig::default(),
        };
        Ok(PyProfileEngine {
            inner: ProfileEngine::new(&config).map_err(to_py_err)?,
        })
    }

    /// Close-volume profile as a dict.
    fn volume_profile<'py>(
        &self,
        py: Python<'py>,
        bars: Vec<Bar>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let profile = self
            .inner
            .volume_profile(&to_rust_bars(bars))
            .map_err(to_py_err)?;

        let dict = PyDict::new_bound(py);
        dict.set_item("price_bins", profile.price_bins)?;
        dict.set_item("volume_profile", profile.volume_profile)?;
        dict.set_item("poc", profile.poc)?;
        dict.set_item("value_area_min", profile.value_area_min)?;
        dict.set_item("value_area_max", profile.value_area_max)?;
        Ok(dict)
    }

    /// Per-session profiles as a list of dicts plus `(session, error)` failures.
    fn session_profiles<'py>(
        &self,
        py: Python<'py>,
        bars: Vec<Bar>,
    ) -> PyResult<(Vec<Bound<'py, PyDict>>, Vec<(u32, String)>)> {
        let set = self
            .inner
            .session_profiles(&to_rust_bars(bars))
            .map_err(to_py_err)?;

        let mut rows = Vec::with_capacity(set.profiles.len());
        for p in set.profiles {
            let dict = PyDict::new_bound(py);
            dict.set_item("session", p.session)?;
            dict.set_item("start_time", p.start_time)?;
            dict.set_item("end_time", p.end_time)?;
            dict.set_item("open", p.open)?;
            dict.set_item("high", p.high)?;
            dict.set_item("low", p.low)?;
            dict.set_item("close", p.close)?;
            dict.set_item("volume", p.volume)?;
            dict.set_item("poc", p.poc)?;
            dict.set_item("value_area_min", p.value_area_min)?;
            dict.set_item("value_area_max", p.value_area_max)?;
            dict.set_item("price_range", p.price_range)?;
            dict.set_item("volume_profile", p.volume_profile)?;
            dict.set_item("price_bins", p.price_bins)?;
            rows.push(dict);
        }

        let failures = set
            .failures
            .into_iter()
            .map(|f| (f.session, f.error.to_string()))
            .collect();
        Ok((rows, failures))
    }

    /// Market (TPO) profile: list of row dicts and `(poc, va_low, va_high)`.
    fn market_profile<'py>(
        &self,
        py: Python<'py>,
        bars: Vec<Bar>,
    ) -> PyResult<(Vec<Bound<'py, PyDict>>, (f64, f64, f64))> {
        let profile = self
            .inner
            .market_profile(&to_rust_bars(bars))
            .map_err(to_py_err)?;

        let mut rows = Vec::with_capacity(profile.rows.len());
        for r in profile.rows {
            let dict = PyDict::new_bound(py);
            dict.set_item("price_level", r.price_level)?;
            dict.set_item("tpo_count", r.tpo_count)?;
            dict.set_item("is_poc", r.is_poc)?;
            dict.set_item("in_value_area", r.in_value_area)?;
            dict.set_item("tpo_letters", r.tpo_letters)?;
            rows.push(dict);
        }
        Ok((rows, (profile.poc, profile.va_low, profile.va_high)))
    }

    /// Footprint records on the tick grid.
    fn footprint(&self, bars: Vec<Bar>) -> PyResult<Vec<FootprintRecord>> {
        let footprint = self
            .inner
            .footprint(&to_rust_bars(bars))
            .map_err(to_py_err)?;
        Ok(footprint.records.into_iter().map(Into::into).collect())
    }

    /// CVD over `[start, end)`, pulling pages from `source(start, end, limit)`.
    fn cumulative_delta(
        &self,
        source: &Bound<'_, PyAny>,
        start: i64,
        end: i64,
    ) -> PyResult<Vec<CvdPoint>> {
        let mut source = PyTradeSource { callback: source };
        let series = self
            .inner
            .cumulative_delta(&mut source, start, end)
            .map_err(to_py_err)?;
        Ok(series.into_iter().map(Into::into).collect())
    }

    /// Trade-rate buckets at the configured interval.
    fn trade_rates(&self, trades: Vec<Trade>) -> PyResult<Vec<RateBucket>> {
        let trades: Vec<RustTrade> = trades.into_iter().map(Into::into).collect();
        let rates = self.inner.trade_rates(&trades).map_err(to_py_err)?;
        Ok(rates.buckets.into_iter().map(Into::into).collect())
    }
}

/// Resolve the value area of an arbitrary histogram.
#[pyfunction]
#[pyo3(signature = (levels, values, fraction=0.70))]
fn value_area(levels: Vec<f64>, values: Vec<f64>, fraction: f64) -> PyResult<ValueArea> {
    let histogram = Histogram::new(levels, values).map_err(to_py_err)?;
    let resolver = ValueAreaResolver::new(fraction).map_err(to_py_err)?;
    Ok(resolver.resolve(&histogram).map_err(to_py_err)?.into())
}

// ============================================================================
// Module Definition
// ============================================================================

/// Market Profile Core - Rust profile engine for Python.
#[pymodule]
fn market_profile_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Types
    m.add_class::<Bar>()?;
    m.add_class::<Trade>()?;
    m.add_class::<ValueArea>()?;
    m.add_class::<FootprintRecord>()?;
    m.add_class::<CvdPoint>()?;
    m.add_class::<RateBucket>()?;

    // Engine
    m.add_class::<PyProfileEngine>()?;
    m.add_function(wrap_pyfunction!(value_area, m)?)?;

    Ok(())
}
