//! Value Area computation (POC, VAH, VAL).
//!
//! Walks outward from the point of control one level at a time in both
//! directions until the enclosed activity exceeds the target share of the
//! total. Both neighbours are taken on every step, which is the conventional
//! market-profile construction; it is not a search for the smallest set of
//! levels reaching the target.

use crate::histogram::Histogram;
use profile_core::{Error, Result, ValueArea};

/// Default share of activity enclosed by the value area.
pub const DEFAULT_VALUE_AREA_FRACTION: f64 = 0.70;

/// Value Area resolver.
#[derive(Debug, Clone)]
pub struct ValueAreaResolver {
    fraction: f64,
}

impl ValueAreaResolver {
    /// Create a resolver targeting `fraction` of total activity.
    pub fn new(fraction: f64) -> Result<Self> {
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(Error::config(format!(
                "value area fraction must be in (0, 1], got {fraction}"
            )));
        }
        Ok(Self { fraction })
    }

    /// Target share of activity.
    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Resolve the point of control and value area of a histogram.
    ///
    /// The POC is the first level holding the maximum activity.
    pub fn resolve(&self, histogram: &Histogram) -> Result<ValueArea> {
        let total = histogram.total();
        if total <= 0.0 {
            return Err(Error::EmptyHistogram);
        }
        let poc = histogram.max_index().ok_or(Error::EmptyHistogram)?;

        let values = histogram.values();
        let levels = histogram.levels();
        let last = values.len() - 1;
        let threshold = self.fraction * total;

        let mut cumulative = values[poc];
        let mut low = poc;
        let mut high = poc;

        while cumulative <= threshold && (low > 0 || high < last) {
            if low > 0 {
                low -= 1;
                cumulative += values[low];
            }
            if high < last {
                high += 1;
                cumulative += values[high];
            }
        }

        Ok(ValueArea {
            point_of_control: levels[poc],
            value_area_low: levels[low],
            value_area_high: levels[high],
            poc_index: poc,
            low_index: low,
            high_index: high,
            coverage: cumulative / total,
            total_activity: total,
        })
    }
}

impl Default for ValueAreaResolver {
    fn default() -> Self {
        Self {
            fraction: DEFAULT_VALUE_AREA_FRACTION,
        }
    }
}
