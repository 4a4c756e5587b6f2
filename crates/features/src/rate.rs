//! Trade-rate resampling.
//!
//! Trades are grouped into left-closed buckets of a fixed interval, keyed by
//! the bucket start. Each bucket reports the trade count (`tps`) and the
//! quantity traded (`vps`).

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use profile_core::{ts_to_bucket, Error, RateBucket, RateFill, Result, Trade};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

/// Bucket trades into `interval_ms` windows.
pub fn trade_rates(
    trades: &[Trade],
    interval_ms: i64,
    fill: RateFill,
) -> Result<Vec<RateBucket>> {
    if interval_ms <= 0 {
        return Err(Error::config(format!(
            "rate interval must be positive, got {interval_ms}"
        )));
    }

    let mut buckets: BTreeMap<i64, (u64, f64)> = BTreeMap::new();
    for trade in trades {
        let entry = buckets
            .entry(ts_to_bucket(trade.timestamp, interval_ms))
            .or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += trade.quantity;
    }

    let (first, last) = match (buckets.keys().next(), buckets.keys().next_back()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return Ok(Vec::new()),
    };

    match fill {
        RateFill::Sparse => Ok(buckets
            .into_iter()
            .map(|(timestamp, (tps, vps))| RateBucket { timestamp, tps, vps })
            .collect()),
        RateFill::Dense => {
            let steps = (last - first) / interval_ms;
            Ok((0..=steps)
                .map(|i| {
                    let timestamp = first + i * interval_ms;
                    let (tps, vps) = buckets.get(&timestamp).copied().unwrap_or((0, 0.0));
                    RateBucket { timestamp, tps, vps }
                })
                .collect())
        }
    }
}

/// Summary statistics over a rate series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateStats {
    pub buckets: usize,
    pub mean_tps: f64,
    pub median_tps: f64,
    pub max_tps: u64,
    pub mean_vps: f64,
    pub median_vps: f64,
    pub max_vps: f64,
}

impl RateStats {
    /// Statistics of a bucket series, `None` when it is empty.
    pub fn from_buckets(buckets: &[RateBucket]) -> Option<Self> {
        if buckets.is_empty() {
            return None;
        }

        let tps: Vec<f64> = buckets.iter().map(|b| b.tps as f64).collect();
        let vps: Vec<f64> = buckets.iter().map(|b| b.vps).collect();

        let max_tps = buckets.iter().map(|b| b.tps).max().unwrap_or(0);
        let max_vps = vps
            .iter()
            .copied()
            .map(OrderedFloat)
            .max()
            .map_or(0.0, |v| v.into_inner());

        Some(Self {
            buckets: buckets.len(),
            mean_tps: Statistics::mean(&tps),
            median_tps: Data::new(tps).median(),
            max_tps,
            mean_vps: Statistics::mean(&vps),
            median_vps: Data::new(vps).median(),
            max_vps,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn make_trade(timestamp: i64, quantity: f64) -> Trade {
        Trade {
            timestamp,
            price: 100.0,
            quantity,
            is_buyer_maker: false,
            trade_id: None,
        }
    }

    fn sample() -> Vec<Trade> {
        vec![
            make_trade(200, 1.0),
            make_trade(400, 2.0),
            make_trade(900, 3.0),
            make_trade(1100, 4.0),
        ]
    }

    #[test]
    fn test_left_closed_buckets() {
        let rates = trade_rates(&sample(), 1000, RateFill::Sparse).unwrap();

        assert_eq!(rates.len(), 2);
        assert_eq!((rates[0].timestamp, rates[0].tps), (0, 3));
        assert_abs_diff_eq!(rates[0].vps, 6.0);
        assert_eq!((rates[1].timestamp, rates[1].tps), (1000, 1));
        assert_abs_diff_eq!(rates[1].vps, 4.0);
    }

    #[test]
    fn test_boundary_trade_opens_next_bucket() {
        let trades = [make_trade(999, 1.0), make_trade(1000, 1.0)];
        let rates = trade_rates(&trades, 1000, RateFill::Sparse).unwrap();
        let starts: Vec<i64> = rates.iter().map(|r| r.timestamp).collect();
        assert_eq!(starts, vec![0, 1000]);
    }

    #[test]
    fn test_dense_fill_zeroes_gaps() {
        let trades = vec![make_trade(100, 1.0), make_trade(3500, 2.0)];

        let sparse = trade_rates(&trades, 1000, RateFill::Sparse).unwrap();
        let dense = trade_rates(&trades, 1000, RateFill::Dense).unwrap();

        assert_eq!(sparse.len(), 2);
        assert_eq!(dense.len(), 4);
        assert_eq!(dense[1].timestamp, 1000);
        assert_eq!(dense[1].tps, 0);
        assert_eq!(dense[2].vps, 0.0);
        assert_eq!(dense[3].tps, 1);
    }

    #[test]
    fn test_unsorted_input() {
        let mut trades = sample();
        trades.reverse();
        let rates = trade_rates(&trades, 1000, RateFill::Sparse).unwrap();
        assert_eq!(rates[0].tps, 3);
    }

    #[test]
    fn test_empty_and_invalid_interval() {
        assert!(trade_rates(&[], 1000, RateFill::Dense).unwrap().is_empty());
        assert!(matches!(
            trade_rates(&sample(), 0, RateFill::Sparse),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_rate_stats() {
        let rates = trade_rates(&sample(), 1000, RateFill::Sparse).unwrap();

        let stats = RateStats::from_buckets(&rates).unwrap();

        assert_eq!(stats.buckets, 2);
        assert_eq!(stats.max_tps, 3);
        assert_abs_diff_eq!(stats.mean_tps, 2.0);
        assert_abs_diff_eq!(stats.median_tps, 2.0);
        assert_abs_diff_eq!(stats.mean_vps, 5.0);
        assert_abs_diff_eq!(stats.max_vps, 6.0);
        assert!(RateStats::from_buckets(&[]).is_none());
    }
}
