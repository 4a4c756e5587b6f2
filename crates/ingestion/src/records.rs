//! Provider record normalization.
//!
//! The market-data collaborator hands over candles and trades as flat tuples.
//! These are validated here and turned into [`Bar`] and [`Trade`] values
//! ordered by timestamp.

use profile_core::{Bar, Error, Result, TimestampMs, Trade};
use serde::{Deserialize, Serialize};

/// Candle tuple: `(timestamp, open, high, low, close, volume, taker_buy_volume)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawKline(
    pub TimestampMs,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub f64,
    pub Option<f64>,
);

/// Trade tuple: `(timestamp, price, quantity, is_buyer_maker, trade_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTrade(
    pub TimestampMs,
    pub f64,
    pub f64,
    pub bool,
    pub Option<u64>,
);

fn check_finite(ts: TimestampMs, field: &str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(Error::data(format!("{field} at {ts} is not finite")))
    }
}

impl TryFrom<RawKline> for Bar {
    type Error = Error;

    fn try_from(raw: RawKline) -> Result<Self> {
        let RawKline(timestamp, open, high, low, close, volume, taker_buy_volume) = raw;

        for (field, value) in [
            ("open", open),
            ("high", high),
            ("low", low),
            ("close", close),
            ("volume", volume),
        ] {
            check_finite(timestamp, field, value)?;
        }
        if high < low {
            return Err(Error::data(format!(
                "bar at {timestamp} has high {high} below low {low}"
            )));
        }
        if volume < 0.0 {
            return Err(Error::data(format!("bar at {timestamp} has negative volume")));
        }
        if let Some(buy) = taker_buy_volume {
            check_finite(timestamp, "taker_buy_volume", buy)?;
            if buy < 0.0 || buy > volume {
                return Err(Error::data(format!(
                    "bar at {timestamp} has taker buy volume {buy} outside [0, {volume}]"
                )));
            }
        }

        Ok(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            taker_buy_volume,
        })
    }
}

impl TryFrom<RawTrade> for Trade {
    type Error = Error;

    fn try_from(raw: RawTrade) -> Result<Self> {
        let RawTrade(timestamp, price, quantity, is_buyer_maker, trade_id) = raw;

        check_finite(timestamp, "price", price)?;
        check_finite(timestamp, "quantity", quantity)?;
        if quantity < 0.0 {
            return Err(Error::data(format!("trade at {timestamp} has negative quantity")));
        }

        Ok(Trade {
            timestamp,
            price,
            quantity,
            is_buyer_maker,
            trade_id,
        })
    }
}

/// Convert candle tuples into bars sorted by timestamp.
pub fn normalize_klines(raw: Vec<RawKline>) -> Result<Vec<Bar>> {
    let mut bars = raw
        .into_iter()
        .map(Bar::try_from)
        .collect::<Result<Vec<_>>>()?;
    bars.sort_by_key(|b| b.timestamp);
    Ok(bars)
}

/// Convert trade tuples into trades sorted by timestamp.
///
/// The sort is stable, so trades sharing a millisecond keep provider order.
pub fn normalize_trades(raw: Vec<RawTrade>) -> Result<Vec<Trade>> {
    let mut trades = raw
        .into_iter()
        .map(Trade::try_from)
        .collect::<Result<Vec<_>>>()?;
    trades.sort_by_key(|t| t.timestamp);
    Ok(trades)
}
