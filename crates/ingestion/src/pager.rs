//! Exhaustive draining of a paginated trade source.
//!
//! The source returns at most `limit` trades per call for a `[start, end)`
//! window. The pager keeps requesting until a page comes back empty or the
//! window is consumed. An empty page is the normal end of the stream.

use profile_core::{PageCursor, Result, TimestampMs, Trade};
use tracing::{debug, warn};

/// A market-data collaborator serving trades by time window.
///
/// Implementations may block. Transient failures are returned as errors and
/// are not retried by the pager.
pub trait TradeSource {
    /// Fetch up to `limit` trades with `start <= timestamp < end`.
    fn fetch_trades(
        &mut self,
        start: TimestampMs,
        end: TimestampMs,
        limit: usize,
    ) -> Result<Vec<Trade>>;
}

impl<F> TradeSource for F
where
    F: FnMut(TimestampMs, TimestampMs, usize) -> Result<Vec<Trade>>,
{
    fn fetch_trades(
        &mut self,
        start: TimestampMs,
        end: TimestampMs,
        limit: usize,
    ) -> Result<Vec<Trade>> {
        self(start, end, limit)
    }
}

/// Sort key used to recognise trades already taken from a previous page.
type TradeKey = (TimestampMs, Option<u64>);

fn trade_key(trade: &Trade) -> TradeKey {
    (trade.timestamp, trade.trade_id)
}

/// Pager that drains a [`TradeSource`] over a time window.
#[derive(Debug, Clone)]
pub struct TradePager {
    limit: usize,
    cursor: PageCursor,
}

impl TradePager {
    /// Create a new pager.
    pub fn new(limit: usize, cursor: PageCursor) -> Self {
        Self {
            limit: limit.max(1),
            cursor,
        }
    }

    /// Drain every trade in `[start, end)` in source order.
    ///
    /// With [`PageCursor::NextMillisecond`] the next request starts one
    /// millisecond past the page's latest trade; trades sharing that
    /// millisecond but cut off by the page limit are not fetched again.
    /// With [`PageCursor::TradeId`] the next request starts at the latest
    /// timestamp and trades at or before the last kept `(timestamp, id)` are
    /// dropped. A millisecond holding more trades than `limit` cannot be
    /// paged through by time alone: once a page brings nothing unseen the
    /// cursor moves one millisecond on and the rest of that millisecond is
    /// not fetched.
    pub fn drain<S>(
        &self,
        source: &mut S,
        mut start: TimestampMs,
        end: TimestampMs,
    ) -> Result<Vec<Trade>>
    where
        S: TradeSource + ?Sized,
    {
        let mut trades = Vec::new();
        let mut last_key: Option<TradeKey> = None;
        let mut pages = 0usize;

        while start < end {
            let page = source.fetch_trades(start, end, self.limit)?;
            pages += 1;

            let Some(max_ts) = page.iter().map(|t| t.timestamp).max() else {
                debug!(start, end, pages, "trade stream exhausted");
                break;
            };

            let next_start = match self.cursor {
                PageCursor::NextMillisecond => {
                    trades.extend(page);
                    max_ts + 1
                }
                PageCursor::TradeId => {
                    let boundary = last_key;
                    let before = trades.len();
                    for trade in page {
                        let key = trade_key(&trade);
                        if boundary.is_some_and(|b| key <= b) {
                            continue;
                        }
                        last_key = Some(last_key.map_or(key, |k| k.max(key)));
                        trades.push(trade);
                    }

                    if trades.len() == before {
                        warn!(
                            timestamp = max_ts,
                            "page held no unseen trades, advancing past the millisecond"
                        );
                        max_ts + 1
                    } else {
                        max_ts
                    }
                }
            };

            debug!(start, next_start, total = trades.len(), "fetched trade page");
            start = next_start;
        }

        Ok(trades)
    }
}

impl Default for TradePager {
    fn default() -> Self {
        Self::new(1000, PageCursor::NextMillisecond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use profile_core::Error;

    fn make_trade(timestamp: i64, id: u64) -> Trade {
        Trade {
            timestamp,
            price: 100.0,
            quantity: 1.0,
            is_buyer_maker: false,
            trade_id: Some(id),
        }
    }

    /// In-memory source honoring the `[start, end)` window and page limit.
    struct VecSource {
        trades: Vec<Trade>,
        calls: usize,
    }

    impl TradeSource for VecSource {
        fn fetch_trades(&mut self, start: i64, end: i64, limit: usize) -> Result<Vec<Trade>> {
            self.calls += 1;
            Ok(self
                .trades
                .iter()
                .filter(|t| t.timestamp >= start && t.timestamp < end)
                .take(limit)
                .cloned()
                .collect())
        }
    }

    fn ids(trades: &[Trade]) -> Vec<u64> {
        trades.iter().filter_map(|t| t.trade_id).collect()
    }

    #[test]
    fn test_drains_multiple_pages() {
        let mut source = VecSource {
            trades: (0..5).map(|i| make_trade(i * 10, i as u64)).collect(),
            calls: 0,
        };

        let trades = TradePager::new(2, PageCursor::NextMillisecond)
            .drain(&mut source, 0, 1_000)
            .unwrap();

        assert_eq!(ids(&trades), vec![0, 1, 2, 3, 4]);
        // Three full/partial pages plus the empty one ending the stream.
        assert_eq!(source.calls, 4);
    }

    #[test]
    fn test_next_millisecond_never_refetches_boundary() {
        let mut source = VecSource {
            trades: vec![
                make_trade(100, 1),
                make_trade(200, 2),
                make_trade(200, 3),
                make_trade(300, 4),
            ],
            calls: 0,
        };

        let trades = TradePager::new(2, PageCursor::NextMillisecond)
            .drain(&mut source, 0, 1_000)
            .unwrap();

        // Trade 2 closes the first page; the next request starts at 201 so
        // it is never counted twice. Trade 3 shares its millisecond and is
        // lost to the cursor.
        assert_eq!(ids(&trades), vec![1, 2, 4]);
    }

    #[test]
    fn test_trade_id_cursor_keeps_split_millisecond() {
        let mut source = VecSource {
            trades: vec![
                make_trade(100, 1),
                make_trade(200, 2),
                make_trade(200, 3),
                make_trade(300, 4),
            ],
            calls: 0,
        };

        let trades = TradePager::new(2, PageCursor::TradeId)
            .drain(&mut source, 0, 1_000)
            .unwrap();

        assert_eq!(ids(&trades), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_trade_id_cursor_skips_overfull_millisecond() {
        let mut source = VecSource {
            trades: vec![
                make_trade(100, 1),
                make_trade(200, 2),
                make_trade(200, 3),
                make_trade(200, 4),
                make_trade(300, 5),
            ],
            calls: 0,
        };

        let trades = TradePager::new(2, PageCursor::TradeId)
            .drain(&mut source, 0, 1_000)
            .unwrap();

        // Requests from 200 keep returning trades 2 and 3, so the cursor
        // gives up on that millisecond and trade 4 is never fetched.
        assert_eq!(ids(&trades), vec![1, 2, 3, 5]);
        assert_eq!(source.calls, 6);
    }

    #[test]
    fn test_duplicates_within_page_retained() {
        let mut source = VecSource {
            trades: vec![make_trade(100, 1), make_trade(100, 2), make_trade(100, 3)],
            calls: 0,
        };

        let trades = TradePager::new(10, PageCursor::NextMillisecond)
            .drain(&mut source, 0, 1_000)
            .unwrap();

        assert_eq!(trades.len(), 3);
    }

    #[test]
    fn test_empty_window_makes_no_request() {
        let mut source = VecSource {
            trades: vec![make_trade(100, 1)],
            calls: 0,
        };

        let trades = TradePager::default().drain(&mut source, 500, 500).unwrap();

        assert!(trades.is_empty());
        assert_eq!(source.calls, 0);
    }

    #[test]
    fn test_source_error_propagates() {
        let mut failing = |_: i64, _: i64, _: usize| -> Result<Vec<Trade>> {
            Err(Error::source("rate limited"))
        };

        let err = TradePager::default().drain(&mut failing, 0, 10).unwrap_err();
        assert!(matches!(err, Error::Source(_)));
    }
}
