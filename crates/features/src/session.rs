//! Session segmentation.
//!
//! A session starts every time the bar series enters the recurring daily
//! window `[start, end)` (UTC time of day). Bars keep the id of the latest
//! session start until the next one, so a session runs from one window entry
//! to the next. Bars before the first entry carry id 0.

use chrono::{Duration, NaiveTime};
use profile_core::{series_range, ts_to_datetime, Bar, Error, Result, TimestampMs};

/// Recurring daily time-of-day window, half-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl SessionWindow {
    /// Window `[start, end)`. An `end` before `start` wraps past midnight and
    /// `end == start` covers the whole day.
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Window starting at `start` and lasting `hours`.
    pub fn from_duration(start: NaiveTime, hours: u32) -> Self {
        let (end, _) = start.overflowing_add_signed(Duration::hours(i64::from(hours)));
        Self::new(start, end)
    }

    /// Whether a time of day falls inside the window.
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start < self.end {
            self.start <= time && time < self.end
        } else if self.start > self.end {
            time >= self.start || time < self.end
        } else {
            true
        }
    }

    fn contains_ts(&self, ts_ms: TimestampMs) -> Result<bool> {
        let dt = ts_to_datetime(ts_ms)
            .ok_or_else(|| Error::data(format!("timestamp {ts_ms} is out of range")))?;
        Ok(self.contains(dt.time()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    OutsideWindow,
    InsideWindow,
}

/// Session ids for a chronologically ordered bar series.
///
/// Ids are non-decreasing; a new id is issued exactly on an
/// outside-to-inside transition.
pub fn assign(bars: &[Bar], window: &SessionWindow) -> Result<Vec<u32>> {
    let mut state = SessionState::OutsideWindow;
    let mut id = 0u32;
    let mut ids = Vec::with_capacity(bars.len());

    for bar in bars {
        let inside = window.contains_ts(bar.timestamp)?;
        state = match (state, inside) {
            (SessionState::OutsideWindow, true) => {
                id += 1;
                SessionState::InsideWindow
            }
            (_, true) => SessionState::InsideWindow,
            (_, false) => SessionState::OutsideWindow,
        };
        ids.push(id);
    }

    Ok(ids)
}

/// A run of bars sharing one session id.
#[derive(Debug, Clone, Copy)]
pub struct Session<'a> {
    /// Session id.
    pub id: u32,
    /// Member bars, in time order.
    pub bars: &'a [Bar],
}

impl Session<'_> {
    /// Timestamp of the first bar.
    pub fn start_time(&self) -> TimestampMs {
        self.bars.first().map_or(0, |b| b.timestamp)
    }

    /// Timestamp of the last bar.
    pub fn end_time(&self) -> TimestampMs {
        self.bars.last().map_or(0, |b| b.timestamp)
    }

    /// Open of the first bar.
    pub fn open(&self) -> f64 {
        self.bars.first().map_or(f64::NAN, |b| b.open)
    }

    /// Close of the last bar.
    pub fn close(&self) -> f64 {
        self.bars.last().map_or(f64::NAN, |b| b.close)
    }

    /// Lowest low and highest high.
    pub fn range(&self) -> Option<(f64, f64)> {
        series_range(self.bars)
    }

    /// Summed volume.
    pub fn volume(&self) -> f64 {
        self.bars.iter().map(|b| b.volume).sum()
    }
}

/// Split a bar series into sessions. Ids without bars do not appear.
pub fn split<'a>(bars: &'a [Bar], window: &SessionWindow) -> Result<Vec<Session<'a>>> {
    let ids = assign(bars, window)?;
    let mut sessions = Vec::new();
    let mut start = 0;

    for i in 1..=bars.len() {
        if i == bars.len() || ids[i] != ids[start] {
            sessions.push(Session {
                id: ids[start],
                bars: &bars[start..i],
            });
            start = i;
        }
    }

    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 3_600_000;
    // 2024-01-01 00:00:00 UTC, a Monday.
    const DAY0: i64 = 1_704_067_200_000;

    fn hms(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn make_bar(ts: i64) -> Bar {
        Bar {
            timestamp: ts,
            open: 1.0,
            high: 2.0,
            low: 0.5,
            close: 1.5,
            volume: 1.0,
            taker_buy_volume: None,
        }
    }

    fn hourly_bars(start: i64, hours: i64) -> Vec<Bar> {
        (0..hours).map(|h| make_bar(start + h * HOUR)).collect()
    }

    #[test]
    fn test_window_contains() {
        let window = SessionWindow::from_duration(hms(0, 0), 8);
        assert!(window.contains(hms(0, 0)));
        assert!(window.contains(hms(7, 59)));
        assert!(!window.contains(hms(8, 0)));
    }

    #[test]
    fn test_window_wraps_midnight() {
        let window = SessionWindow::from_duration(hms(22, 0), 4);
        assert!(window.contains(hms(23, 0)));
        assert!(window.contains(hms(1, 30)));
        assert!(!window.contains(hms(2, 0)));
        assert!(!window.contains(hms(12, 0)));
    }

    #[test]
    fn test_full_day_window() {
        let window = SessionWindow::from_duration(hms(9, 0), 24);
        assert!(window.contains(hms(3, 0)));
    }

    #[test]
    fn test_ids_per_day() {
        let window = SessionWindow::from_duration(hms(0, 0), 8);
        // Start mid-day so the first bars precede any window entry.
        let bars = hourly_bars(DAY0 + 12 * HOUR, 48);

        let ids = assign(&bars, &window).unwrap();

        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(ids[0], 0);
        // Day 1, 00:00 to 08:00 all share session 1.
        let day1: Vec<u32> = ids[12..20].to_vec();
        assert!(day1.iter().all(|&id| id == 1));
        // Bars after the window keep the id until the next entry.
        assert_eq!(ids[30], 1);
        assert_eq!(ids[36], 2);
    }

    #[test]
    fn test_split_sessions() {
        let window = SessionWindow::from_duration(hms(0, 0), 8);
        let bars = hourly_bars(DAY0, 48);

        let sessions = split(&bars, &window).unwrap();

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, 1);
        assert_eq!(sessions[0].bars.len(), 24);
        assert_eq!(sessions[1].start_time(), DAY0 + 24 * HOUR);
        assert_eq!(sessions[1].end_time(), DAY0 + 47 * HOUR);
        assert!((sessions[1].volume() - 24.0).abs() < 1e-10);
    }

    #[test]
    fn test_no_window_entry_keeps_id_zero() {
        let window = SessionWindow::from_duration(hms(0, 0), 8);
        // Only afternoon bars on two days: no bar ever enters the window.
        let mut bars = hourly_bars(DAY0 + 12 * HOUR, 4);
        bars.extend(hourly_bars(DAY0 + 36 * HOUR, 4));

        let sessions = split(&bars, &window).unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, 0);
    }

    #[test]
    fn test_empty_series() {
        let window = SessionWindow::from_duration(hms(0, 0), 8);
        assert!(split(&[], &window).unwrap().is_empty());
    }
}
