use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::error::PammError;

const SECS_PER_DAY: i64 = 86_400;
const SECS_PER_HOUR: i64 = 3_600;

/// Floor a unix timestamp to the start of its `bin_secs`-wide bin.
pub fn floor_to_bin(ts: i64, bin_secs: i64) -> Result<i64, PammError> {
    if bin_secs <= 0 {
        return Err(PammError::InvalidBinWidth(bin_secs));
    }
    Ok(ts.div_euclid(bin_secs) * bin_secs)
}

/// UTC hour of day (0-23).
pub fn hour_of_day(ts: i64) -> u32 {
    (ts.rem_euclid(SECS_PER_DAY) / SECS_PER_HOUR) as u32
}

/// Render a unix timestamp as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn format_timestamp(ts: i64) -> String {
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ts.to_string(),
    }
}

/// Half-open time interval `[start, end)` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Result<Self, PammError> {
        if start >= end {
            return Err(PammError::InvalidTimeWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: i64) -> bool {
        ts >= self.start && ts < self.end
    }

    /// `HH:MM-HH:MM` label used in chart titles.
    pub fn label(&self) -> String {
        let fmt = |ts: i64| {
            DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.format("%H:%M").to_string())
                .unwrap_or_else(|| ts.to_string())
        };
        format!("{}-{}", fmt(self.start), fmt(self.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floor_to_bin() {
        assert_eq!(floor_to_bin(1_767_802_999, 300).unwrap(), 1_767_802_800);
        assert_eq!(floor_to_bin(1_767_802_800, 300).unwrap(), 1_767_802_800);
        assert_eq!(floor_to_bin(-1, 60).unwrap(), -60);
    }

    #[test]
    fn test_floor_to_bin_rejects_zero_width() {
        assert_eq!(floor_to_bin(10, 0), Err(PammError::InvalidBinWidth(0)));
    }

    #[test]
    fn test_hour_of_day() {
        assert_eq!(hour_of_day(1_767_802_800), 16);
        assert_eq!(hour_of_day(0), 0);
        assert_eq!(hour_of_day(86_399), 23);
    }

    #[test]
    fn test_window_is_half_open() {
        let w = TimeWindow::new(100, 200).unwrap();
        assert!(w.contains(100));
        assert!(w.contains(199));
        assert!(!w.contains(200));
        assert!(!w.contains(99));
    }

    #[test]
    fn test_window_rejects_empty_interval() {
        assert!(TimeWindow::new(5, 5).is_err());
        assert!(TimeWindow::new(6, 5).is_err());
    }

    #[test]
    fn test_window_label() {
        let w = TimeWindow::new(1_767_802_800, 1_767_803_100).unwrap();
        assert_eq!(w.label(), "16:20-16:25");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(1_767_801_600), "2026-01-07 16:00:00");
    }
}
