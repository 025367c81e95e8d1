// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of Verdant.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Splitting a requested range into windows a source accepts in one request

use chrono::{DateTime, Duration, Months, Utc};
use std::fmt;
use verdant_types::{PipelineError, Result};

/// Half-open `[start, end)` range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(PipelineError::Config(format!(
                "range start {start} is not before end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

/// Largest span a source serves per request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    /// Calendar months (12 = one year)
    Months(u32),
    Days(i64),
}

impl WindowStep {
    fn advance(self, from: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let next = match self {
            Self::Months(n) => from.checked_add_months(Months::new(n)),
            Self::Days(n) => Duration::try_days(n).and_then(|d| from.checked_add_signed(d)),
        };
        next.filter(|n| *n > from).ok_or_else(|| {
            PipelineError::Config(format!("window step {self:?} does not advance from {from}"))
        })
    }
}

/// Consecutive windows covering `range`, each at most one `step` long.
///
/// Each window starts where the previous one started plus `step`; the last
/// window is clamped to the range end.
pub fn split_range(range: TimeRange, step: WindowStep) -> Result<Vec<TimeRange>> {
    let mut windows = Vec::new();
    let mut current = range.start;

    while current < range.end {
        let next = step.advance(current)?;
        windows.push(TimeRange {
            start: current,
            end: next.min(range.end),
        });
        current = next;
    }

    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_yearly_windows() {
        let range = TimeRange::new(day(2020, 1, 1), day(2022, 6, 1)).unwrap();
        let windows = split_range(range, WindowStep::Months(12)).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].end, day(2021, 1, 1));
        assert_eq!(windows[1].start, day(2021, 1, 1));
        assert_eq!(windows[2].start, day(2022, 1, 1));
        assert_eq!(windows[2].end, day(2022, 6, 1));
    }

    #[test]
    fn test_daily_windows_cover_range_exactly() {
        let range = TimeRange::new(day(2022, 1, 1), day(2022, 3, 1)).unwrap();
        let windows = split_range(range, WindowStep::Days(28)).unwrap();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].end, day(2022, 1, 29));
        assert_eq!(windows[1].end, day(2022, 2, 26));
        assert_eq!(windows[2].end, day(2022, 3, 1));
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_range_shorter_than_step() {
        let range = TimeRange::new(day(2022, 1, 1), day(2022, 1, 3)).unwrap();
        let windows = split_range(range, WindowStep::Days(14)).unwrap();
        assert_eq!(windows, vec![range]);
    }

    #[test]
    fn test_empty_range_rejected() {
        assert!(TimeRange::new(day(2022, 1, 1), day(2022, 1, 1)).is_err());
    }

    #[test]
    fn test_zero_step_rejected() {
        let range = TimeRange::new(day(2022, 1, 1), day(2022, 1, 3)).unwrap();
        assert!(split_range(range, WindowStep::Days(0)).is_err());
    }
}
