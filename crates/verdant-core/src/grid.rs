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

use chrono::{DateTime, Duration, Utc};
use verdant_types::{CountrySeries, PipelineError, Result};

/// Regular timestamp axis `start, start + resolution, ..` covering `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalGrid {
    start: DateTime<Utc>,
    resolution: Duration,
    len: usize,
}

impl CanonicalGrid {
    /// Grid from `start` through the last step not after `end`
    pub fn spanning(start: DateTime<Utc>, end: DateTime<Utc>, resolution: Duration) -> Result<Self> {
        if resolution.num_seconds() <= 0 {
            return Err(PipelineError::Config(format!(
                "grid resolution must be at least one second, got {resolution}"
            )));
        }
        if end < start {
            return Err(PipelineError::EmptyInput(format!(
                "grid end {end} is before start {start}"
            )));
        }

        let steps = (end - start).num_seconds().div_euclid(resolution.num_seconds());
        let len = usize::try_from(steps)
            .map_err(|_| PipelineError::Config(format!("grid of {steps} steps is too long")))?
            + 1;

        Ok(Self {
            start,
            resolution,
            len,
        })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Timestamp at grid position `index`
    pub fn at(&self, index: usize) -> Option<DateTime<Utc>> {
        if index >= self.len {
            return None;
        }
        let steps = i32::try_from(index).ok()?;
        self.resolution
            .checked_mul(steps)
            .and_then(|offset| self.start.checked_add_signed(offset))
    }

    /// Grid position of `time`, if it falls exactly on the grid
    pub fn position(&self, time: DateTime<Utc>) -> Option<usize> {
        if time < self.start {
            return None;
        }
        let elapsed = (time - self.start).num_seconds();
        let step = self.resolution.num_seconds();
        if elapsed.rem_euclid(step) != 0 {
            return None;
        }
        usize::try_from(elapsed.div_euclid(step))
            .ok()
            .filter(|index| *index < self.len)
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        (0..self.len).filter_map(|i| self.at(i)).collect()
    }
}

/// Earliest and latest observation across every non-empty series
pub fn observed_bounds(series: &[CountrySeries]) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    series
        .iter()
        .filter_map(|s| s.table.bounds())
        .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
        .ok_or_else(|| PipelineError::EmptyInput("no series has any observation".to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use verdant_types::SeriesTable;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_grid_length_and_order() {
        let grid = CanonicalGrid::spanning(at(0, 0), at(2, 0), Duration::minutes(15)).unwrap();
        assert_eq!(grid.len(), 9);

        let stamps = grid.timestamps();
        assert_eq!(stamps.len(), 9);
        assert_eq!(stamps[0], at(0, 0));
        assert_eq!(stamps[8], at(2, 0));
        assert!(stamps.windows(2).all(|w| w[1] - w[0] == Duration::minutes(15)));
    }

    #[test]
    fn test_single_point_grid() {
        let grid = CanonicalGrid::spanning(at(5, 0), at(5, 0), Duration::minutes(15)).unwrap();
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.position(at(5, 0)), Some(0));
    }

    #[test]
    fn test_position_lookup() {
        let grid = CanonicalGrid::spanning(at(0, 0), at(1, 0), Duration::minutes(15)).unwrap();
        assert_eq!(grid.position(at(0, 45)), Some(3));
        assert_eq!(grid.position(at(0, 50)), None);
        assert_eq!(grid.position(at(1, 15)), None);
        assert_eq!(
            grid.position(Utc.with_ymd_and_hms(2021, 12, 31, 23, 45, 0).unwrap()),
            None
        );
    }

    #[test]
    fn test_observed_bounds_skip_empty_tables() {
        let series = vec![
            CountrySeries::new("DE", "load", [(at(1, 0), 1.0), (at(3, 0), 1.0)].into_iter().collect()),
            CountrySeries::new("NL", "B01", SeriesTable::new()),
            CountrySeries::new("NL", "load", [(at(0, 30), 1.0)].into_iter().collect()),
        ];
        assert_eq!(observed_bounds(&series).unwrap(), (at(0, 30), at(3, 0)));
    }

    #[test]
    fn test_observed_bounds_all_empty() {
        let series = vec![CountrySeries::new("NL", "B01", SeriesTable::new())];
        assert!(matches!(
            observed_bounds(&series),
            Err(PipelineError::EmptyInput(_))
        ));
    }
}
