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

//! Grid aligner: per-country series onto one wide table

use crate::grid::{CanonicalGrid, observed_bounds};
use chrono::Duration;
use std::collections::BTreeMap;
use tracing::{debug, info};
use verdant_types::{Catalog, CountrySeries, Result, SeriesTable, TimeTable, WideTable, column_name};

/// Reindex every series onto the grid spanning all observations and enforce
/// the complete `{country}_{code}` column set of `catalog`.
///
/// Observations that fall between grid points are dropped. Series sharing a
/// column are merged, earlier series winning on shared timestamps.
pub fn align(series: &[CountrySeries], catalog: &Catalog, resolution: Duration) -> Result<WideTable> {
    let (start, end) = observed_bounds(series)?;
    let grid = CanonicalGrid::spanning(start, end, resolution)?;

    let mut merged: BTreeMap<String, SeriesTable> = BTreeMap::new();
    for s in series {
        merged.entry(s.column_name()).or_default().merge(&s.table);
    }

    let mut table: WideTable = TimeTable::new(grid.timestamps());
    for (name, observed) in &merged {
        let mut cells = vec![None; grid.len()];
        let mut dropped = 0_usize;
        for (time, quantity) in observed.iter() {
            match grid.position(time) {
                Some(index) => cells[index] = Some(quantity),
                None => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!("{name}: {dropped} observations off the grid");
        }
        table.insert_column(name.clone(), cells)?;
    }

    let observed_columns = table.column_count();
    complete_schema(&mut table, catalog)?;

    info!(
        "Aligned {observed_columns} observed series onto {} rows from {start} to {end}, {} columns total",
        table.len(),
        table.column_count()
    );
    Ok(table)
}

/// Add an all-missing column for every catalog `(country, code)` pair that was
/// never observed
pub fn complete_schema(table: &mut WideTable, catalog: &Catalog) -> Result<()> {
    let codes = catalog.series_codes();
    for country in &catalog.countries {
        for code in &codes {
            let name = column_name(country, code);
            if !table.has_column(&name) {
                table.insert_column(name, vec![None; table.len()])?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use verdant_types::PipelineError;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 1, 1, hour, minute, 0).unwrap()
    }

    fn two_countries() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.countries = vec!["DE".to_owned(), "NL".to_owned()];
        catalog
    }

    fn series(country: &str, code: &str, points: &[(DateTime<Utc>, f64)]) -> CountrySeries {
        CountrySeries::new(country, code, points.iter().copied().collect())
    }

    #[test]
    fn test_align_reindexes_onto_grid() {
        let input = vec![
            series("DE", "load", &[(at(0, 0), 1.0), (at(0, 30), 3.0)]),
            series("NL", "B16", &[(at(0, 15), 7.0)]),
        ];
        let table = align(&input, &two_countries(), Duration::minutes(15)).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.column("DE_load").unwrap(),
            &[Some(1.0), None, Some(3.0)]
        );
        assert_eq!(table.column("NL_B16").unwrap(), &[None, Some(7.0), None]);
    }

    #[test]
    fn test_schema_is_complete() {
        let input = vec![series("DE", "load", &[(at(0, 0), 1.0)])];
        let table = align(&input, &two_countries(), Duration::minutes(15)).unwrap();

        assert_eq!(table.column_count(), 50);
        for country in ["DE", "NL"] {
            for code in Catalog::default().series_codes() {
                assert!(table.has_column(&column_name(country, &code)));
            }
        }
        assert_eq!(table.column("NL_load").unwrap(), &[None]);
    }

    #[test]
    fn test_columns_sorted_ascending() {
        let input = vec![series("NL", "load", &[(at(0, 0), 1.0)])];
        let table = align(&input, &two_countries(), Duration::minutes(15)).unwrap();

        let names: Vec<&str> = table.column_names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert_eq!(names[0], "DE_B01");
        assert_eq!(names[names.len() - 1], "NL_load");
    }

    #[test]
    fn test_duplicate_triples_merge_first_wins() {
        let input = vec![
            series("DE", "load", &[(at(0, 0), 1.0)]),
            series("DE", "load", &[(at(0, 0), 9.0), (at(0, 15), 2.0)]),
        ];
        let table = align(&input, &two_countries(), Duration::minutes(15)).unwrap();
        assert_eq!(table.column("DE_load").unwrap(), &[Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_off_grid_observations_are_dropped() {
        let input = vec![
            series("DE", "load", &[(at(0, 0), 1.0), (at(0, 15), 2.0)]),
            series("NL", "load", &[(at(0, 5), 5.0)]),
        ];
        let table = align(&input, &two_countries(), Duration::minutes(15)).unwrap();
        assert_eq!(table.column("NL_load").unwrap(), &[None, None]);
    }

    #[test]
    fn test_nothing_observed() {
        let input = vec![series("DE", "load", &[])];
        assert!(matches!(
            align(&input, &two_countries(), Duration::minutes(15)),
            Err(PipelineError::EmptyInput(_))
        ));
    }
}
