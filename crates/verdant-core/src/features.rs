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

//! Green energy, surplus and next-step labels

use tracing::{debug, info};
use verdant_types::{
    Catalog, FeatureTable, FilledTable, LOAD_CODE, PipelineError, Result, column_name,
};

pub const GREEN_ENERGY_SUFFIX: &str = "green_energy";
pub const SURPLUS_SUFFIX: &str = "surplus";

/// `{country}_B..` column of a catalog country
fn is_generation_column(name: &str, catalog: &Catalog) -> Option<bool> {
    let (country, code) = name.split_once('_')?;
    let is_generation =
        code.starts_with('B') && catalog.countries.iter().any(|c| c == country);
    is_generation.then(|| catalog.is_renewable(code))
}

/// Replace each country's generation-by-fuel columns with
/// `{country}_green_energy` (sum of renewable columns) and
/// `{country}_surplus` (green energy minus load).
///
/// Only `load`, `green_energy` and `surplus` remain per country.
pub fn derive_features(table: FilledTable, catalog: &Catalog) -> Result<FilledTable> {
    let mut table = table;
    table.retain_columns(|name| is_generation_column(name, catalog) != Some(false));

    for country in &catalog.countries {
        let load = table.require(&column_name(country, LOAD_CODE))?;

        let mut green = vec![0.0; table.len()];
        for code in &catalog.renewable_codes {
            let cells = table.require(&column_name(country, code))?;
            for (total, value) in green.iter_mut().zip(cells) {
                *total += value;
            }
        }

        let surplus: Vec<f64> = green.iter().zip(load).map(|(g, l)| g - l).collect();
        table.insert_column(column_name(country, GREEN_ENERGY_SUFFIX), green)?;
        table.insert_column(column_name(country, SURPLUS_SUFFIX), surplus)?;
    }

    table.retain_columns(|name| is_generation_column(name, catalog).is_none());
    info!(
        "Derived features for {} countries: {} columns",
        catalog.countries.len(),
        table.column_count()
    );
    Ok(table)
}

/// Label each row with the class id of the country whose surplus is largest
/// in the following row, then drop the last row.
///
/// Ties go to the country with the lexicographically smallest code.
pub fn derive_labels(table: FilledTable, catalog: &Catalog) -> Result<FeatureTable> {
    let rows = table.len();
    if rows < 2 {
        return Err(PipelineError::EmptyInput(format!(
            "labels need at least two rows, table has {rows}"
        )));
    }

    let labels = {
        let candidates = catalog
            .sorted_countries()
            .into_iter()
            .map(|country| {
                Ok((
                    table.require(&column_name(country, SURPLUS_SUFFIX))?,
                    catalog.country_id(country)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        (1..rows)
            .map(|next| {
                candidates
                    .iter()
                    .fold(None, |best: Option<(f64, u32)>, (cells, id)| {
                        if best.is_some_and(|(top, _)| cells[next] <= top) {
                            best
                        } else {
                            Some((cells[next], *id))
                        }
                    })
                    .map(|(_, id)| id)
                    .ok_or_else(|| PipelineError::Config("catalog has no countries".to_owned()))
            })
            .collect::<Result<Vec<u32>>>()?
    };

    let mut table = table;
    table.truncate(rows - 1);
    debug!("Labelled {} rows", labels.len());
    FeatureTable::new(table, labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use verdant_types::TimeTable;

    fn hours(n: i64) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i)).collect()
    }

    fn catalog(countries: &[&str]) -> Catalog {
        let mut catalog = Catalog::default();
        catalog.countries = countries.iter().map(|c| (*c).to_owned()).collect();
        catalog
    }

    /// Complete table for `countries` with every generation column zero
    fn zero_table(countries: &[&str], rows: i64) -> FilledTable {
        let mut table: FilledTable = TimeTable::new(hours(rows));
        for country in countries {
            for code in Catalog::default().series_codes() {
                table
                    .insert_column(column_name(country, &code), vec![0.0; table.len()])
                    .unwrap();
            }
        }
        table
    }

    #[test]
    fn test_green_energy_and_surplus() {
        let mut table = zero_table(&["DE"], 2);
        table.insert_column("DE_B16", vec![10.0, 20.0]).unwrap();
        table.insert_column("DE_B18", vec![5.0, 5.0]).unwrap();
        table.insert_column("DE_B05", vec![100.0, 100.0]).unwrap();
        table.insert_column("DE_load", vec![12.0, 30.0]).unwrap();

        let features = derive_features(table, &catalog(&["DE"])).unwrap();
        assert_eq!(features.column("DE_green_energy").unwrap(), &[15.0, 25.0]);
        assert_eq!(features.column("DE_surplus").unwrap(), &[3.0, -5.0]);

        let names: Vec<&str> = features.column_names().collect();
        assert_eq!(names, vec!["DE_green_energy", "DE_load", "DE_surplus"]);
    }

    #[test]
    fn test_missing_load_is_schema_error() {
        let mut table = zero_table(&["DE"], 2);
        table.remove_column("DE_load");
        assert!(matches!(
            derive_features(table, &catalog(&["DE"])),
            Err(PipelineError::Schema(_))
        ));
    }

    fn surplus_table(rows: &[[f64; 3]]) -> FilledTable {
        let mut table: FilledTable = TimeTable::new(hours(rows.len() as i64));
        for (i, country) in ["DE", "NL", "SP"].iter().enumerate() {
            table
                .insert_column(
                    column_name(country, SURPLUS_SUFFIX),
                    rows.iter().map(|r| r[i]).collect(),
                )
                .unwrap();
        }
        table
    }

    #[test]
    fn test_label_is_next_row_maximum() {
        // DE=2, NL=8, SP=0
        let table = surplus_table(&[[0.0, 0.0, 0.0], [5.0, 9.0, 2.0], [1.0, 1.0, 7.0]]);
        let labelled = derive_labels(table, &catalog(&["DE", "NL", "SP"])).unwrap();

        assert_eq!(labelled.len(), 2);
        assert_eq!(labelled.labels, vec![8, 0]);
        assert_eq!(labelled.table.time(), &hours(2)[..]);
    }

    #[test]
    fn test_label_tie_goes_to_earliest_code() {
        let table = surplus_table(&[[0.0, 0.0, 0.0], [9.0, 9.0, 2.0], [4.0, 6.0, 6.0]]);
        let labelled = derive_labels(table, &catalog(&["SP", "NL", "DE"])).unwrap();
        assert_eq!(labelled.labels, vec![2, 8]);
    }

    #[test]
    fn test_single_row_cannot_be_labelled() {
        let table = surplus_table(&[[1.0, 2.0, 3.0]]);
        assert!(matches!(
            derive_labels(table, &catalog(&["DE", "NL", "SP"])),
            Err(PipelineError::EmptyInput(_))
        ));
    }
}
