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

//! Parsed payloads through alignment, processing and persistence

use chrono::{DateTime, Duration, TimeZone, Utc};
use verdant_core::store::{load_features, load_wide, save_features, save_wide};
use verdant_core::{ProcessingConfig, build_wide_table, process};
use verdant_ingest::{PayloadFormat, Payloads, parse_payloads};
use verdant_types::{Catalog, CountrySeries, SeriesKind};

fn catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.countries = vec!["DE".to_owned(), "NL".to_owned()];
    catalog
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap()
}

/// One XML document with a single 15-minute series
fn document(psr_type: Option<&str>, quantities: &[f64]) -> String {
    let psr = psr_type
        .map(|code| format!("<MktPSRType><psrType>{code}</psrType></MktPSRType>"))
        .unwrap_or_default();
    let points: String = quantities
        .iter()
        .enumerate()
        .map(|(i, q)| format!("<Point><position>{}</position><quantity>{q}</quantity></Point>", i + 1))
        .collect();
    format!(
        "<GL_MarketDocument><TimeSeries>\
         <quantity_Measure_Unit.name>MAW</quantity_Measure_Unit.name>{psr}\
         <Period><timeInterval><start>2022-01-01T00:00Z</start></timeInterval>\
         <resolution>PT15M</resolution>{points}</Period>\
         </TimeSeries></GL_MarketDocument>"
    )
}

fn ingest(country: &str, kind: SeriesKind, body: String, catalog: &Catalog) -> Vec<CountrySeries> {
    let payloads = Payloads {
        format: PayloadFormat::Xml,
        bodies: vec![body],
    };
    parse_payloads(&payloads, kind, catalog)
        .unwrap()
        .into_iter()
        .map(|(code, table)| CountrySeries::new(country, code, table))
        .collect()
}

/// Three hours of data: DE solar rises while NL wind falls
fn ingested(catalog: &Catalog) -> Vec<CountrySeries> {
    let mut series = Vec::new();
    series.extend(ingest("DE", SeriesKind::Load, document(None, &[10.0; 12]), catalog));
    series.extend(ingest(
        "DE",
        SeriesKind::Generation,
        document(
            Some("B16"),
            &[0.0, 0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 10.0, 30.0, 30.0, 30.0, 30.0],
        ),
        catalog,
    ));
    series.extend(ingest("NL", SeriesKind::Load, document(None, &[5.0; 12]), catalog));
    series.extend(ingest(
        "NL",
        SeriesKind::Generation,
        document(
            Some("B19"),
            &[20.0, 20.0, 20.0, 20.0, 8.0, 8.0, 8.0, 8.0, 0.0, 0.0, 0.0, 0.0],
        ),
        catalog,
    ));
    series
}

#[test]
fn test_wide_table_has_complete_schema() {
    let catalog = catalog();
    let wide = build_wide_table(&ingested(&catalog), &catalog, &ProcessingConfig::default()).unwrap();

    assert_eq!(wide.len(), 12);
    assert_eq!(wide.column_count(), 50);
    assert_eq!(wide.time()[11], start() + Duration::minutes(165));
    assert!(wide.column("NL_B01").unwrap().iter().all(Option::is_none));
}

#[test]
fn test_process_labels_next_hour_leader() {
    let catalog = catalog();
    let wide = build_wide_table(&ingested(&catalog), &catalog, &ProcessingConfig::default()).unwrap();
    let features = process(&wide, &catalog, &ProcessingConfig::default()).unwrap();

    // Hourly surpluses: DE -10, 0, 20 / NL 15, 3, -5
    assert_eq!(features.len(), 2);
    assert_eq!(features.table.column("DE_surplus").unwrap(), &[-10.0, 0.0]);
    assert_eq!(features.table.column("NL_surplus").unwrap(), &[15.0, 3.0]);
    assert_eq!(features.table.column("NL_green_energy").unwrap(), &[20.0, 8.0]);
    // Row 0 looks at hour 1 (NL leads), row 1 at hour 2 (DE leads)
    assert_eq!(features.labels, vec![8, 2]);

    let names: Vec<&str> = features.table.column_names().collect();
    assert_eq!(
        names,
        vec![
            "DE_green_energy",
            "DE_load",
            "DE_surplus",
            "NL_green_energy",
            "NL_load",
            "NL_surplus"
        ]
    );
    assert_eq!(features.table.time()[1], start() + Duration::hours(1));
}

#[test]
fn test_persisted_tables_round_trip() {
    let catalog = catalog();
    let config = ProcessingConfig::default();
    let wide = build_wide_table(&ingested(&catalog), &catalog, &config).unwrap();
    let features = process(&wide, &catalog, &config).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("raw_data.csv");
    let processed_path = dir.path().join("processed_data.csv");

    save_wide(&raw_path, &wide).unwrap();
    save_features(&processed_path, &features).unwrap();

    let wide_back = load_wide(&raw_path).unwrap();
    assert_eq!(wide_back, wide);
    assert_eq!(
        wide_back.column_names().collect::<Vec<_>>(),
        wide.column_names().collect::<Vec<_>>()
    );

    let features_back = load_features(&processed_path).unwrap();
    assert_eq!(features_back, features);

    let reprocessed = process(&wide_back, &catalog, &config).unwrap();
    assert_eq!(reprocessed, features);
}
