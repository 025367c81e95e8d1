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

//! Elexon BMRS responses (demand outturn and generation outturn summary)

use super::xml::parse_timestamp;
use serde::Deserialize;
use verdant_types::{Catalog, LOAD_CODE, PipelineError, RawSeriesRecord, Result, SeriesKind};

#[derive(Debug, Deserialize)]
struct DemandResponse {
    data: Vec<DemandEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemandEntry {
    start_time: String,
    initial_demand_outturn: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationInterval {
    start_time: String,
    data: Vec<FuelEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuelEntry {
    fuel_type: String,
    generation: f64,
}

/// Parse one JSON body into records tagged with the catalog's expected unit.
///
/// Fuel types mapped to the not-applicable sentinel are skipped; unknown fuel
/// types are a protocol error.
pub fn parse_document(
    body: &str,
    kind: SeriesKind,
    catalog: &Catalog,
) -> Result<Vec<RawSeriesRecord>> {
    match kind {
        SeriesKind::Load => parse_demand(body, &catalog.expected_unit),
        SeriesKind::Generation => parse_generation(body, catalog),
    }
}

fn parse_demand(body: &str, unit: &str) -> Result<Vec<RawSeriesRecord>> {
    let response: DemandResponse = serde_json::from_str(body)
        .map_err(|e| PipelineError::Protocol(format!("malformed demand payload: {e}")))?;

    response
        .data
        .into_iter()
        .map(|entry| {
            Ok(RawSeriesRecord {
                time: parse_timestamp(&entry.start_time)?,
                unit: unit.to_owned(),
                series_type: LOAD_CODE.to_owned(),
                quantity: entry.initial_demand_outturn,
            })
        })
        .collect()
}

fn parse_generation(body: &str, catalog: &Catalog) -> Result<Vec<RawSeriesRecord>> {
    let intervals: Vec<GenerationInterval> = serde_json::from_str(body)
        .map_err(|e| PipelineError::Protocol(format!("malformed generation payload: {e}")))?;

    let mut records = Vec::new();
    for interval in intervals {
        let time = parse_timestamp(&interval.start_time)?;
        for entry in interval.data {
            let Some(code) = catalog.map_fuel_type(&entry.fuel_type)? else {
                continue;
            };
            records.push(RawSeriesRecord {
                time,
                unit: catalog.expected_unit.clone(),
                series_type: code.to_owned(),
                quantity: entry.generation,
            });
        }
    }

    Ok(records)
}
