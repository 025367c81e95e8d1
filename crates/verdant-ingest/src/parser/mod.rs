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

//! Series parser: raw payload bodies into per-code series tables

pub mod json;
pub mod xml;

use crate::sources::{PayloadFormat, Payloads};
use std::collections::BTreeMap;
use tracing::{debug, info};
use verdant_types::{Catalog, RawSeriesRecord, Result, SeriesKind, SeriesTable};

/// Parse a batch of payloads of one kind and group the records by series code
pub fn parse_payloads(
    payloads: &Payloads,
    kind: SeriesKind,
    catalog: &Catalog,
) -> Result<BTreeMap<String, SeriesTable>> {
    let mut records = Vec::new();
    for body in &payloads.bodies {
        let mut parsed = match payloads.format {
            PayloadFormat::Xml => xml::parse_document(body, kind, &catalog.expected_unit)?,
            PayloadFormat::Json => json::parse_document(body, kind, catalog)?,
        };
        debug!("Parsed {} {kind} records from one payload", parsed.len());
        records.append(&mut parsed);
    }

    let grouped = group_records(records);
    info!(
        "Parsed {kind}: {} payloads, {} series",
        payloads.bodies.len(),
        grouped.len()
    );
    Ok(grouped)
}

/// Group records by series code. Within a code the first record seen for a
/// timestamp wins.
pub fn group_records(
    records: impl IntoIterator<Item = RawSeriesRecord>,
) -> BTreeMap<String, SeriesTable> {
    let mut grouped: BTreeMap<String, SeriesTable> = BTreeMap::new();
    for record in records {
        grouped
            .entry(record.series_type)
            .or_default()
            .insert(record.time, record.quantity);
    }
    grouped
}
