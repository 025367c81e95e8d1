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

//! Immutable lookup tables: countries, bidding zones, fuel types and class ids
//!
//! A [`Catalog`] is built once per run (from defaults or the `[catalog]` config
//! section), validated, and then shared read-only by every stage.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Series code of the per-country load column
pub const LOAD_CODE: &str = "load";

/// Fuel-type mapping sentinel for flows that are not generation by fuel
pub const NOT_APPLICABLE: &str = "nil";

/// Number of production-type codes (`B01`..`B24`)
pub const GENERATION_CODE_COUNT: u32 = 24;

/// Measurement unit every series must be declared in (megawatts)
pub const DEFAULT_UNIT: &str = "MAW";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    /// Country codes ingested on every run
    pub countries: Vec<String>,

    /// Country code -> ENTSO-E bidding zone (EIC code)
    pub regions: BTreeMap<String, String>,

    /// Country code -> label class id
    pub country_ids: BTreeMap<String, u32>,

    /// Production-type codes that count towards green energy
    pub renewable_codes: Vec<String>,

    /// JSON fuel-type name -> production-type code (or [`NOT_APPLICABLE`])
    pub fuel_types: BTreeMap<String, String>,

    pub expected_unit: String,
}

impl Default for Catalog {
    fn default() -> Self {
        let countries = ["SP", "UK", "DE", "DK", "HU", "SE", "IT", "PO", "NL"];

        let regions = [
            ("SP", "10YES-REE------0"),
            ("UK", "10Y1001A1001A92E"),
            ("DE", "10Y1001A1001A83F"),
            ("DK", "10Y1001A1001A65H"),
            ("HU", "10YHU-MAVIR----U"),
            ("SE", "10YSE-1--------K"),
            ("IT", "10YIT-GRTN-----B"),
            ("PO", "10YPL-AREA-----S"),
            ("NL", "10YNL----------L"),
        ];

        let country_ids = [
            ("SP", 0),
            ("UK", 1),
            ("DE", 2),
            ("DK", 3),
            ("SE", 4),
            ("HU", 5),
            ("IT", 6),
            ("PO", 7),
            ("NL", 8),
        ];

        let renewable_codes = [
            "B01", "B09", "B10", "B11", "B12", "B13", "B15", "B16", "B18", "B19",
        ];

        let fuel_types = [
            ("BIOMASS", "B01"),
            ("CCGT", "B03"),
            ("COAL", "B05"),
            ("INTELEC", NOT_APPLICABLE),
            ("INTEW", NOT_APPLICABLE),
            ("INTFR", NOT_APPLICABLE),
            ("INTIFA2", NOT_APPLICABLE),
            ("INTIRL", NOT_APPLICABLE),
            ("INTNED", NOT_APPLICABLE),
            ("INTNEM", NOT_APPLICABLE),
            ("INTNSL", NOT_APPLICABLE),
            ("INTVKL", NOT_APPLICABLE),
            ("NPSHYD", "B11"),
            ("NUCLEAR", "B14"),
            ("OCGT", "B07"),
            ("OIL", "B06"),
            ("OTHER", "B20"),
            ("PS", "B10"),
            ("WIND", "B18"),
        ];

        Self {
            countries: countries.iter().map(|c| (*c).to_owned()).collect(),
            regions: regions
                .iter()
                .map(|(c, r)| ((*c).to_owned(), (*r).to_owned()))
                .collect(),
            country_ids: country_ids
                .iter()
                .map(|(c, id)| ((*c).to_owned(), *id))
                .collect(),
            renewable_codes: renewable_codes.iter().map(|c| (*c).to_owned()).collect(),
            fuel_types: fuel_types
                .iter()
                .map(|(f, c)| ((*f).to_owned(), (*c).to_owned()))
                .collect(),
            expected_unit: DEFAULT_UNIT.to_owned(),
        }
    }
}

impl Catalog {
    /// Check internal consistency. Called once after construction or config load.
    pub fn validate(&self) -> Result<()> {
        if self.countries.is_empty() {
            return Err(PipelineError::Config("catalog has no countries".to_owned()));
        }

        let mut seen_countries = BTreeSet::new();
        let mut seen_ids = BTreeSet::new();
        for country in &self.countries {
            if !seen_countries.insert(country.as_str()) {
                return Err(PipelineError::Config(format!(
                    "country {country} is listed twice"
                )));
            }
            if country.contains('_') {
                return Err(PipelineError::Config(format!(
                    "country code {country} must not contain '_'"
                )));
            }
            if !self.regions.contains_key(country) {
                return Err(PipelineError::Config(format!(
                    "country {country} has no region"
                )));
            }
            let id = self.country_id(country)?;
            if id as usize >= self.countries.len() {
                return Err(PipelineError::Config(format!(
                    "class id {id} of {country} is out of range for {} countries",
                    self.countries.len()
                )));
            }
            if !seen_ids.insert(id) {
                return Err(PipelineError::Config(format!(
                    "class id {id} is assigned to more than one country"
                )));
            }
        }

        for code in &self.renewable_codes {
            if !self.generation_codes().contains(code) {
                return Err(PipelineError::Config(format!(
                    "renewable code {code} is not a known production type"
                )));
            }
        }

        Ok(())
    }

    /// Production-type codes `B01`..`B24`
    pub fn generation_codes(&self) -> Vec<String> {
        (1..=GENERATION_CODE_COUNT)
            .map(|i| format!("B{i:02}"))
            .collect()
    }

    /// Every series code a country carries: the 24 production types plus `load`
    pub fn series_codes(&self) -> Vec<String> {
        let mut codes = self.generation_codes();
        codes.push(LOAD_CODE.to_owned());
        codes
    }

    pub fn is_renewable(&self, code: &str) -> bool {
        self.renewable_codes.iter().any(|c| c == code)
    }

    /// Countries in ascending code order, the order columns are laid out in
    pub fn sorted_countries(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.countries.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted
    }

    pub fn region(&self, country: &str) -> Result<&str> {
        self.regions
            .get(country)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::Config(format!("no region for country {country}")))
    }

    pub fn country_id(&self, country: &str) -> Result<u32> {
        self.country_ids
            .get(country)
            .copied()
            .ok_or_else(|| PipelineError::Config(format!("no class id for country {country}")))
    }

    /// Number of label classes
    pub fn num_classes(&self) -> usize {
        self.countries.len()
    }

    /// Map a JSON fuel-type name to its production-type code.
    ///
    /// Returns `Ok(None)` for interconnector flows mapped to [`NOT_APPLICABLE`],
    /// and a protocol error for names the table does not know.
    pub fn map_fuel_type(&self, fuel_type: &str) -> Result<Option<&str>> {
        match self.fuel_types.get(fuel_type).map(String::as_str) {
            Some(NOT_APPLICABLE) => Ok(None),
            Some(code) => Ok(Some(code)),
            None => Err(PipelineError::Protocol(format!(
                "unknown fuel type {fuel_type}"
            ))),
        }
    }
}

/// Wide-table column name for a country's series
pub fn column_name(country: &str, code: &str) -> String {
    format!("{country}_{code}")
}
