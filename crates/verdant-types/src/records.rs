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

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

/// Which family of series a payload carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Load,
    Generation,
}

impl SeriesKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Generation => "generation",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One observation as it comes out of a parser
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeriesRecord {
    pub time: DateTime<Utc>,
    pub unit: String,
    pub series_type: String,
    pub quantity: f64,
}

/// Time-ordered observations of a single series.
///
/// Inserting a timestamp that is already present keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesTable {
    points: BTreeMap<DateTime<Utc>, f64>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the timestamp was already taken
    pub fn insert(&mut self, time: DateTime<Utc>, quantity: f64) -> bool {
        match self.points.entry(time) {
            Entry::Vacant(slot) => {
                slot.insert(quantity);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Fold another table in. Timestamps already present here win.
    pub fn merge(&mut self, other: &SeriesTable) {
        for (time, quantity) in other.iter() {
            self.insert(time, quantity);
        }
    }

    pub fn get(&self, time: &DateTime<Utc>) -> Option<f64> {
        self.points.get(time).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.points.iter().map(|(t, q)| (*t, *q))
    }

    /// First and last observed timestamp
    pub fn bounds(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.points.keys().next()?;
        let last = self.points.keys().next_back()?;
        Some((*first, *last))
    }
}

impl FromIterator<(DateTime<Utc>, f64)> for SeriesTable {
    fn from_iter<I: IntoIterator<Item = (DateTime<Utc>, f64)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (time, quantity) in iter {
            table.insert(time, quantity);
        }
        table
    }
}

/// A parsed series tagged with the country and series code it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct CountrySeries {
    pub country: String,
    pub code: String,
    pub table: SeriesTable,
}

impl CountrySeries {
    pub fn new(country: impl Into<String>, code: impl Into<String>, table: SeriesTable) -> Self {
        Self {
            country: country.into(),
            code: code.into(),
            table,
        }
    }

    pub fn column_name(&self) -> String {
        crate::catalog::column_name(&self.country, &self.code)
    }
}
