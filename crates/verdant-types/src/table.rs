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

//! Column-oriented tables keyed by a shared time axis
//!
//! Columns are kept in ascending name order, which is also the order they are
//! persisted in. Every column has exactly one cell per timestamp.

use crate::error::{PipelineError, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub const TIME_COLUMN: &str = "Time";
pub const LABEL_COLUMN: &str = "label";

#[derive(Debug, Clone, PartialEq)]
pub struct TimeTable<T> {
    time: Vec<DateTime<Utc>>,
    columns: BTreeMap<String, Vec<T>>,
}

/// Table with a typed missing marker, produced by alignment and resampling
pub type WideTable = TimeTable<Option<f64>>;

/// Table with every cell present, produced by gap filling
pub type FilledTable = TimeTable<f64>;

impl<T: Clone> TimeTable<T> {
    pub fn new(time: Vec<DateTime<Utc>>) -> Self {
        Self {
            time,
            columns: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &[DateTime<Utc>] {
        &self.time
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Column names in ascending order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[T]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Like [`Self::column`] but a missing column is a schema violation
    pub fn require(&self, name: &str) -> Result<&[T]> {
        self.column(name)
            .ok_or_else(|| PipelineError::Schema(format!("missing column {name}")))
    }

    /// Add or replace a column. Its length must match the time axis.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<T>) -> Result<()> {
        let name = name.into();
        if values.len() != self.time.len() {
            return Err(PipelineError::Schema(format!(
                "column {name} has {} cells, table has {} rows",
                values.len(),
                self.time.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<T>> {
        self.columns.remove(name)
    }

    /// Keep only the columns for which `keep` returns true
    pub fn retain_columns(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.columns.retain(|name, _| keep(name));
    }

    /// Apply `f` to every cell, keeping the time axis and column names
    pub fn map_cells<U: Clone>(&self, mut f: impl FnMut(&T) -> U) -> TimeTable<U> {
        TimeTable {
            time: self.time.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values.iter().map(&mut f).collect()))
                .collect(),
        }
    }

    /// Apply `f` to each whole column
    pub fn map_columns<U: Clone>(&self, mut f: impl FnMut(&str, &[T]) -> Vec<U>) -> TimeTable<U> {
        TimeTable {
            time: self.time.clone(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), f(name, values)))
                .collect(),
        }
    }

    /// Drop every row past the first `len`
    pub fn truncate(&mut self, len: usize) {
        self.time.truncate(len);
        for values in self.columns.values_mut() {
            values.truncate(len);
        }
    }

    /// The last `n` rows (all rows if the table is shorter)
    pub fn tail(&self, n: usize) -> Self {
        let skip = self.len().saturating_sub(n);
        Self {
            time: self.time[skip..].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|(name, values)| (name.clone(), values[skip..].to_vec()))
                .collect(),
        }
    }
}

/// Processed table with its per-row class label
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub table: FilledTable,
    pub labels: Vec<u32>,
}

impl FeatureTable {
    pub fn new(table: FilledTable, labels: Vec<u32>) -> Result<Self> {
        if table.len() != labels.len() {
            return Err(PipelineError::Schema(format!(
                "{} labels for {} rows",
                labels.len(),
                table.len()
            )));
        }
        Ok(Self { table, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn tail(&self, n: usize) -> Self {
        let skip = self.len().saturating_sub(n);
        Self {
            table: self.table.tail(n),
            labels: self.labels[skip..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hours(n: i64) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| start + Duration::hours(i)).collect()
    }

    #[test]
    fn test_columns_are_sorted() {
        let mut table: FilledTable = TimeTable::new(hours(2));
        table.insert_column("UK_load", vec![1.0, 2.0]).unwrap();
        table.insert_column("DE_load", vec![3.0, 4.0]).unwrap();
        table.insert_column("DE_B01", vec![5.0, 6.0]).unwrap();

        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["DE_B01", "DE_load", "UK_load"]);
    }

    #[test]
    fn test_insert_rejects_wrong_length() {
        let mut table: WideTable = TimeTable::new(hours(3));
        let result = table.insert_column("DE_load", vec![Some(1.0)]);
        assert!(matches!(result, Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_require_missing_column() {
        let table: FilledTable = TimeTable::new(hours(1));
        assert!(table.require("NL_load").is_err());
    }

    #[test]
    fn test_tail_and_truncate() {
        let mut table: FilledTable = TimeTable::new(hours(4));
        table
            .insert_column("DE_load", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap();

        let tail = table.tail(2);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail.column("DE_load").unwrap(), &[3.0, 4.0]);
        assert_eq!(tail.time()[0], hours(4)[2]);
        assert_eq!(table.tail(10).len(), 4);

        table.truncate(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("DE_load").unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_feature_table_label_count() {
        let table: FilledTable = TimeTable::new(hours(2));
        assert!(FeatureTable::new(table.clone(), vec![0]).is_err());

        let features = FeatureTable::new(table, vec![0, 1]).unwrap();
        assert_eq!(features.tail(1).labels, vec![1]);
    }
}
