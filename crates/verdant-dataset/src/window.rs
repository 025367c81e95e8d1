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

//! Sliding-window batches over a processed table
//!
//! The table is augmented with cyclical time columns and `W - 1` leading zero
//! rows, then split into one projection per country. Augmented row `e` is
//! original row `e - (W - 1)`. A window ending at `e` covers augmented rows
//! `e - W + 1 ..= e`.

use crate::cyclical::{CYCLICAL_COLUMNS, encode};
use ndarray::{Array2, Array4, s};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verdant_types::{Catalog, FeatureTable, PipelineError, Result};

/// Batch geometry and feature selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Countries stacked into each sample, in tensor order
    #[serde(default = "default_countries_in_use")]
    pub countries_in_use: Vec<String>,

    /// Column suffixes selected per country, in feature order
    #[serde(default = "default_features")]
    pub features: Vec<String>,

    #[serde(default = "default_validation_split")]
    pub validation_split: f64,
}

fn default_batch_size() -> usize {
    32
}

fn default_window_size() -> usize {
    24
}

fn default_countries_in_use() -> Vec<String> {
    Catalog::default().countries
}

fn default_features() -> Vec<String> {
    let mut features = vec!["_load".to_owned(), "_surplus".to_owned()];
    features.extend(CYCLICAL_COLUMNS.iter().map(|c| (*c).to_owned()));
    features
}

fn default_validation_split() -> f64 {
    0.2
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            window_size: default_window_size(),
            countries_in_use: default_countries_in_use(),
            features: default_features(),
            validation_split: default_validation_split(),
        }
    }
}

impl WindowConfig {
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        if self.batch_size == 0 {
            return Err(PipelineError::Config("batch_size must be positive".to_owned()));
        }
        if self.window_size == 0 {
            return Err(PipelineError::Config("window_size must be positive".to_owned()));
        }
        if self.countries_in_use.is_empty() {
            return Err(PipelineError::Config(
                "countries_in_use must name at least one country".to_owned(),
            ));
        }
        for country in &self.countries_in_use {
            if !catalog.countries.contains(country) {
                return Err(PipelineError::Config(format!(
                    "country {country} is not in the catalog"
                )));
            }
        }
        if self.features.is_empty() {
            return Err(PipelineError::Config("no features selected".to_owned()));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(PipelineError::Config(format!(
                "validation_split {} must be in [0, 1)",
                self.validation_split
            )));
        }
        Ok(())
    }
}

/// Whether batches carry labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Training,
    Inference,
}

/// One batch of samples
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `(samples, countries, window, features)`
    pub inputs: Array4<f64>,
    /// One-hot labels `(samples, classes)`, training only
    pub labels: Option<Array2<f64>>,
    /// Class ids matching `labels`, training only
    pub class_ids: Option<Vec<u32>>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.inputs.shape()[0]
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct WindowDataset {
    rows: usize,
    window_size: usize,
    batch_size: usize,
    num_classes: usize,
    phase: Phase,
    countries_in_use: Vec<String>,
    /// Class id of each country in use
    country_classes: Vec<u32>,
    /// Selected column names per country, in feature order
    feature_columns: Vec<Vec<String>>,
    /// Per country `(rows + W - 1, features)`
    projections: Vec<Array2<f64>>,
    labels: Vec<u32>,
}

/// Columns of `features` whose name ends with a selected suffix, suffix by
/// suffix, each column at most once
fn select_columns(available: &[String], suffixes: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for suffix in suffixes {
        for name in available {
            if name.ends_with(suffix.as_str()) && !selected.contains(name) {
                selected.push(name.clone());
            }
        }
    }
    selected
}

impl WindowDataset {
    pub fn new(
        features: &FeatureTable,
        config: &WindowConfig,
        catalog: &Catalog,
        phase: Phase,
    ) -> Result<Self> {
        config.validate(catalog)?;

        let rows = features.len();
        let pad = config.window_size - 1;
        let table = &features.table;

        let cyclical: Vec<[f64; 6]> = table.time().iter().map(|t| encode(*t)).collect();

        let num_classes = catalog.num_classes();
        if let Some((row, label)) = features
            .labels
            .iter()
            .enumerate()
            .find(|(_, label)| **label as usize >= num_classes)
        {
            return Err(PipelineError::Schema(format!(
                "label {label} at row {row} is outside the {num_classes} known classes"
            )));
        }

        let country_classes = config
            .countries_in_use
            .iter()
            .map(|country| catalog.country_id(country))
            .collect::<Result<Vec<u32>>>()?;

        let mut feature_columns = Vec::with_capacity(config.countries_in_use.len());
        let mut projections = Vec::with_capacity(config.countries_in_use.len());
        for country in &config.countries_in_use {
            let prefix = format!("{country}_");
            let mut available: Vec<String> = table
                .column_names()
                .filter(|name| name.starts_with(prefix.as_str()))
                .map(str::to_owned)
                .collect();
            available.extend(CYCLICAL_COLUMNS.iter().map(|c| (*c).to_owned()));

            let selected = select_columns(&available, &config.features);
            if selected.is_empty() {
                return Err(PipelineError::Config(format!(
                    "no selected feature matches a column of {country}"
                )));
            }
            if let Some(first) = feature_columns.first()
                && selected.len() != Vec::len(first)
            {
                return Err(PipelineError::Config(format!(
                    "{country} has {} selected features, {} expected",
                    selected.len(),
                    Vec::len(first)
                )));
            }

            let mut projection = Array2::<f64>::zeros((rows + pad, selected.len()));
            for (col, name) in selected.iter().enumerate() {
                if let Some(offset) = CYCLICAL_COLUMNS.iter().position(|c| c == name) {
                    for (row, encoded) in cyclical.iter().enumerate() {
                        projection[[row + pad, col]] = encoded[offset];
                    }
                } else {
                    let cells = table.require(name)?;
                    for (row, value) in cells.iter().enumerate() {
                        projection[[row + pad, col]] = *value;
                    }
                }
            }

            debug!("{country}: features {selected:?}");
            feature_columns.push(selected);
            projections.push(projection);
        }

        info!(
            "Window dataset: {rows} rows, {} countries, window {}, batch {}, {} features",
            config.countries_in_use.len(),
            config.window_size,
            config.batch_size,
            feature_columns.first().map_or(0, Vec::len)
        );

        Ok(Self {
            rows,
            window_size: config.window_size,
            batch_size: config.batch_size,
            num_classes,
            phase,
            countries_in_use: config.countries_in_use.clone(),
            country_classes,
            feature_columns,
            projections,
            labels: features.labels.clone(),
        })
    }

    /// Rows of the underlying table
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn countries_in_use(&self) -> &[String] {
        &self.countries_in_use
    }

    pub fn country_classes(&self) -> &[u32] {
        &self.country_classes
    }

    pub fn feature_count(&self) -> usize {
        self.feature_columns.first().map_or(0, Vec::len)
    }

    /// Selected column names of the `index`-th country in use
    pub fn feature_columns(&self, index: usize) -> Option<&[String]> {
        self.feature_columns.get(index).map(Vec::as_slice)
    }

    /// Samples produced for rows `[lo, hi)`: one fewer than the row count
    pub fn sample_count(&self, lo: usize, hi: usize) -> usize {
        hi.saturating_sub(lo).saturating_sub(1)
    }

    /// Batches over rows `[lo, hi)`. With `repeat` the range restarts from its
    /// first window forever.
    pub fn batches(&self, lo: usize, hi: usize, repeat: bool) -> Result<BatchIter<'_>> {
        if lo > hi || hi > self.rows {
            return Err(PipelineError::Config(format!(
                "row range {lo}..{hi} is outside 0..{}",
                self.rows
            )));
        }
        let first = lo + self.window_size;
        let end = hi + self.window_size - 1;
        Ok(BatchIter {
            dataset: self,
            first,
            end,
            next: first,
            repeat,
        })
    }

    pub fn whole(&self, repeat: bool) -> BatchIter<'_> {
        let first = self.window_size;
        BatchIter {
            dataset: self,
            first,
            end: self.rows + self.window_size - 1,
            next: first,
            repeat,
        }
    }

    /// Row index where the training part ends
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split_point(&self, validation_split: f64) -> usize {
        ((self.rows as f64) * (1.0 - validation_split)).floor() as usize
    }

    /// Training batches over `[0, cut)` and validation batches over `[cut, rows)`
    pub fn train_validation_split(
        &self,
        validation_split: f64,
        repeat: bool,
    ) -> Result<(BatchIter<'_>, BatchIter<'_>)> {
        if !(0.0..1.0).contains(&validation_split) {
            return Err(PipelineError::Config(format!(
                "validation_split {validation_split} must be in [0, 1)"
            )));
        }
        let cut = self.split_point(validation_split).min(self.rows);
        Ok((
            self.batches(0, cut, repeat)?,
            self.batches(cut, self.rows, repeat)?,
        ))
    }

    /// Build the batch of windows ending at augmented rows `[start, end)`
    fn batch(&self, start: usize, end: usize) -> Batch {
        let samples = end - start;
        let w = self.window_size;
        let mut inputs = Array4::<f64>::zeros((
            samples,
            self.projections.len(),
            w,
            self.feature_count(),
        ));

        for (i, e) in (start..end).enumerate() {
            for (c, projection) in self.projections.iter().enumerate() {
                inputs
                    .slice_mut(s![i, c, .., ..])
                    .assign(&projection.slice(s![e + 1 - w..=e, ..]));
            }
        }

        let (labels, class_ids) = match self.phase {
            Phase::Inference => (None, None),
            Phase::Training => {
                let pad = w - 1;
                let ids: Vec<u32> = (start..end).map(|e| self.labels[e - pad]).collect();
                let mut one_hot = Array2::<f64>::zeros((samples, self.num_classes));
                for (i, id) in ids.iter().enumerate() {
                    one_hot[[i, *id as usize]] = 1.0;
                }
                (Some(one_hot), Some(ids))
            }
        };

        Batch {
            inputs,
            labels,
            class_ids,
        }
    }
}

/// Iterator over the batches of one row range
#[derive(Debug, Clone)]
pub struct BatchIter<'a> {
    dataset: &'a WindowDataset,
    first: usize,
    end: usize,
    next: usize,
    repeat: bool,
}

impl Iterator for BatchIter<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        if self.first >= self.end {
            return None;
        }
        if self.next >= self.end {
            if !self.repeat {
                return None;
            }
            self.next = self.first;
        }

        let start = self.next;
        let stop = (start + self.dataset.batch_size).min(self.end);
        self.next = stop;
        Some(self.dataset.batch(start, stop))
    }
}
