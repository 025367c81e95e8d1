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

//! Sequence classifier contract and the prediction sink

use crate::window::WindowDataset;
use serde::{Deserialize, Serialize, Serializer};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;
use verdant_types::{PipelineError, Result};

/// A classifier over window batches
pub trait SequenceModel: Send + Sync {
    /// Fit on every labelled batch of `dataset`
    fn train(&mut self, dataset: &WindowDataset) -> Result<()>;

    /// One class id per window, at most `dataset.len()` of them
    fn predict(&self, dataset: &WindowDataset) -> Result<Vec<u32>>;

    fn save(&self, path: &Path) -> Result<()>;

    fn load(path: &Path) -> Result<Self>
    where
        Self: Sized;

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Predicts the country with the largest surplus at the last row of the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceBaseline {
    #[serde(default = "default_surplus_suffix")]
    pub surplus_suffix: String,
}

fn default_surplus_suffix() -> String {
    "_surplus".to_owned()
}

impl Default for PersistenceBaseline {
    fn default() -> Self {
        Self {
            surplus_suffix: default_surplus_suffix(),
        }
    }
}

impl PersistenceBaseline {
    /// Feature index of the surplus column of each country in use
    fn surplus_positions(&self, dataset: &WindowDataset) -> Result<Vec<usize>> {
        (0..dataset.countries_in_use().len())
            .map(|index| {
                dataset
                    .feature_columns(index)
                    .and_then(|columns| {
                        columns
                            .iter()
                            .position(|name| name.ends_with(self.surplus_suffix.as_str()))
                    })
                    .ok_or_else(|| {
                        PipelineError::Config(format!(
                            "{} is not among the selected features of {}",
                            self.surplus_suffix,
                            dataset.countries_in_use()[index]
                        ))
                    })
            })
            .collect()
    }
}

impl SequenceModel for PersistenceBaseline {
    fn train(&mut self, dataset: &WindowDataset) -> Result<()> {
        self.surplus_positions(dataset)?;
        info!(
            "{} has nothing to fit ({} rows)",
            self.name(),
            dataset.len()
        );
        Ok(())
    }

    fn predict(&self, dataset: &WindowDataset) -> Result<Vec<u32>> {
        let positions = self.surplus_positions(dataset)?;
        let classes = dataset.country_classes();
        let last = dataset.window_size() - 1;

        let mut predictions = Vec::with_capacity(dataset.len());
        for batch in dataset.whole(false) {
            for sample in 0..batch.len() {
                let mut best: Option<(f64, u32)> = None;
                for (country, position) in positions.iter().enumerate() {
                    let surplus = batch.inputs[[sample, country, last, *position]];
                    if best.is_none_or(|(top, _)| surplus > top) {
                        best = Some((surplus, classes[country]));
                    }
                }
                if let Some((_, class)) = best {
                    predictions.push(class);
                }
            }
        }
        predictions.truncate(dataset.len());

        info!("{} predicted {} windows", self.name(), predictions.len());
        Ok(predictions)
    }

    fn save(&self, path: &Path) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn name(&self) -> &str {
        "persistence-baseline"
    }
}

#[derive(Serialize)]
struct Predictions<'a> {
    #[serde(serialize_with = "serialize_by_index")]
    target: &'a [u32],
}

fn serialize_by_index<S: Serializer>(
    values: &&[u32],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_map(values.iter().enumerate())
}

/// Write `{"target": {"0": id, "1": id, ...}}`
pub fn write_predictions(path: &Path, predictions: &[u32]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(
        writer,
        &Predictions {
            target: predictions,
        },
    )?;
    info!("Wrote {} predictions to {}", predictions.len(), path.display());
    Ok(())
}
