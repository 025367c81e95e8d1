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

//! Stage composition from ingested series to the labelled feature table

use crate::align::align;
use crate::features::{derive_features, derive_labels};
use crate::resample::{downsample, fill_gaps};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::info;
use verdant_types::{Catalog, CountrySeries, FeatureTable, PipelineError, Result, WideTable};

/// Resolutions of the ingested grid and of the processed table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    #[serde(default = "default_ingest_resolution_minutes")]
    pub ingest_resolution_minutes: u32,
    #[serde(default = "default_target_resolution_minutes")]
    pub target_resolution_minutes: u32,
}

fn default_ingest_resolution_minutes() -> u32 {
    15
}

fn default_target_resolution_minutes() -> u32 {
    60
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            ingest_resolution_minutes: default_ingest_resolution_minutes(),
            target_resolution_minutes: default_target_resolution_minutes(),
        }
    }
}

impl ProcessingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ingest_resolution_minutes == 0 || self.target_resolution_minutes == 0 {
            return Err(PipelineError::Config(
                "resolutions must be positive".to_owned(),
            ));
        }
        if self
            .target_resolution_minutes
            .checked_rem(self.ingest_resolution_minutes)
            != Some(0)
        {
            return Err(PipelineError::Config(format!(
                "target resolution {} min is not a multiple of ingest resolution {} min",
                self.target_resolution_minutes, self.ingest_resolution_minutes
            )));
        }
        Ok(())
    }

    pub fn ingest_resolution(&self) -> Duration {
        Duration::minutes(i64::from(self.ingest_resolution_minutes))
    }

    pub fn target_resolution(&self) -> Duration {
        Duration::minutes(i64::from(self.target_resolution_minutes))
    }

    /// Ingest rows per resampled row
    pub fn block_size(&self) -> Result<usize> {
        self.validate()?;
        let ratio = self
            .target_resolution_minutes
            .checked_div(self.ingest_resolution_minutes)
            .unwrap_or(1);
        usize::try_from(ratio).map_err(|_| PipelineError::Config("block size overflow".to_owned()))
    }
}

/// Align ingested series onto the ingest grid with the complete column set
pub fn build_wide_table(
    series: &[CountrySeries],
    catalog: &Catalog,
    config: &ProcessingConfig,
) -> Result<WideTable> {
    config.validate()?;
    align(series, catalog, config.ingest_resolution())
}

/// Downsample, interpolate, zero-fill, derive features, derive labels
pub fn process(wide: &WideTable, catalog: &Catalog, config: &ProcessingConfig) -> Result<FeatureTable> {
    let resampled = downsample(wide, config.block_size()?, config.target_resolution())?;
    let filled = fill_gaps(&resampled);
    let features = derive_features(filled, catalog)?;
    let labelled = derive_labels(features, catalog)?;

    info!(
        "Processed {} raw rows into {} labelled rows",
        wide.len(),
        labelled.len()
    );
    Ok(labelled)
}

/// How much of a processed table to keep as the test subset
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubsetSize {
    Rows(usize),
    Fraction(f64),
}

impl Default for SubsetSize {
    fn default() -> Self {
        Self::Fraction(0.2)
    }
}

impl SubsetSize {
    /// Parse a CLI value: an integer is a row count, anything in `(0, 1)` a fraction
    pub fn parse(raw: &str) -> Result<Self> {
        if let Ok(rows) = raw.parse::<usize>() {
            return Ok(Self::Rows(rows));
        }
        raw.parse::<f64>()
            .ok()
            .filter(|fraction| *fraction > 0.0 && *fraction < 1.0)
            .map(Self::Fraction)
            .ok_or_else(|| {
                PipelineError::Config(format!(
                    "subset size {raw} is neither a row count nor a fraction in (0, 1)"
                ))
            })
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn rows(self, total: usize) -> usize {
        match self {
            Self::Rows(rows) => rows.min(total),
            Self::Fraction(fraction) => ((total as f64) * fraction).floor() as usize,
        }
    }
}

/// The trailing rows of `features` used for evaluation
pub fn test_subset(features: &FeatureTable, size: SubsetSize) -> FeatureTable {
    let rows = size.rows(features.len());
    info!("Keeping the last {rows} of {} rows", features.len());
    features.tail(rows)
}
