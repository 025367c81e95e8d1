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

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use verdant_core::ProcessingConfig;
use verdant_dataset::WindowConfig;
use verdant_ingest::sources::{elexon, entsoe};
use verdant_types::Catalog;

/// Environment variable holding the ENTSO-E security token
pub const TOKEN_ENV: &str = "ENTSOE_API_TOKEN";

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote series sources
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Countries, bidding zones, class ids and code tables
    #[serde(default)]
    pub catalog: Catalog,

    /// Grid and resampling resolutions
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Window batching for training and prediction
    #[serde(default)]
    pub dataset: WindowConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_entsoe_url")]
    pub entsoe_url: String,

    /// Falls back to `ENTSOE_API_TOKEN` when unset
    #[serde(default)]
    pub entsoe_token: Option<String>,

    #[serde(default = "default_elexon_url")]
    pub elexon_url: String,

    /// Fetch `UK` from Elexon instead of ENTSO-E
    #[serde(default = "default_use_elexon_for_uk")]
    pub use_elexon_for_uk: bool,

    #[serde(default = "default_max_concurrent_countries")]
    pub max_concurrent_countries: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_entsoe_url() -> String {
    entsoe::DEFAULT_URL.to_owned()
}

fn default_elexon_url() -> String {
    elexon::DEFAULT_URL.to_owned()
}

fn default_use_elexon_for_uk() -> bool {
    true
}

fn default_max_concurrent_countries() -> usize {
    4
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            entsoe_url: default_entsoe_url(),
            entsoe_token: None,
            elexon_url: default_elexon_url(),
            use_elexon_for_uk: default_use_elexon_for_uk(),
            max_concurrent_countries: default_max_concurrent_countries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The configured token, or the environment one
    pub fn entsoe_token(&self) -> Result<String> {
        if let Some(token) = &self.entsoe_token
            && !token.is_empty()
        {
            return Ok(token.clone());
        }
        std::env::var(TOKEN_ENV).with_context(|| {
            format!("No ENTSO-E token: set sources.entsoe_token or {TOKEN_ENV}")
        })
    }
}

impl AppConfig {
    /// Load from a TOML file, or defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("{} not found, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let config = Self::from_file(path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.entsoe_url.is_empty() {
            anyhow::bail!("sources.entsoe_url cannot be empty");
        }
        if self.sources.use_elexon_for_uk && self.sources.elexon_url.is_empty() {
            anyhow::bail!("sources.elexon_url cannot be empty when use_elexon_for_uk is set");
        }
        if self.sources.max_concurrent_countries == 0 {
            anyhow::bail!("sources.max_concurrent_countries must be at least 1");
        }
        if self.sources.request_timeout_secs == 0 {
            anyhow::bail!("sources.request_timeout_secs must be positive");
        }

        self.catalog.validate().context("Invalid [catalog]")?;
        self.processing.validate().context("Invalid [processing]")?;
        self.dataset
            .validate(&self.catalog)
            .context("Invalid [dataset]")?;
        Ok(())
    }
}
