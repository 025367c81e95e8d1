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

//! Paginated fetchers for the upstream electricity APIs

pub mod elexon;
pub mod entsoe;
pub mod window;

pub use elexon::ElexonSource;
pub use entsoe::EntsoeSource;
pub use window::{TimeRange, WindowStep, split_range};

use async_trait::async_trait;
use std::time::Duration;
use verdant_types::{PipelineError, Result, SeriesKind};

const USER_AGENT: &str = concat!("verdant/", env!("CARGO_PKG_VERSION"));

/// Wire format of a batch of payload bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Xml,
    Json,
}

/// Raw bodies collected for one entity and series kind, in request order
#[derive(Debug, Clone, PartialEq)]
pub struct Payloads {
    pub format: PayloadFormat,
    pub bodies: Vec<String>,
}

/// A paginated upstream source of load and generation series
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Fetch every window of `range` for `entity` (a bidding zone or country).
    /// Any unsuccessful response aborts the whole fetch.
    async fn fetch(&self, entity: &str, kind: SeriesKind, range: TimeRange) -> Result<Payloads>;

    /// Source name for logging
    fn name(&self) -> &str;
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))
}

/// GET `url` with `query` and return the body. Non-success statuses are fatal.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| PipelineError::Request {
            url: url.to_owned(),
            message: e.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::Transport {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| PipelineError::Request {
        url: url.to_owned(),
        message: format!("Failed to read response body: {e}"),
    })
}
