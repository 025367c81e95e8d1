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

//! ENTSO-E transparency platform client
//!
//! Actual total load (A65) and aggregated generation per type (A75), both
//! realised (A16). The API serves at most one year per request.

use super::{PayloadFormat, Payloads, SeriesSource, TimeRange, WindowStep, get_text, split_range};
use async_trait::async_trait;
use std::time::Duration;
use tracing::info;
use verdant_types::{Result, SeriesKind};

pub const DEFAULT_URL: &str = "https://web-api.tp.entsoe.eu/api";

const WINDOW: WindowStep = WindowStep::Months(12);
const PERIOD_FORMAT: &str = "%Y%m%d%H%M";

pub struct EntsoeSource {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl EntsoeSource {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: super::build_client(timeout)?,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn query(&self, region: &str, kind: SeriesKind, window: TimeRange) -> Vec<(&'static str, String)> {
        let (document_type, domain_key) = match kind {
            SeriesKind::Load => ("A65", "outBiddingZone_Domain"),
            SeriesKind::Generation => ("A75", "in_Domain"),
        };

        vec![
            ("securityToken", self.token.clone()),
            ("documentType", document_type.to_owned()),
            ("processType", "A16".to_owned()),
            (domain_key, region.to_owned()),
            ("periodStart", window.start.format(PERIOD_FORMAT).to_string()),
            ("periodEnd", window.end.format(PERIOD_FORMAT).to_string()),
        ]
    }
}

impl std::fmt::Debug for EntsoeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntsoeSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SeriesSource for EntsoeSource {
    async fn fetch(&self, region: &str, kind: SeriesKind, range: TimeRange) -> Result<Payloads> {
        let mut bodies = Vec::new();
        for window in split_range(range, WINDOW)? {
            info!("Requesting {kind} data for {region} from ENTSO-E: {window}");
            let query = self.query(region, kind, window);
            bodies.push(get_text(&self.client, &self.base_url, &query).await?);
        }

        Ok(Payloads {
            format: PayloadFormat::Xml,
            bodies,
        })
    }

    fn name(&self) -> &str {
        "ENTSO-E"
    }
}
