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

//! Elexon BMRS client for Great Britain demand and generation outturn

use super::{PayloadFormat, Payloads, SeriesSource, TimeRange, WindowStep, get_text, split_range};
use async_trait::async_trait;
use chrono::Duration;
use std::time::Duration as StdDuration;
use tracing::info;
use verdant_types::{Result, SeriesKind};

pub const DEFAULT_URL: &str = "https://data.elexon.co.uk/bmrs/api/v1";

const DEMAND_WINDOW: WindowStep = WindowStep::Days(28);
const GENERATION_WINDOW: WindowStep = WindowStep::Days(14);
const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct ElexonSource {
    client: reqwest::Client,
    base_url: String,
}

impl ElexonSource {
    pub fn new(base_url: impl Into<String>, timeout: StdDuration) -> Result<Self> {
        Ok(Self {
            client: super::build_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    async fn fetch_demand(&self, range: TimeRange) -> Result<Vec<String>> {
        // settlementDateTo is inclusive
        let range = TimeRange {
            start: range.start,
            end: range.end - Duration::days(1),
        };

        let url = format!("{}/demand", self.base_url);
        let mut bodies = Vec::new();
        for window in split_range(range, DEMAND_WINDOW)? {
            info!("Requesting load data from Elexon: {window}");
            let query = [
                ("format", "json".to_owned()),
                ("settlementDateFrom", window.start.format(DATE_FORMAT).to_string()),
                ("settlementDateTo", window.end.format(DATE_FORMAT).to_string()),
            ];
            bodies.push(get_text(&self.client, &url, &query).await?);
        }
        Ok(bodies)
    }

    async fn fetch_generation(&self, range: TimeRange) -> Result<Vec<String>> {
        let url = format!("{}/generation/outturn/summary", self.base_url);
        let mut bodies = Vec::new();
        for window in split_range(range, GENERATION_WINDOW)? {
            info!("Requesting generation data from Elexon: {window}");
            let query = [
                ("includeNegativeGeneration", "false".to_owned()),
                ("format", "json".to_owned()),
                ("startTime", window.start.format(DATE_FORMAT).to_string()),
                ("endTime", window.end.format(DATE_FORMAT).to_string()),
            ];
            bodies.push(get_text(&self.client, &url, &query).await?);
        }
        Ok(bodies)
    }
}

impl std::fmt::Debug for ElexonSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElexonSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SeriesSource for ElexonSource {
    /// The entity is ignored: Elexon only serves Great Britain
    async fn fetch(&self, _entity: &str, kind: SeriesKind, range: TimeRange) -> Result<Payloads> {
        let bodies = match kind {
            SeriesKind::Load => self.fetch_demand(range).await?,
            SeriesKind::Generation => self.fetch_generation(range).await?,
        };

        Ok(Payloads {
            format: PayloadFormat::Json,
            bodies,
        })
    }

    fn name(&self) -> &str {
        "Elexon"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use verdant_types::PipelineError;

    fn january() -> TimeRange {
        TimeRange::new(
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2022, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_demand_windows_end_a_day_early() {
        let mut server = Server::new_async().await;

        let first = server
            .mock("GET", "/demand")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("format".into(), "json".into()),
                Matcher::UrlEncoded("settlementDateFrom".into(), "2022-01-01".into()),
                Matcher::UrlEncoded("settlementDateTo".into(), "2022-01-29".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let second = server
            .mock("GET", "/demand")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("settlementDateFrom".into(), "2022-01-29".into()),
                Matcher::UrlEncoded("settlementDateTo".into(), "2022-01-31".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"data":[]}"#)
            .create_async()
            .await;

        let source = ElexonSource::new(server.url(), StdDuration::from_secs(5)).unwrap();
        let payloads = source.fetch("UK", SeriesKind::Load, january()).await.unwrap();

        assert_eq!(payloads.format, PayloadFormat::Json);
        assert_eq!(payloads.bodies.len(), 2);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_generation_uses_fortnight_windows() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/generation/outturn/summary")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("includeNegativeGeneration".into(), "false".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .with_status(200)
            .with_body("[]")
            .expect(3)
            .create_async()
            .await;

        let source = ElexonSource::new(server.url(), StdDuration::from_secs(5)).unwrap();
        let payloads = source
            .fetch("UK", SeriesKind::Generation, january())
            .await
            .unwrap();

        assert_eq!(payloads.bodies.len(), 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_transport_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/generation/outturn/summary")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let source = ElexonSource::new(server.url(), StdDuration::from_secs(5)).unwrap();
        let result = source.fetch("UK", SeriesKind::Generation, january()).await;

        let err = result.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, PipelineError::Transport { status: 503, .. }));
    }
}
