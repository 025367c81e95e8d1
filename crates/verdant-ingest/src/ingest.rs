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

//! Per-country fetch and parse, fanned out over the configured countries

use crate::parser::parse_payloads;
use crate::sources::{SeriesSource, TimeRange};
use futures_util::{StreamExt, TryStreamExt, future, stream};
use std::sync::Arc;
use tracing::info;
use verdant_types::{Catalog, CountrySeries, Result, SeriesKind};

/// Country served by the Elexon source when one is configured
pub const ELEXON_COUNTRY: &str = "UK";

pub const DEFAULT_MAX_CONCURRENT_COUNTRIES: usize = 4;

pub struct Ingestor {
    catalog: Arc<Catalog>,
    entsoe: Arc<dyn SeriesSource>,
    elexon: Option<Arc<dyn SeriesSource>>,
    max_concurrent: usize,
}

impl std::fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ingestor")
            .field("countries", &self.catalog.countries)
            .field("entsoe", &self.entsoe.name())
            .field("elexon", &self.elexon.as_ref().map(|s| s.name().to_owned()))
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}

impl Ingestor {
    pub fn new(catalog: Arc<Catalog>, entsoe: Arc<dyn SeriesSource>) -> Self {
        Self {
            catalog,
            entsoe,
            elexon: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT_COUNTRIES,
        }
    }

    /// Route [`ELEXON_COUNTRY`] through `source` instead of ENTSO-E
    #[must_use]
    pub fn with_elexon(mut self, source: Arc<dyn SeriesSource>) -> Self {
        self.elexon = Some(source);
        self
    }

    #[must_use]
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Source and entity (bidding zone or country code) to query for `country`
    fn route(&self, country: &str) -> Result<(&dyn SeriesSource, String)> {
        if let Some(elexon) = &self.elexon
            && country == ELEXON_COUNTRY
        {
            return Ok((elexon.as_ref(), country.to_owned()));
        }
        Ok((
            self.entsoe.as_ref(),
            self.catalog.region(country)?.to_owned(),
        ))
    }

    /// Fetch and parse load and generation for one country.
    ///
    /// Load series come first, then generation series in code order.
    pub async fn ingest_country(&self, country: &str, range: TimeRange) -> Result<Vec<CountrySeries>> {
        let (source, entity) = self.route(country)?;
        info!("Ingesting {country} from {}", source.name());

        let (load, generation) = future::try_join(
            source.fetch(&entity, SeriesKind::Load, range),
            source.fetch(&entity, SeriesKind::Generation, range),
        )
        .await?;

        let mut series = Vec::new();
        for (payloads, kind) in [(load, SeriesKind::Load), (generation, SeriesKind::Generation)] {
            for (code, table) in parse_payloads(&payloads, kind, &self.catalog)? {
                series.push(CountrySeries::new(country, code, table));
            }
        }
        Ok(series)
    }

    /// Ingest every catalog country over `range`.
    ///
    /// Countries run with bounded concurrency but results keep catalog order.
    /// The first failure aborts the run.
    pub async fn ingest(&self, range: TimeRange) -> Result<Vec<CountrySeries>> {
        info!(
            "Ingesting {} countries over {range} ({} at a time)",
            self.catalog.countries.len(),
            self.max_concurrent
        );

        let per_country: Vec<Vec<CountrySeries>> = stream::iter(self.catalog.countries.iter())
            .map(|country| self.ingest_country(country, range))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let series: Vec<CountrySeries> = per_country.into_iter().flatten().collect();
        info!("Ingested {} series", series.len());
        Ok(series)
    }
}
