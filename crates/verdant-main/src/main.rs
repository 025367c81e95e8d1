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

mod config;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use config::AppConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::FmtSubscriber;
use verdant_core::store::{load_features, load_wide, save_features, save_wide};
use verdant_core::{SubsetSize, build_wide_table, process, test_subset};
use verdant_dataset::{
    Phase, PersistenceBaseline, SequenceModel, WindowDataset, write_predictions,
};
use verdant_ingest::{ElexonSource, EntsoeSource, Ingestor, TimeRange};

#[derive(Parser)]
#[command(name = "verdant")]
#[command(version, about = "Electricity series ingestion and windowing pipeline", long_about = None)]
struct Cli {
    /// Path to the TOML configuration
    #[arg(short, long, global = true, default_value = "verdant.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch load and generation for every configured country into a raw table
    Ingest {
        /// First day, inclusive (YYYY-MM-DD, UTC)
        #[arg(long)]
        start: NaiveDate,

        /// Last day, exclusive (YYYY-MM-DD, UTC)
        #[arg(long)]
        end: NaiveDate,

        #[arg(short, long, default_value = "raw_data.csv")]
        output: PathBuf,

        /// Fetch UK from ENTSO-E as well
        #[arg(long)]
        only_entsoe: bool,
    },

    /// Resample, fill gaps and derive features and labels
    Process {
        #[arg(short, long, default_value = "raw_data.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "processed_data.csv")]
        output: PathBuf,
    },

    /// Keep the trailing rows of a processed table
    Subset {
        #[arg(short, long, default_value = "processed_data.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "test_data.csv")]
        output: PathBuf,

        /// Row count, or a fraction in (0, 1)
        #[arg(long)]
        size: Option<String>,
    },

    /// Fit the baseline classifier on a processed table
    Train {
        #[arg(short, long, default_value = "processed_data.csv")]
        input: PathBuf,

        #[arg(short, long, default_value = "model.json")]
        model: PathBuf,
    },

    /// Predict the next-hour surplus leader for every row of a processed table
    Predict {
        #[arg(short, long, default_value = "test_data.csv")]
        input: PathBuf,

        /// Saved model; the default baseline when omitted
        #[arg(short, long)]
        model: Option<PathBuf>,

        #[arg(short, long, default_value = "predictions.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Respects RUST_LOG, defaults to info
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install tracing subscriber")?;

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Ingest {
            start,
            end,
            output,
            only_entsoe,
        } => run_ingest(&config, start, end, &output, only_entsoe).await,
        Command::Process { input, output } => run_process(&config, &input, &output),
        Command::Subset {
            input,
            output,
            size,
        } => run_subset(&input, &output, size.as_deref()),
        Command::Train { input, model } => run_train(&config, &input, &model),
        Command::Predict {
            input,
            model,
            output,
        } => run_predict(&config, &input, model.as_deref(), &output),
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

async fn run_ingest(
    config: &AppConfig,
    start: NaiveDate,
    end: NaiveDate,
    output: &Path,
    only_entsoe: bool,
) -> Result<()> {
    let range = TimeRange::new(midnight(start), midnight(end)).context("Invalid date range")?;
    let sources = &config.sources;

    let entsoe = EntsoeSource::new(
        sources.entsoe_url.clone(),
        sources.entsoe_token()?,
        sources.request_timeout(),
    )
    .context("Failed to build ENTSO-E client")?;

    let mut ingestor = Ingestor::new(Arc::new(config.catalog.clone()), Arc::new(entsoe))
        .with_max_concurrent(sources.max_concurrent_countries);
    if sources.use_elexon_for_uk && !only_entsoe {
        let elexon = ElexonSource::new(sources.elexon_url.clone(), sources.request_timeout())
            .context("Failed to build Elexon client")?;
        ingestor = ingestor.with_elexon(Arc::new(elexon));
    }

    info!("Ingesting {} countries over {range}", config.catalog.countries.len());
    let series = ingestor.ingest(range).await.context("Ingestion failed")?;

    let wide = build_wide_table(&series, &config.catalog, &config.processing)
        .context("Failed to align ingested series")?;
    save_wide(output, &wide)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn run_process(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let wide = load_wide(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let features =
        process(&wide, &config.catalog, &config.processing).context("Processing failed")?;
    save_features(output, &features)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn run_subset(input: &Path, output: &Path, size: Option<&str>) -> Result<()> {
    let size = size
        .map(SubsetSize::parse)
        .transpose()
        .context("Invalid --size")?
        .unwrap_or_default();

    let features =
        load_features(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let subset = test_subset(&features, size);
    save_features(output, &subset)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn run_train(config: &AppConfig, input: &Path, model_path: &Path) -> Result<()> {
    let features =
        load_features(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let dataset = WindowDataset::new(&features, &config.dataset, &config.catalog, Phase::Training)
        .context("Failed to build training windows")?;

    let mut model = PersistenceBaseline::default();
    model.train(&dataset).context("Training failed")?;
    model
        .save(model_path)
        .with_context(|| format!("Failed to save model to {}", model_path.display()))?;

    info!("Saved {} to {}", model.name(), model_path.display());
    Ok(())
}

fn run_predict(
    config: &AppConfig,
    input: &Path,
    model_path: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let model = match model_path {
        Some(path) => PersistenceBaseline::load(path)
            .with_context(|| format!("Failed to load model from {}", path.display()))?,
        None => PersistenceBaseline::default(),
    };

    let features =
        load_features(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let dataset = WindowDataset::new(&features, &config.dataset, &config.catalog, Phase::Inference)
        .context("Failed to build prediction windows")?;

    let predictions = model.predict(&dataset).context("Prediction failed")?;
    write_predictions(output, &predictions)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
