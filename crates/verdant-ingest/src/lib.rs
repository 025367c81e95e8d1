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

pub mod ingest;
pub mod parser;
pub mod sources;

pub use ingest::{ELEXON_COUNTRY, Ingestor};
pub use parser::{group_records, parse_payloads};
pub use sources::{
    ElexonSource, EntsoeSource, PayloadFormat, Payloads, SeriesSource, TimeRange, WindowStep,
    split_range,
};
