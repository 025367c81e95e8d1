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

//! Persisted table format
//!
//! ```text
//! ,Time,DE_B01,DE_B02,...,label
//! 0,2022-01-01 00:00:00+00:00,12.5,,...,3
//! ```
//!
//! A leading row-number column, `Time`, the data columns in ascending order
//! and, for processed tables, a trailing `label`. Missing cells are empty.

use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;
use verdant_types::{
    FeatureTable, FilledTable, LABEL_COLUMN, PipelineError, Result, TIME_COLUMN, TimeTable,
    WideTable,
};

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

fn write_table<W: Write, T: Clone>(
    writer: W,
    table: &TimeTable<T>,
    labels: Option<&[u32]>,
    cell: impl Fn(&T) -> String,
) -> Result<()> {
    let mut csv = Writer::from_writer(writer);

    let mut header = vec![String::new(), TIME_COLUMN.to_owned()];
    header.extend(table.column_names().map(str::to_owned));
    if labels.is_some() {
        header.push(LABEL_COLUMN.to_owned());
    }
    csv.write_record(&header)?;

    let columns: Vec<&[T]> = table.columns().map(|(_, cells)| cells).collect();
    for (row, time) in table.time().iter().enumerate() {
        let mut record = Vec::with_capacity(header.len());
        record.push(row.to_string());
        record.push(time.format(TIME_FORMAT).to_string());
        record.extend(columns.iter().map(|cells| cell(&cells[row])));
        if let Some(labels) = labels {
            record.push(labels[row].to_string());
        }
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_wide<W: Write>(writer: W, table: &WideTable) -> Result<()> {
    write_table(writer, table, None, |cell| {
        cell.map(|v| v.to_string()).unwrap_or_default()
    })
}

pub fn write_features<W: Write>(writer: W, features: &FeatureTable) -> Result<()> {
    write_table(writer, &features.table, Some(&features.labels), f64::to_string)
}

pub fn save_wide(path: &Path, table: &WideTable) -> Result<()> {
    write_wide(std::fs::File::create(path)?, table)?;
    info!(
        "Saved {} rows x {} columns to {}",
        table.len(),
        table.column_count(),
        path.display()
    );
    Ok(())
}

pub fn save_features(path: &Path, features: &FeatureTable) -> Result<()> {
    write_features(std::fs::File::create(path)?, features)?;
    info!(
        "Saved {} labelled rows x {} columns to {}",
        features.len(),
        features.table.column_count(),
        path.display()
    );
    Ok(())
}

/// Parsed CSV before cells are interpreted
struct RawTable {
    time: Vec<DateTime<Utc>>,
    names: Vec<String>,
    rows: Vec<StringRecord>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| PipelineError::Schema(format!("invalid {TIME_COLUMN} value {raw}: {e}")))
}

fn read_raw<R: Read>(reader: R) -> Result<RawTable> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);
    let header = csv.headers()?.clone();

    if header.get(1) != Some(TIME_COLUMN) {
        return Err(PipelineError::Schema(format!(
            "second column must be {TIME_COLUMN}"
        )));
    }
    let names: Vec<String> = header.iter().skip(2).map(str::to_owned).collect();

    let mut time = Vec::new();
    let mut rows = Vec::new();
    for record in csv.records() {
        let record = record?;
        let stamp = record
            .get(1)
            .ok_or_else(|| PipelineError::Schema("row without time".to_owned()))?;
        time.push(parse_time(stamp)?);
        rows.push(record);
    }

    Ok(RawTable { time, names, rows })
}

fn parse_cell(raw: &str, column: &str, row: usize) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| PipelineError::Schema(format!("row {row}, column {column}: {raw} is not a number")))
}

fn column_cells(raw: &RawTable, index: usize) -> Result<Vec<Option<f64>>> {
    let name = &raw.names[index];
    raw.rows
        .iter()
        .enumerate()
        .map(|(row, record)| parse_cell(record.get(index + 2).unwrap_or(""), name, row))
        .collect()
}

/// Read an aligned (raw) table. Empty cells become missing.
pub fn read_wide<R: Read>(reader: R) -> Result<WideTable> {
    let raw = read_raw(reader)?;
    let mut table: WideTable = TimeTable::new(raw.time.clone());
    for (index, name) in raw.names.iter().enumerate() {
        if name == LABEL_COLUMN {
            continue;
        }
        table.insert_column(name.clone(), column_cells(&raw, index)?)?;
    }
    Ok(table)
}

/// Read a processed table. Every cell must be present and `label` must be a
/// non-negative integer.
pub fn read_features<R: Read>(reader: R) -> Result<FeatureTable> {
    let raw = read_raw(reader)?;
    let mut table: FilledTable = TimeTable::new(raw.time.clone());
    let mut labels = None;

    for (index, name) in raw.names.iter().enumerate() {
        if name == LABEL_COLUMN {
            let parsed = raw
                .rows
                .iter()
                .enumerate()
                .map(|(row, record)| {
                    let cell = record.get(index + 2).unwrap_or("").trim();
                    parse_label(cell).ok_or_else(|| {
                        PipelineError::Schema(format!("row {row}: invalid label {cell:?}"))
                    })
                })
                .collect::<Result<Vec<u32>>>()?;
            labels = Some(parsed);
            continue;
        }

        let cells = column_cells(&raw, index)?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                cell.ok_or_else(|| {
                    PipelineError::Schema(format!("row {row}, column {name}: missing value"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        table.insert_column(name.clone(), cells)?;
    }

    let labels =
        labels.ok_or_else(|| PipelineError::Schema(format!("missing column {LABEL_COLUMN}")))?;
    FeatureTable::new(table, labels)
}

/// Integer labels, also accepting an integral float such as `3.0`
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_label(raw: &str) -> Option<u32> {
    if let Ok(label) = raw.parse::<u32>() {
        return Some(label);
    }
    let value = raw.parse::<f64>().ok()?;
    (value.fract() == 0.0 && value >= 0.0 && value <= f64::from(u32::MAX)).then_some(value as u32)
}

pub fn load_wide(path: &Path) -> Result<WideTable> {
    let table = read_wide(std::fs::File::open(path)?)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        table.len(),
        table.column_count(),
        path.display()
    );
    Ok(table)
}

pub fn load_features(path: &Path) -> Result<FeatureTable> {
    let features = read_features(std::fs::File::open(path)?)?;
    info!(
        "Loaded {} labelled rows x {} columns from {}",
        features.len(),
        features.table.column_count(),
        path.display()
    );
    Ok(features)
}
