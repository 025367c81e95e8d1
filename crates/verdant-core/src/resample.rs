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

//! Downsampling and gap filling
//!
//! Gap filling is two-phase: linear interpolation first, then zero-fill for
//! columns that had no value at all. Interpolation must run first.

use chrono::Duration;
use tracing::info;
use verdant_types::{FilledTable, PipelineError, Result, TimeTable, WideTable};

/// Average consecutive blocks of `factor` rows.
///
/// The first row is taken as block-aligned. A block whose cells are all
/// missing stays missing; otherwise it is the mean of the present cells. A
/// trailing partial block averages what it has. Output row `i` is stamped
/// `start + i * resolution`.
pub fn downsample(table: &WideTable, factor: usize, resolution: Duration) -> Result<WideTable> {
    if factor == 0 {
        return Err(PipelineError::Config(
            "resample factor must be positive".to_owned(),
        ));
    }
    let Some(&start) = table.time().first() else {
        return Ok(table.clone());
    };

    let rows = table.len().div_ceil(factor);
    let mut time = Vec::with_capacity(rows);
    for i in 0..rows {
        let offset = i32::try_from(i)
            .ok()
            .and_then(|i| resolution.checked_mul(i))
            .and_then(|offset| start.checked_add_signed(offset))
            .ok_or_else(|| PipelineError::Config(format!("resampled row {i} overflows")))?;
        time.push(offset);
    }

    let mut resampled: WideTable = TimeTable::new(time);
    for (name, cells) in table.columns() {
        let means = cells.chunks(factor).map(block_mean).collect();
        resampled.insert_column(name, means)?;
    }

    info!(
        "Resampled {} rows into {} blocks of {factor}",
        table.len(),
        resampled.len()
    );
    Ok(resampled)
}

#[expect(clippy::cast_precision_loss)]
fn block_mean(block: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = block.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Some(present.iter().sum::<f64>() / present.len() as f64)
}

/// Linear interpolation over row positions.
///
/// Interior gaps are interpolated between their neighbours; leading and
/// trailing gaps take the nearest present value. A column with no present
/// value is returned unchanged.
#[expect(clippy::cast_precision_loss)]
pub fn interpolate(cells: &[Option<f64>]) -> Vec<Option<f64>> {
    let known: Vec<(usize, f64)> = cells
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|v| (i, v)))
        .collect();

    let (Some(&(first_idx, first_val)), Some(&(last_idx, last_val))) = (known.first(), known.last())
    else {
        return cells.to_vec();
    };

    let mut filled = cells.to_vec();
    for cell in filled.iter_mut().take(first_idx) {
        *cell = Some(first_val);
    }
    for cell in filled.iter_mut().skip(last_idx + 1) {
        *cell = Some(last_val);
    }
    for pair in known.windows(2) {
        let (lo, lo_val) = pair[0];
        let (hi, hi_val) = pair[1];
        let span = (hi - lo) as f64;
        for (i, cell) in filled.iter_mut().enumerate().take(hi).skip(lo + 1) {
            *cell = Some(lo_val + (hi_val - lo_val) * (i - lo) as f64 / span);
        }
    }
    filled
}

pub fn interpolate_table(table: &WideTable) -> WideTable {
    table.map_columns(|_, cells| interpolate(cells))
}

/// Replace every remaining missing cell with zero
pub fn zero_fill(table: &WideTable) -> FilledTable {
    table.map_cells(|cell| cell.unwrap_or(0.0))
}

/// Interpolate, then zero-fill what interpolation could not reach
pub fn fill_gaps(table: &WideTable) -> FilledTable {
    let interpolated = interpolate_table(table);
    let empty_columns = interpolated
        .columns()
        .filter(|(_, cells)| cells.iter().all(Option::is_none))
        .count();
    info!("Filled gaps: {empty_columns} columns had no observations and were zeroed");
    zero_fill(&interpolated)
}
