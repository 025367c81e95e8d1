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

//! Circular encodings of hour of day, day of week and month of year

use chrono::{DateTime, Datelike, Timelike, Utc};
use std::f64::consts::TAU;

/// Column names of [`encode`]'s output, in order
pub const CYCLICAL_COLUMNS: [&str; 6] = [
    "Time_hour_x",
    "Time_hour_y",
    "Time_week_x",
    "Time_week_y",
    "Time_month_x",
    "Time_month_y",
];

/// `(cos, sin)` of point `index` out of `period` evenly spaced on the unit circle
pub fn circular_point(index: u32, period: u32) -> (f64, f64) {
    let angle = TAU * f64::from(index) / f64::from(period);
    (angle.cos(), angle.sin())
}

/// Hour (period 24), weekday from Monday (period 7), month from January
/// (period 12)
pub fn encode(time: DateTime<Utc>) -> [f64; 6] {
    let (hour_x, hour_y) = circular_point(time.hour(), 24);
    let (week_x, week_y) = circular_point(time.weekday().num_days_from_monday(), 7);
    let (month_x, month_y) = circular_point(time.month0(), 12);
    [hour_x, hour_y, week_x, week_y, month_x, month_y]
}
