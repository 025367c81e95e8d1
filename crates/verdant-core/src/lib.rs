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

pub mod align;
pub mod features;
pub mod grid;
pub mod pipeline;
pub mod resample;
pub mod store;

pub use align::{align, complete_schema};
pub use features::{GREEN_ENERGY_SUFFIX, SURPLUS_SUFFIX, derive_features, derive_labels};
pub use grid::{CanonicalGrid, observed_bounds};
pub use pipeline::{ProcessingConfig, SubsetSize, build_wide_table, process, test_subset};
pub use resample::{downsample, fill_gaps, interpolate, zero_fill};
