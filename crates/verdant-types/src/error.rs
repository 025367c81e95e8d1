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

//! Error types shared by every pipeline stage

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The upstream API answered with a non-success status
    #[error("transport error: {url} answered HTTP {status}")]
    Transport { url: String, status: u16 },

    /// The request never produced a usable response
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("no input to build from: {0}")]
    EmptyInput(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// True for the failures that originate from talking to a remote source
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Request { .. })
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
