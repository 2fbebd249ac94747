// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the engine.
//!
//! Inside the inspector, failures are messages stored in the state. These
//! errors are for callers that need to stop on one.

use thiserror::Error;

/// Engine error types.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Layer error: {0}")]
    Layer(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
