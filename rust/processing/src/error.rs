// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for processing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving, mapping or authoring
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported parameter '{parameter}' for component '{component}'")]
    UnsupportedMapping { component: String, parameter: String },

    #[error("Invalid value for '{parameter}' on '{component}': expected {expected}")]
    InvalidValue {
        component: String,
        parameter: String,
        expected: String,
    },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] usda_lite_core::Error),

    #[error("Geometry error: {0}")]
    Geometry(#[from] usda_lite_geometry::Error),
}

impl Error {
    pub fn unsupported(component: &str, parameter: &str) -> Self {
        Error::UnsupportedMapping {
            component: component.to_string(),
            parameter: parameter.to_string(),
        }
    }

    pub fn invalid(component: &str, parameter: &str, expected: impl Into<String>) -> Self {
        Error::InvalidValue {
            component: component.to_string(),
            parameter: parameter.to_string(),
            expected: expected.into(),
        }
    }
}
