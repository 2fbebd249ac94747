// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for scene-model operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by path and name validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid prim path: {0}")]
    InvalidPath(String),

    #[error("Invalid prim name: {0}")]
    InvalidName(String),
}
