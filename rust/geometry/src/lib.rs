// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! USDA-Lite Geometry
//!
//! Unit conversions and transform math used when authoring component
//! parameters, built on nalgebra.

pub mod error;
pub mod transform;
pub mod units;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix3, Matrix4, UnitQuaternion, Vector3};

pub use error::{Error, Result};
pub use transform::{
    compose_anchoring_matrix, decompose_anchoring_matrix, euler_xyz_degrees_from_rotation,
    normalize_direction, rotation_from_euler_xyz_degrees, up_vector_euler_degrees,
    up_vector_rotation, canonical_up, matrix_from_rows, rows_from_matrix, TransformComponents,
};
pub use units::{
    centimeters_to_meters, controller_height_to_extent, degrees_to_radians,
    extent_to_controller_height, meters_to_centimeters, radians_to_degrees, tidy,
};
