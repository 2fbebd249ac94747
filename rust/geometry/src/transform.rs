// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rotation and anchoring-transform utilities
//!
//! Euler angles are XYZ degrees: the X rotation is applied first, so the
//! column-vector rotation is `Rz * Ry * Rx`. Stored 4x4 matrices use the
//! row-vector convention (`p' = p * M`): the upper 3x3 block is the
//! transposed rotation with each row scaled, translation sits in the last
//! row, and the last column is `(0, 0, 0, 1)`.

use crate::error::{Error, Result};
use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};
use usda_lite_core::MatrixRows;

/// Canonical up axis (+Y) that up-vector rotations are measured from.
pub fn canonical_up() -> Vector3<f64> {
    Vector3::y()
}

/// Below this `|cos(pitch)|` the decomposition takes the gimbal-lock branch.
const GIMBAL_EPSILON: f64 = 1e-6;

/// Smallest row norm accepted as a non-degenerate scale.
const SCALE_EPSILON: f64 = 1e-12;

/// Position (meters), orientation (XYZ Euler degrees) and per-axis scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponents {
    pub position: Vector3<f64>,
    pub orientation_degrees: Vector3<f64>,
    pub scale: Vector3<f64>,
}

impl Default for TransformComponents {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation_degrees: Vector3::zeros(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

/// Build the column-vector rotation `Rz * Ry * Rx` from XYZ Euler degrees.
pub fn rotation_from_euler_xyz_degrees(degrees: &Vector3<f64>) -> Matrix3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), degrees.x.to_radians());
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), degrees.y.to_radians());
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), degrees.z.to_radians());
    (rz * ry * rx).into_inner()
}

/// Recover XYZ Euler degrees from a column-vector rotation `Rz * Ry * Rx`.
///
/// When pitch is at +/-90 degrees only the difference of roll and yaw is
/// observable; yaw is fixed to zero and the whole turn is reported as roll.
pub fn euler_xyz_degrees_from_rotation(rotation: &Matrix3<f64>) -> Vector3<f64> {
    let r = rotation;
    let pitch = (-r[(2, 0)]).clamp(-1.0, 1.0).asin();

    let (roll, yaw) = if pitch.cos().abs() < GIMBAL_EPSILON {
        ((-r[(1, 2)]).atan2(r[(1, 1)]), 0.0)
    } else {
        (r[(2, 1)].atan2(r[(2, 2)]), r[(1, 0)].atan2(r[(0, 0)]))
    };

    Vector3::new(roll.to_degrees(), pitch.to_degrees(), yaw.to_degrees())
}

/// Normalize a direction, rejecting zero-length input.
pub fn normalize_direction(direction: &Vector3<f64>) -> Result<Vector3<f64>> {
    let norm = direction.norm();
    if !norm.is_finite() || norm < SCALE_EPSILON {
        return Err(Error::ZeroDirection(format!(
            "({}, {}, {})",
            direction.x, direction.y, direction.z
        )));
    }
    Ok(direction / norm)
}

/// Shortest-arc rotation taking +Y onto `up`.
///
/// For `up` anti-parallel to +Y the arc is not unique; a half turn about +X
/// is used.
pub fn up_vector_rotation(up: &Vector3<f64>) -> Result<UnitQuaternion<f64>> {
    let target = normalize_direction(up)?;
    let up_axis = canonical_up();
    if up_axis.dot(&target) < -1.0 + 1e-9 {
        return Ok(UnitQuaternion::from_axis_angle(
            &Vector3::x_axis(),
            std::f64::consts::PI,
        ));
    }
    Ok(UnitQuaternion::rotation_between(&up_axis, &target)
        .unwrap_or_else(UnitQuaternion::identity))
}

/// XYZ Euler degrees of the shortest-arc rotation from +Y to `up`.
pub fn up_vector_euler_degrees(up: &Vector3<f64>) -> Result<Vector3<f64>> {
    let rotation = up_vector_rotation(up)?;
    Ok(euler_xyz_degrees_from_rotation(
        rotation.to_rotation_matrix().matrix(),
    ))
}

/// Compose a row-vector anchoring matrix from its components.
pub fn compose_anchoring_matrix(components: &TransformComponents) -> MatrixRows {
    // Row-vector form of Rz * Ry * Rx is its transpose, Rx^T * Ry^T * Rz^T
    let rotation_rows =
        rotation_from_euler_xyz_degrees(&components.orientation_degrees).transpose();

    let mut matrix = Matrix4::identity();
    for row in 0..3 {
        for col in 0..3 {
            matrix[(row, col)] = rotation_rows[(row, col)] * components.scale[row];
        }
        matrix[(row, 3)] = 0.0;
    }
    matrix[(3, 0)] = components.position.x;
    matrix[(3, 1)] = components.position.y;
    matrix[(3, 2)] = components.position.z;
    matrix[(3, 3)] = 1.0;

    rows_from_matrix(&matrix)
}

/// Split a row-vector anchoring matrix back into its components.
pub fn decompose_anchoring_matrix(rows: &MatrixRows) -> Result<TransformComponents> {
    let matrix = matrix_from_rows(rows);

    let mut scale = Vector3::zeros();
    let mut rotation_rows = Matrix3::zeros();
    for row in 0..3 {
        let axis = Vector3::new(matrix[(row, 0)], matrix[(row, 1)], matrix[(row, 2)]);
        let norm = axis.norm();
        if !norm.is_finite() || norm < SCALE_EPSILON {
            return Err(Error::DegenerateTransform(format!(
                "row {} has zero length",
                row
            )));
        }
        scale[row] = norm;
        rotation_rows.set_row(row, &(axis / norm).transpose());
    }

    Ok(TransformComponents {
        position: Vector3::new(matrix[(3, 0)], matrix[(3, 1)], matrix[(3, 2)]),
        orientation_degrees: euler_xyz_degrees_from_rotation(&rotation_rows.transpose()),
        scale,
    })
}

/// Row-major array form to nalgebra.
pub fn matrix_from_rows(rows: &MatrixRows) -> Matrix4<f64> {
    Matrix4::from_fn(|r, c| rows[r][c])
}

/// nalgebra to row-major array form.
pub fn rows_from_matrix(matrix: &Matrix4<f64>) -> MatrixRows {
    let mut rows = [[0.0; 4]; 4];
    for (r, row) in rows.iter_mut().enumerate() {
        for (c, value) in row.iter_mut().enumerate() {
            *value = matrix[(r, c)];
        }
    }
    rows
}
