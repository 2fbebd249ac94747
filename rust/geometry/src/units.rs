// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! UI-facing unit conversions
//!
//! Distances are edited in centimeters and stored in meters; angles are
//! edited in degrees and stored in radians.

const CENTIMETERS_PER_METER: f64 = 100.0;

/// Character controller heights are stored in the extents x-component at a
/// finer scale than other distances: 150 cm authors `0.15`.
const CONTROLLER_HEIGHT_SCALE: f64 = 1000.0;

/// Precision kept by the literal formatter.
const TIDY_SCALE: f64 = 1e6;

#[inline]
pub fn centimeters_to_meters(cm: f64) -> f64 {
    cm / CENTIMETERS_PER_METER
}

#[inline]
pub fn meters_to_centimeters(m: f64) -> f64 {
    tidy(m * CENTIMETERS_PER_METER)
}

#[inline]
pub fn controller_height_to_extent(cm: f64) -> f64 {
    cm / CONTROLLER_HEIGHT_SCALE
}

#[inline]
pub fn extent_to_controller_height(extent: f64) -> f64 {
    tidy(extent * CONTROLLER_HEIGHT_SCALE)
}

#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees.to_radians()
}

#[inline]
pub fn radians_to_degrees(radians: f64) -> f64 {
    tidy(radians.to_degrees())
}

/// Round to six decimal places so read-back values match what the user typed
/// (`0.15 * 100` reads as `15`, not `15.000000000000002`).
#[inline]
pub fn tidy(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let rounded = (value * TIDY_SCALE).round() / TIDY_SCALE;
    // Avoid -0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
