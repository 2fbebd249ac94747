// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Collider, rigid body and character controller parameters

use usda_lite_core::{
    format_bool, format_float, format_string_array, format_vec3, parse_string_array,
};
use usda_lite_geometry::{
    centimeters_to_meters, controller_height_to_extent, extent_to_controller_height,
    normalize_direction, tidy, up_vector_euler_degrees, Vector3,
};

use super::{
    read_bitmask, read_bool, read_centimeters, read_degrees, read_number, read_text, token,
    ComponentParameterWriteSpec as Write, ComponentSnapshot, Param, ParameterValue,
};
use crate::error::{Error, Result};

pub const COLLIDER: &str = "RealityKit.Collider";
pub const RIGID_BODY: &str = "RealityKit.RigidBody";
pub const CHARACTER_CONTROLLER: &str = "RealityKit.CharacterController";

pub const COLLIDER_KEYS: &[&str] = &[
    "group", "mask", "mode", "shape", "extent", "radius", "height",
];
pub const RIGID_BODY_KEYS: &[&str] = &[
    "motionType",
    "gravityEnabled",
    "linearDamping",
    "angularDamping",
    "mass",
    "staticFriction",
    "dynamicFriction",
    "restitution",
];
pub const CHARACTER_CONTROLLER_KEYS: &[&str] = &[
    "height",
    "radius",
    "skinWidth",
    "stepLimit",
    "slopeLimit",
    "upVector",
    "group",
    "mask",
];

const SHAPE: &str = "Shape";
const MASS_FRAME: &str = "massFrame";
const MATERIAL: &str = "material";
const CONTROLLER_DESC: &str = "m_controllerDesc";

/// Controller extents when none are authored: height, radius, unused.
const DEFAULT_EXTENTS: [f64; 3] = [1.0, 0.25, 0.0];

const ROTATE_OP: &str = "xformOp:rotateXYZ";
const DEFAULT_OP_ORDER: [&str; 3] = ["xformOp:translate", "xformOp:rotateXYZ", "xformOp:scale"];

pub(crate) fn map_collider(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "group" => Write::set("uint", "group", param.bitmask()?),
        "mask" => Write::set("uint", "mask", param.bitmask()?),
        "mode" => Write::set("token", "type", token(param.choice(&["Default", "Trigger"])?)),
        "shape" => Write::set(
            "token",
            "shapeType",
            token(param.choice(&["Box", "Sphere", "Capsule"])?),
        )
        .at(SHAPE),
        "extent" => {
            let cm = param.vec3()?;
            Write::set("float3", "extent", format_vec3(cm.map(centimeters_to_meters))).at(SHAPE)
        }
        "radius" | "height" => Write::set("float", param.parameter, param.centimeters()?).at(SHAPE),
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_collider(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "group" | "mask" => read_bitmask(current.number(None, parameter)),
        "mode" => read_text(current.token(None, "type")),
        "shape" => read_text(current.token(Some(SHAPE), "shapeType")),
        "extent" => current
            .vec3(Some(SHAPE), "extent")
            .map(|m| ParameterValue::Vector3(m.map(|v| tidy(v * 100.0)))),
        "radius" | "height" => read_centimeters(current.number(Some(SHAPE), parameter)),
        _ => None,
    }
}

pub(crate) fn map_rigid_body(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "motionType" => Write::set(
            "token",
            "motionType",
            token(param.choice(&["Static", "Dynamic", "Kinematic"])?),
        ),
        "gravityEnabled" => Write::set("bool", "gravityEnabled", format_bool(param.boolean()?)),
        "linearDamping" | "angularDamping" => {
            Write::set("float", param.parameter, format_float(param.non_negative()?))
        }
        "mass" => Write::set("float", "m_mass", format_float(param.non_negative()?)).at(MASS_FRAME),
        "staticFriction" | "dynamicFriction" | "restitution" => {
            Write::set("float", param.parameter, format_float(param.number()?)).at(MATERIAL)
        }
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_rigid_body(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "motionType" => read_text(current.token(None, "motionType")),
        "gravityEnabled" => read_bool(current.boolean(None, "gravityEnabled")),
        "linearDamping" | "angularDamping" => read_number(current.number(None, parameter)),
        "mass" => read_number(current.number(Some(MASS_FRAME), "m_mass")),
        "staticFriction" | "dynamicFriction" | "restitution" => {
            read_number(current.number(Some(MATERIAL), parameter))
        }
        _ => None,
    }
}

pub(crate) fn map_character_controller(
    param: &Param<'_>,
    current: &ComponentSnapshot<'_>,
) -> Result<Vec<Write>> {
    let writes = match param.parameter {
        "height" | "radius" => {
            let value = param.number()?;
            let mut extents = current
                .vec3(Some(CONTROLLER_DESC), "extents")
                .unwrap_or(DEFAULT_EXTENTS);
            if param.parameter == "height" {
                extents[0] = controller_height_to_extent(value);
            } else {
                extents[1] = centimeters_to_meters(value);
            }
            vec![Write::set("float3", "extents", format_vec3(extents)).at(CONTROLLER_DESC)]
        }
        "skinWidth" | "stepLimit" => {
            vec![Write::set("float", param.parameter, param.centimeters()?).at(CONTROLLER_DESC)]
        }
        "slopeLimit" => {
            vec![Write::set("float", "slopeLimit", param.degrees()?).at(CONTROLLER_DESC)]
        }
        "upVector" => map_up_vector(param, current)?,
        "group" => vec![Write::set("uint", "collisionGroup", param.bitmask()?).at(CONTROLLER_DESC)],
        "mask" => vec![Write::set("uint", "collisionMask", param.bitmask()?).at(CONTROLLER_DESC)],
        _ => return Err(param.unsupported()),
    };
    Ok(writes)
}

/// Normalized up vector on the controller plus the matching owner rotation.
fn map_up_vector(param: &Param<'_>, current: &ComponentSnapshot<'_>) -> Result<Vec<Write>> {
    let [x, y, z] = param.vec3()?;
    let up = normalize_direction(&Vector3::new(x, y, z))
        .map_err(|_| Error::invalid(param.component, param.parameter, "a non-zero vector"))?;
    let euler = up_vector_euler_degrees(&up)?;

    Ok(vec![
        Write::set("float3", "upVector", format_vec3([tidy(up.x), tidy(up.y), tidy(up.z)]))
            .at(CONTROLLER_DESC),
        Write::set(
            "float3",
            ROTATE_OP,
            format_vec3([tidy(euler.x), tidy(euler.y), tidy(euler.z)]),
        )
        .on_owner(),
        Write::set(
            "uniform token[]",
            "xformOpOrder",
            format_string_array(&op_order_with_rotate(current)),
        )
            .on_owner(),
    ])
}

/// The owner's op order with the rotate op present exactly once.
fn op_order_with_rotate(current: &ComponentSnapshot<'_>) -> Vec<String> {
    let mut order = current
        .owner_literal("xformOpOrder")
        .and_then(parse_string_array)
        .unwrap_or_default();
    if order.is_empty() {
        return DEFAULT_OP_ORDER.iter().map(|op| op.to_string()).collect();
    }
    if !order.iter().any(|op| op == ROTATE_OP) {
        let at = order
            .iter()
            .position(|op| op == "xformOp:translate")
            .map_or(0, |i| i + 1);
        order.insert(at, ROTATE_OP.to_string());
    }
    order
}

pub(crate) fn read_character_controller(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "height" => current
            .vec3(Some(CONTROLLER_DESC), "extents")
            .map(|e| ParameterValue::Number(extent_to_controller_height(e[0]))),
        "radius" => read_centimeters(current.vec3(Some(CONTROLLER_DESC), "extents").map(|e| e[1])),
        "skinWidth" | "stepLimit" => {
            read_centimeters(current.number(Some(CONTROLLER_DESC), parameter))
        }
        "slopeLimit" => read_degrees(current.number(Some(CONTROLLER_DESC), "slopeLimit")),
        "upVector" => current
            .vec3(Some(CONTROLLER_DESC), "upVector")
            .map(ParameterValue::Vector3),
        "group" => read_bitmask(current.number(Some(CONTROLLER_DESC), "collisionGroup")),
        "mask" => read_bitmask(current.number(Some(CONTROLLER_DESC), "collisionMask")),
        _ => None,
    }
}
