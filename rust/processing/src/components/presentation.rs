// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh sorting, opacity, input target and billboard parameters

use usda_lite_core::{
    format_bool, format_float, format_int, format_relationship, parse_relationship_target,
    validate_prim_path,
};

use super::{
    read_bool, read_number, read_text, token, ComponentParameterWriteSpec as Write,
    ComponentSnapshot, Param, ParameterValue,
};
use crate::error::{Error, Result};

pub const MESH_SORTING: &str = "RealityKit.MeshSorting";
pub const OPACITY: &str = "RealityKit.Opacity";
pub const INPUT_TARGET: &str = "RealityKit.InputTarget";
pub const BILLBOARD: &str = "RealityKit.Billboard";

pub const MESH_SORTING_KEYS: &[&str] = &["group", "priorityInGroup"];
pub const OPACITY_KEYS: &[&str] = &["opacity"];
pub const INPUT_TARGET_KEYS: &[&str] = &["enabled", "allowedInput"];
pub const BILLBOARD_KEYS: &[&str] = &["blendFactor"];

pub(crate) fn map_mesh_sorting(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "group" => {
            let path = param.text()?.trim();
            if path.is_empty() {
                Write::clear("rel", "group")
            } else {
                validate_prim_path(path)
                    .map_err(|_| Error::invalid(param.component, param.parameter, "a prim path"))?;
                Write::set("rel", "group", format_relationship(path))
            }
        }
        "priorityInGroup" => {
            let priority = param.number()?.round().clamp(i32::MIN as f64, i32::MAX as f64);
            Write::set("int", "priorityInGroup", format_int(priority as i64))
        }
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_mesh_sorting(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "group" => read_text(current.literal(None, "group").and_then(parse_relationship_target)),
        "priorityInGroup" => read_number(current.number(None, "priorityInGroup")),
        _ => None,
    }
}

pub(crate) fn map_opacity(param: &Param<'_>) -> Result<Vec<Write>> {
    match param.parameter {
        "opacity" => Ok(vec![Write::set("float", "opacity", format_float(param.unit_interval()?))]),
        _ => Err(param.unsupported()),
    }
}

pub(crate) fn read_opacity(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "opacity" => read_number(current.number(None, "opacity")),
        _ => None,
    }
}

pub(crate) fn map_input_target(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "enabled" => Write::set("bool", "enabled", format_bool(param.boolean()?)),
        "allowedInput" => Write::set(
            "token",
            "allowedInputTypes",
            token(param.choice(&["All", "Direct", "Indirect"])?),
        ),
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_input_target(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "enabled" => read_bool(current.boolean(None, "enabled")),
        "allowedInput" => read_text(current.token(None, "allowedInputTypes")),
        _ => None,
    }
}

pub(crate) fn map_billboard(param: &Param<'_>) -> Result<Vec<Write>> {
    match param.parameter {
        "blendFactor" => Ok(vec![Write::set(
            "float",
            "blendFactor",
            format_float(param.unit_interval()?),
        )]),
        _ => Err(param.unsupported()),
    }
}

pub(crate) fn read_billboard(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "blendFactor" => read_number(current.number(None, "blendFactor")),
        _ => None,
    }
}
