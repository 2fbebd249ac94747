// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light, image-based light and grounding shadow parameters

use usda_lite_core::{format_bool, format_float, format_vec3, parse_number};

use super::{
    read_bool, read_centimeters, read_degrees, read_number, read_text, token,
    ComponentParameterWriteSpec as Write, ComponentSnapshot, Param, ParameterValue,
};
use crate::error::Result;

pub const DIRECTIONAL_LIGHT: &str = "RealityKit.DirectionalLight";
pub const POINT_LIGHT: &str = "RealityKit.PointLight";
pub const SPOT_LIGHT: &str = "RealityKit.SpotLight";
pub const IMAGE_BASED_LIGHT: &str = "RealityKit.ImageBasedLight";
pub const GROUNDING_SHADOW: &str = "RealityKit.GroundingShadow";

pub const DIRECTIONAL_LIGHT_KEYS: &[&str] = &[
    "color",
    "intensity",
    "castsShadow",
    "shadowProjection",
    "shadowNear",
    "shadowFar",
    "depthBias",
];
pub const POINT_LIGHT_KEYS: &[&str] = &[
    "color",
    "intensity",
    "attenuationRadius",
    "attenuationFalloffExponent",
];
pub const SPOT_LIGHT_KEYS: &[&str] = &[
    "color",
    "intensity",
    "attenuationRadius",
    "attenuationFalloffExponent",
    "innerAngle",
    "outerAngle",
    "castsShadow",
];
pub const IMAGE_BASED_LIGHT_KEYS: &[&str] = &["intensityExponent", "isGlobal"];
pub const GROUNDING_SHADOW_KEYS: &[&str] = &["castsShadow", "receivesShadow"];

const SHADOW: &str = "Shadow";

/// Fixed shadow projection bounds when none are authored (meters).
const DEFAULT_Z_NEAR: f64 = 0.01;
const DEFAULT_Z_FAR: f64 = 10.0;

/// Color and intensity, shared by every light.
fn map_color_intensity(param: &Param<'_>) -> Option<Result<Write>> {
    match param.parameter {
        "color" => Some(param.vec3().map(|c| Write::set("float3", "color", format_vec3(c)))),
        "intensity" => Some(
            param
                .number()
                .map(|i| Write::set("float", "intensity", format_float(i))),
        ),
        _ => None,
    }
}

fn read_color_intensity(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "color" => current.vec3(None, "color").map(ParameterValue::Vector3),
        "intensity" => read_number(current.number(None, "intensity")),
        _ => None,
    }
}

fn casts_shadow(param: &Param<'_>) -> Result<Write> {
    Ok(Write::set("bool", "isEnabled", format_bool(param.boolean()?)).at(SHADOW))
}

pub(crate) fn map_directional_light(
    param: &Param<'_>,
    current: &ComponentSnapshot<'_>,
) -> Result<Vec<Write>> {
    if let Some(write) = map_color_intensity(param) {
        return Ok(vec![write?]);
    }
    let writes = match param.parameter {
        "castsShadow" => vec![casts_shadow(param)?],
        "shadowProjection" => {
            let projection = param.choice(&["Automatic", "Fixed"])?;
            let primary = Write::set("token", "shadowProjectionType", token(projection)).at(SHADOW);
            if projection == "Fixed" {
                // Keep authored bounds; fall back to defaults
                let bound = |name: &str, fallback: f64| {
                    current
                        .literal(Some(SHADOW), name)
                        .filter(|literal| parse_number(literal).is_some())
                        .map(str::to_string)
                        .unwrap_or_else(|| format_float(fallback))
                };
                vec![
                    primary,
                    Write::set("float", "zNear", bound("zNear", DEFAULT_Z_NEAR)).at(SHADOW),
                    Write::set("float", "zFar", bound("zFar", DEFAULT_Z_FAR)).at(SHADOW),
                ]
            } else {
                vec![
                    primary,
                    Write::clear("float", "zNear").at(SHADOW),
                    Write::clear("float", "zFar").at(SHADOW),
                ]
            }
        }
        "shadowNear" => vec![Write::set("float", "zNear", param.centimeters()?).at(SHADOW)],
        "shadowFar" => vec![Write::set("float", "zFar", param.centimeters()?).at(SHADOW)],
        "depthBias" => {
            vec![Write::set("float", "depthBias", format_float(param.number()?)).at(SHADOW)]
        }
        _ => return Err(param.unsupported()),
    };
    Ok(writes)
}

pub(crate) fn read_directional_light(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "color" | "intensity" => read_color_intensity(parameter, current),
        "castsShadow" => read_bool(current.boolean(Some(SHADOW), "isEnabled")),
        "shadowProjection" => read_text(current.token(Some(SHADOW), "shadowProjectionType")),
        "shadowNear" => read_centimeters(current.number(Some(SHADOW), "zNear")),
        "shadowFar" => read_centimeters(current.number(Some(SHADOW), "zFar")),
        "depthBias" => read_number(current.number(Some(SHADOW), "depthBias")),
        _ => None,
    }
}

/// Attenuation fields shared by point and spot lights.
fn map_attenuation(param: &Param<'_>) -> Option<Result<Write>> {
    match param.parameter {
        "attenuationRadius" => Some(
            param
                .centimeters()
                .map(|m| Write::set("float", "attenuationRadius", m)),
        ),
        "attenuationFalloffExponent" => Some(
            param
                .number()
                .map(|e| Write::set("float", "attenuationFalloffExponent", format_float(e))),
        ),
        _ => None,
    }
}

fn read_attenuation(parameter: &str, current: &ComponentSnapshot<'_>) -> Option<ParameterValue> {
    match parameter {
        "attenuationRadius" => read_centimeters(current.number(None, "attenuationRadius")),
        "attenuationFalloffExponent" => {
            read_number(current.number(None, "attenuationFalloffExponent"))
        }
        _ => None,
    }
}

pub(crate) fn map_point_light(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = map_color_intensity(param)
        .or_else(|| map_attenuation(param))
        .ok_or_else(|| param.unsupported())??;
    Ok(vec![write])
}

pub(crate) fn read_point_light(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    read_color_intensity(parameter, current).or_else(|| read_attenuation(parameter, current))
}

pub(crate) fn map_spot_light(param: &Param<'_>) -> Result<Vec<Write>> {
    if let Some(write) = map_color_intensity(param).or_else(|| map_attenuation(param)) {
        return Ok(vec![write?]);
    }
    let write = match param.parameter {
        "innerAngle" | "outerAngle" => Write::set("float", param.parameter, param.degrees()?),
        "castsShadow" => casts_shadow(param)?,
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_spot_light(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "innerAngle" | "outerAngle" => read_degrees(current.number(None, parameter)),
        "castsShadow" => read_bool(current.boolean(Some(SHADOW), "isEnabled")),
        _ => read_point_light(parameter, current),
    }
}

pub(crate) fn map_image_based_light(param: &Param<'_>) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "intensityExponent" => {
            Write::set("float", "intensityExponent", format_float(param.number()?))
        }
        "isGlobal" => Write::set("bool", "isGlobalIBL", format_bool(param.boolean()?)),
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write])
}

pub(crate) fn read_image_based_light(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "intensityExponent" => read_number(current.number(None, "intensityExponent")),
        "isGlobal" => read_bool(current.boolean(None, "isGlobalIBL")),
        _ => None,
    }
}

pub(crate) fn map_grounding_shadow(param: &Param<'_>) -> Result<Vec<Write>> {
    let name = match param.parameter {
        "castsShadow" => "enableMeshCasting",
        "receivesShadow" => "enableReceiving",
        _ => return Err(param.unsupported()),
    };
    Ok(vec![Write::set("bool", name, format_bool(param.boolean()?))])
}

pub(crate) fn read_grounding_shadow(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "castsShadow" => read_bool(current.boolean(None, "enableMeshCasting")),
        "receivesShadow" => read_bool(current.boolean(None, "enableReceiving")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{
        map_parameter, read_parameter, ComponentDescendantAttributes, WriteAction,
    };
    use crate::error::Error;
    use usda_lite_core::AuthoredAttribute;

    fn shadow(attributes: Vec<AuthoredAttribute>) -> Vec<ComponentDescendantAttributes> {
        vec![ComponentDescendantAttributes {
            path: "/Root/Sun/DirectionalLight/Shadow".to_string(),
            name: "Shadow".to_string(),
            attributes,
        }]
    }

    #[test]
    fn test_fixed_projection_defaults_bounds() {
        let writes = map_parameter(
            DIRECTIONAL_LIGHT,
            "shadowProjection",
            &ParameterValue::Text("Fixed".into()),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].name, "shadowProjectionType");
        assert_eq!(writes[0].literal(), Some("\"Fixed\""));
        assert_eq!(writes[1].literal(), Some("0.01"));
        assert_eq!(writes[2].literal(), Some("10"));
        assert!(writes.iter().all(|w| w.sub_path() == Some("Shadow")));
    }

    #[test]
    fn test_fixed_projection_keeps_authored_bounds() {
        let descendants = shadow(vec![AuthoredAttribute::new("float", "zNear", "0.5")]);
        let snapshot = ComponentSnapshot::new(&[], &descendants);
        let writes = map_parameter(
            DIRECTIONAL_LIGHT,
            "shadowProjection",
            &ParameterValue::Text("Fixed".into()),
            &snapshot,
        )
        .unwrap();
        assert_eq!(writes[1].literal(), Some("0.5"));
        assert_eq!(writes[2].literal(), Some("10"));
    }

    #[test]
    fn test_automatic_projection_clears_bounds() {
        let writes = map_parameter(
            DIRECTIONAL_LIGHT,
            "shadowProjection",
            &ParameterValue::Text("Automatic".into()),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[1].action, WriteAction::Clear);
        assert_eq!(writes[1].name, "zNear");
        assert_eq!(writes[2].action, WriteAction::Clear);
        assert_eq!(writes[2].name, "zFar");
    }

    #[test]
    fn test_spot_light_angles_and_shadow() {
        let writes = map_parameter(
            SPOT_LIGHT,
            "outerAngle",
            &ParameterValue::Number(90.0),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].literal(), Some("1.570796"));

        let writes = map_parameter(
            SPOT_LIGHT,
            "castsShadow",
            &ParameterValue::Bool(true),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].name, "isEnabled");
        assert_eq!(writes[0].sub_path(), Some("Shadow"));

        assert!(matches!(
            map_parameter(
                SPOT_LIGHT,
                "depthBias",
                &ParameterValue::Number(1.0),
                &ComponentSnapshot::default()
            ),
            Err(Error::UnsupportedMapping { .. })
        ));
    }

    #[test]
    fn test_point_light_attenuation_round_trip() {
        let writes = map_parameter(
            POINT_LIGHT,
            "attenuationRadius",
            &ParameterValue::Number(250.0),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].literal(), Some("2.5"));

        let own = vec![AuthoredAttribute::new("float", "attenuationRadius", "2.5")];
        let snapshot = ComponentSnapshot::new(&own, &[]);
        assert_eq!(
            read_parameter(POINT_LIGHT, "attenuationRadius", &snapshot),
            Some(ParameterValue::Number(250.0))
        );
    }

    #[test]
    fn test_grounding_shadow_and_ibl() {
        let writes = map_parameter(
            GROUNDING_SHADOW,
            "receivesShadow",
            &ParameterValue::Bool(true),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].name, "enableReceiving");
        assert_eq!(writes[0].literal(), Some("1"));

        let writes = map_parameter(
            IMAGE_BASED_LIGHT,
            "isGlobal",
            &ParameterValue::Bool(false),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].name, "isGlobalIBL");
    }

    #[test]
    fn test_directional_read_back() {
        let own = vec![AuthoredAttribute::new("float3", "color", "(1, 0.5, 0)")];
        let descendants = shadow(vec![
            AuthoredAttribute::new("bool", "isEnabled", "1"),
            AuthoredAttribute::new("token", "shadowProjectionType", "\"Fixed\""),
            AuthoredAttribute::new("float", "zFar", "10"),
        ]);
        let snapshot = ComponentSnapshot::new(&own, &descendants);
        assert_eq!(
            read_parameter(DIRECTIONAL_LIGHT, "color", &snapshot),
            Some(ParameterValue::Vector3([1.0, 0.5, 0.0]))
        );
        assert_eq!(
            read_parameter(DIRECTIONAL_LIGHT, "castsShadow", &snapshot),
            Some(ParameterValue::Bool(true))
        );
        assert_eq!(
            read_parameter(DIRECTIONAL_LIGHT, "shadowProjection", &snapshot),
            Some(ParameterValue::Text("Fixed".into()))
        );
        assert_eq!(
            read_parameter(DIRECTIONAL_LIGHT, "shadowFar", &snapshot),
            Some(ParameterValue::Number(1000.0))
        );
    }
}
