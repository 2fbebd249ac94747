// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Anchoring target and anchoring transform parameters
//!
//! Position, orientation and scale are edited independently but stored as
//! one `matrix4d transform` on the descriptor. Each edit decomposes the
//! authored matrix, replaces one field and recomposes.

use usda_lite_core::{format_matrix4, parse_matrix4};
use usda_lite_geometry::{
    compose_anchoring_matrix, decompose_anchoring_matrix, tidy, TransformComponents, Vector3,
};

use super::{
    read_text, token, ComponentParameterWriteSpec as Write, ComponentSnapshot, Param,
    ParameterValue,
};
use crate::error::Result;

pub const ANCHORING: &str = "RealityKit.Anchoring";

pub const ANCHORING_KEYS: &[&str] = &["target", "alignment", "position", "orientation", "scale"];

const DESCRIPTOR: &str = "descriptor";

/// Current components of the authored transform; identity when absent or
/// degenerate.
fn current_components(current: &ComponentSnapshot<'_>) -> TransformComponents {
    current
        .literal(Some(DESCRIPTOR), "transform")
        .and_then(parse_matrix4)
        .and_then(|rows| decompose_anchoring_matrix(&rows).ok())
        .unwrap_or_default()
}

pub(crate) fn map_anchoring(
    param: &Param<'_>,
    current: &ComponentSnapshot<'_>,
) -> Result<Vec<Write>> {
    let write = match param.parameter {
        "target" => Write::set(
            "token",
            "type",
            token(param.choice(&["Plane", "Image", "Face", "World", "Hand", "Head"])?),
        ),
        "alignment" => Write::set(
            "token",
            "alignment",
            token(param.choice(&["Horizontal", "Vertical", "Any"])?),
        ),
        "position" | "orientation" | "scale" => {
            let [x, y, z] = param.vec3()?;
            let value = Vector3::new(x, y, z);
            let mut components = current_components(current);
            match param.parameter {
                "position" => components.position = value,
                "orientation" => components.orientation_degrees = value,
                _ => components.scale = value,
            }
            Write::set(
                "matrix4d",
                "transform",
                format_matrix4(&compose_anchoring_matrix(&components)),
            )
        }
        _ => return Err(param.unsupported()),
    };
    Ok(vec![write.at(DESCRIPTOR)])
}

pub(crate) fn read_anchoring(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    let vector = |v: Vector3<f64>| ParameterValue::Vector3([tidy(v.x), tidy(v.y), tidy(v.z)]);
    match parameter {
        "target" => read_text(current.token(Some(DESCRIPTOR), "type")),
        "alignment" => read_text(current.token(Some(DESCRIPTOR), "alignment")),
        "position" | "orientation" | "scale" => {
            let rows = current.literal(Some(DESCRIPTOR), "transform").and_then(parse_matrix4)?;
            let components = decompose_anchoring_matrix(&rows).ok()?;
            Some(match parameter {
                "position" => vector(components.position),
                "orientation" => vector(components.orientation_degrees),
                _ => vector(components.scale),
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{map_parameter, read_parameter, ComponentDescendantAttributes};
    use crate::error::Error;
    use usda_lite_core::AuthoredAttribute;

    fn descriptor(literal: &str) -> Vec<ComponentDescendantAttributes> {
        vec![ComponentDescendantAttributes {
            path: "/Root/Anchor/AnchoringComponent/descriptor".to_string(),
            name: "descriptor".to_string(),
            attributes: vec![AuthoredAttribute::new("matrix4d", "transform", literal)],
        }]
    }

    #[test]
    fn test_position_on_identity() {
        let writes = map_parameter(
            ANCHORING,
            "position",
            &ParameterValue::Vector3([1.0, 2.0, 3.0]),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].type_tag, "matrix4d");
        assert_eq!(writes[0].sub_path(), Some("descriptor"));
        assert_eq!(
            writes[0].literal(),
            Some("( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (1, 2, 3, 1) )")
        );
    }

    #[test]
    fn test_scale_keeps_position() {
        let descendants = descriptor("( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (1, 2, 3, 1) )");
        let snapshot = ComponentSnapshot::new(&[], &descendants);
        let writes = map_parameter(
            ANCHORING,
            "scale",
            &ParameterValue::Vector3([2.0, 3.0, 4.0]),
            &snapshot,
        )
        .unwrap();
        assert_eq!(
            writes[0].literal(),
            Some("( (2, 0, 0, 0), (0, 3, 0, 0), (0, 0, 4, 0), (1, 2, 3, 1) )")
        );
    }

    #[test]
    fn test_orientation_round_trip() {
        let writes = map_parameter(
            ANCHORING,
            "orientation",
            &ParameterValue::Vector3([10.0, 20.0, 30.0]),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        let descendants = descriptor(writes[0].literal().unwrap());
        let snapshot = ComponentSnapshot::new(&[], &descendants);

        let Some(ParameterValue::Vector3(degrees)) =
            read_parameter(ANCHORING, "orientation", &snapshot)
        else {
            panic!("Expected a vector");
        };
        for (actual, expected) in degrees.iter().zip([10.0, 20.0, 30.0]) {
            assert!((actual - expected).abs() < 1e-3, "{} vs {}", actual, expected);
        }
        assert_eq!(
            read_parameter(ANCHORING, "scale", &snapshot),
            Some(ParameterValue::Vector3([1.0, 1.0, 1.0]))
        );
    }

    #[test]
    fn test_degenerate_transform_resets() {
        let descendants = descriptor("( (0, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (5, 5, 5, 1) )");
        let snapshot = ComponentSnapshot::new(&[], &descendants);
        assert_eq!(read_parameter(ANCHORING, "position", &snapshot), None);

        let writes = map_parameter(
            ANCHORING,
            "position",
            &ParameterValue::Vector3([0.0, 1.0, 0.0]),
            &snapshot,
        )
        .unwrap();
        assert_eq!(
            writes[0].literal(),
            Some("( (1, 0, 0, 0), (0, 1, 0, 0), (0, 0, 1, 0), (0, 1, 0, 1) )")
        );
    }

    #[test]
    fn test_target_choices() {
        let writes = map_parameter(
            ANCHORING,
            "target",
            &ParameterValue::Text("Plane".into()),
            &ComponentSnapshot::default(),
        )
        .unwrap();
        assert_eq!(writes[0].name, "type");
        assert_eq!(writes[0].literal(), Some("\"Plane\""));
        assert!(matches!(
            map_parameter(
                ANCHORING,
                "alignment",
                &ParameterValue::Text("Diagonal".into()),
                &ComponentSnapshot::default(),
            ),
            Err(Error::InvalidValue { .. })
        ));
    }
}
