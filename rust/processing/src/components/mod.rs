// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component parameter table
//!
//! Maps a `(component identifier, parameter key, value)` edit to the typed
//! attribute writes that author it, and reads authored literals back into
//! the units the editor shows. Each component family lives in its own
//! module; [`map_parameter`] and [`read_parameter`] dispatch on the
//! identifier.

pub mod anchoring;
pub mod audio;
pub mod lighting;
pub mod physics;
pub mod presentation;

use serde::{Deserialize, Serialize};
use usda_lite_core::{
    find_attribute, format_float, format_string, format_uint, last_component, parse_bool,
    parse_number, parse_token, parse_vec3, AuthoredAttribute,
};
use usda_lite_geometry::{centimeters_to_meters, meters_to_centimeters};

use crate::error::{Error, Result};

/// A value as edited in the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Vector3([f64; 3]),
}

impl ParameterValue {
    /// Read a JSON scalar, string or 3-element number array.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(ParameterValue::Bool(*b)),
            serde_json::Value::Number(n) => n.as_f64().map(ParameterValue::Number),
            serde_json::Value::String(s) => Some(ParameterValue::Text(s.clone())),
            serde_json::Value::Array(items) if items.len() == 3 => {
                let mut v = [0.0; 3];
                for (slot, item) in v.iter_mut().zip(items) {
                    *slot = item.as_f64()?;
                }
                Some(ParameterValue::Vector3(v))
            }
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParameterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParameterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// What to do with the target attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteAction {
    /// Author this literal
    Set(String),
    /// Delete the authored opinion
    Clear,
}

/// Which prim a write lands on, relative to the component prim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteTarget {
    Component,
    /// A descendant struct prim, e.g. `Shape` or `m_controllerDesc`
    Descendant(String),
    /// The prim that owns the component
    Owner,
}

/// One physical attribute write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentParameterWriteSpec {
    /// Declared type, e.g. `float3` or `uniform token[]`
    pub type_tag: String,
    pub name: String,
    pub action: WriteAction,
    pub target: WriteTarget,
}

impl ComponentParameterWriteSpec {
    pub fn set(type_tag: &str, name: &str, literal: impl Into<String>) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            name: name.to_string(),
            action: WriteAction::Set(literal.into()),
            target: WriteTarget::Component,
        }
    }

    pub fn clear(type_tag: &str, name: &str) -> Self {
        Self {
            type_tag: type_tag.to_string(),
            name: name.to_string(),
            action: WriteAction::Clear,
            target: WriteTarget::Component,
        }
    }

    /// Retarget onto a descendant struct prim.
    pub fn at(mut self, sub_path: &str) -> Self {
        self.target = WriteTarget::Descendant(sub_path.to_string());
        self
    }

    /// Retarget onto the owning prim.
    pub fn on_owner(mut self) -> Self {
        self.target = WriteTarget::Owner;
        self
    }

    pub fn sub_path(&self) -> Option<&str> {
        match &self.target {
            WriteTarget::Descendant(sub) => Some(sub),
            _ => None,
        }
    }

    pub fn literal(&self) -> Option<&str> {
        match &self.action {
            WriteAction::Set(literal) => Some(literal),
            WriteAction::Clear => None,
        }
    }
}

/// Authored attributes of a prim below a component prim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescendantAttributes {
    pub path: String,
    pub name: String,
    pub attributes: Vec<AuthoredAttribute>,
}

/// The authored state a mapping or read-back works from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentSnapshot<'a> {
    pub attributes: &'a [AuthoredAttribute],
    pub descendants: &'a [ComponentDescendantAttributes],
    /// Attributes of the owning prim
    pub owner_attributes: &'a [AuthoredAttribute],
}

impl<'a> ComponentSnapshot<'a> {
    pub fn new(
        attributes: &'a [AuthoredAttribute],
        descendants: &'a [ComponentDescendantAttributes],
    ) -> Self {
        Self {
            attributes,
            descendants,
            owner_attributes: &[],
        }
    }

    pub fn with_owner(mut self, owner_attributes: &'a [AuthoredAttribute]) -> Self {
        self.owner_attributes = owner_attributes;
        self
    }

    /// Authored literal on the component (`None` sub path) or a descendant.
    pub fn literal(&self, sub_path: Option<&str>, name: &str) -> Option<&'a str> {
        let attributes: &'a [AuthoredAttribute] = match sub_path {
            None => self.attributes,
            Some(sub) => {
                let leaf = last_component(sub);
                let suffix = format!("/{}", sub);
                &self
                    .descendants
                    .iter()
                    .find(|d| d.path.ends_with(&suffix) || (!sub.contains('/') && d.name == leaf))?
                    .attributes
            }
        };
        find_attribute(attributes, name)
            .filter(|a| a.has_value())
            .map(|a| a.literal.as_str())
    }

    pub fn number(&self, sub_path: Option<&str>, name: &str) -> Option<f64> {
        self.literal(sub_path, name).and_then(parse_number)
    }

    pub fn boolean(&self, sub_path: Option<&str>, name: &str) -> Option<bool> {
        self.literal(sub_path, name).and_then(parse_bool)
    }

    pub fn token(&self, sub_path: Option<&str>, name: &str) -> Option<String> {
        self.literal(sub_path, name).and_then(parse_token)
    }

    pub fn vec3(&self, sub_path: Option<&str>, name: &str) -> Option<[f64; 3]> {
        self.literal(sub_path, name).and_then(parse_vec3)
    }

    pub fn owner_literal(&self, name: &str) -> Option<&'a str> {
        find_attribute(self.owner_attributes, name).map(|a| a.literal.as_str())
    }
}

/// The edit being mapped, with typed accessors that fail with
/// [`Error::InvalidValue`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct Param<'a> {
    pub component: &'a str,
    pub parameter: &'a str,
    pub value: &'a ParameterValue,
}

impl Param<'_> {
    pub fn unsupported(&self) -> Error {
        Error::unsupported(self.component, self.parameter)
    }

    fn invalid(&self, expected: impl Into<String>) -> Error {
        Error::invalid(self.component, self.parameter, expected)
    }

    pub fn number(&self) -> Result<f64> {
        match self.value {
            ParameterValue::Number(n) if n.is_finite() => Ok(*n),
            _ => Err(self.invalid("a finite number")),
        }
    }

    pub fn non_negative(&self) -> Result<f64> {
        Ok(self.number()?.max(0.0))
    }

    pub fn unit_interval(&self) -> Result<f64> {
        Ok(self.number()?.clamp(0.0, 1.0))
    }

    pub fn boolean(&self) -> Result<bool> {
        match self.value {
            ParameterValue::Bool(b) => Ok(*b),
            _ => Err(self.invalid("a boolean")),
        }
    }

    pub fn text(&self) -> Result<&str> {
        self.value.as_text().ok_or_else(|| self.invalid("text"))
    }

    pub fn vec3(&self) -> Result<[f64; 3]> {
        match self.value {
            ParameterValue::Vector3(v) if v.iter().all(|c| c.is_finite()) => Ok(*v),
            _ => Err(self.invalid("a 3-component vector")),
        }
    }

    /// One of a closed set of names.
    pub fn choice(&self, options: &[&'static str]) -> Result<&'static str> {
        let text = self.text()?;
        options
            .iter()
            .copied()
            .find(|option| *option == text)
            .ok_or_else(|| self.invalid(format!("one of {}", options.join(", "))))
    }

    /// Centimeters in, meters literal out.
    pub fn centimeters(&self) -> Result<String> {
        Ok(format_float(centimeters_to_meters(self.number()?)))
    }

    /// Degrees in, radians literal out.
    pub fn degrees(&self) -> Result<String> {
        Ok(format_float(self.number()?.to_radians()))
    }

    /// Named collision bitmask or raw number.
    pub fn bitmask(&self) -> Result<String> {
        let mask = match self.value {
            ParameterValue::Text(name) => match name.as_str() {
                "Default" => DEFAULT_COLLISION_BITS,
                "All" => ALL_COLLISION_BITS,
                _ => return Err(self.invalid("Default, All or a number")),
            },
            ParameterValue::Number(n) if !n.is_nan() => {
                n.round().clamp(0.0, u32::MAX as f64) as u32
            }
            _ => return Err(self.invalid("Default, All or a number")),
        };
        Ok(format_uint(mask))
    }
}

/// Bit pattern of the `Default` collision group.
pub const DEFAULT_COLLISION_BITS: u32 = 1;

/// Bit pattern of the `All` collision group.
pub const ALL_COLLISION_BITS: u32 = u32::MAX;

/// Quoted token literal.
pub(crate) fn token(value: &str) -> String {
    format_string(value)
}

/// Meters literal back to centimeters.
pub(crate) fn read_centimeters(meters: Option<f64>) -> Option<ParameterValue> {
    meters.map(|m| ParameterValue::Number(meters_to_centimeters(m)))
}

/// Radians literal back to degrees.
pub(crate) fn read_degrees(radians: Option<f64>) -> Option<ParameterValue> {
    radians.map(|r| ParameterValue::Number(usda_lite_geometry::radians_to_degrees(r)))
}

/// Stored bitmask back to its name when it has one.
pub(crate) fn read_bitmask(bits: Option<f64>) -> Option<ParameterValue> {
    let bits = bits?;
    Some(if bits == DEFAULT_COLLISION_BITS as f64 {
        ParameterValue::Text("Default".to_string())
    } else if bits == ALL_COLLISION_BITS as f64 {
        ParameterValue::Text("All".to_string())
    } else {
        ParameterValue::Number(bits)
    })
}

pub(crate) fn read_number(value: Option<f64>) -> Option<ParameterValue> {
    value.map(ParameterValue::Number)
}

pub(crate) fn read_bool(value: Option<bool>) -> Option<ParameterValue> {
    value.map(ParameterValue::Bool)
}

pub(crate) fn read_text(value: Option<String>) -> Option<ParameterValue> {
    value.map(ParameterValue::Text)
}

/// Map one parameter edit to its attribute writes.
///
/// `current` supplies authored values for rules that keep or default
/// neighbouring fields.
pub fn map_parameter(
    component: &str,
    parameter: &str,
    value: &ParameterValue,
    current: &ComponentSnapshot<'_>,
) -> Result<Vec<ComponentParameterWriteSpec>> {
    let param = Param {
        component,
        parameter,
        value,
    };
    let writes = match component {
        physics::COLLIDER => physics::map_collider(&param),
        physics::RIGID_BODY => physics::map_rigid_body(&param),
        physics::CHARACTER_CONTROLLER => physics::map_character_controller(&param, current),
        lighting::DIRECTIONAL_LIGHT => lighting::map_directional_light(&param, current),
        lighting::POINT_LIGHT => lighting::map_point_light(&param),
        lighting::SPOT_LIGHT => lighting::map_spot_light(&param),
        lighting::IMAGE_BASED_LIGHT => lighting::map_image_based_light(&param),
        lighting::GROUNDING_SHADOW => lighting::map_grounding_shadow(&param),
        audio::SPATIAL_AUDIO => audio::map_spatial_audio(&param),
        audio::AMBIENT_AUDIO | audio::CHANNEL_AUDIO => audio::map_gain_only(&param),
        anchoring::ANCHORING => anchoring::map_anchoring(&param, current),
        presentation::MESH_SORTING => presentation::map_mesh_sorting(&param),
        presentation::OPACITY => presentation::map_opacity(&param),
        presentation::INPUT_TARGET => presentation::map_input_target(&param),
        presentation::BILLBOARD => presentation::map_billboard(&param),
        _ => Err(param.unsupported()),
    }?;

    tracing::debug!(
        component = %component,
        parameter = %parameter,
        writes = writes.len(),
        "Mapped component parameter"
    );
    Ok(writes)
}

/// Read a parameter back from authored state in editor units.
/// `None` when nothing is authored or the pair is not in the table.
pub fn read_parameter(
    component: &str,
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match component {
        physics::COLLIDER => physics::read_collider(parameter, current),
        physics::RIGID_BODY => physics::read_rigid_body(parameter, current),
        physics::CHARACTER_CONTROLLER => physics::read_character_controller(parameter, current),
        lighting::DIRECTIONAL_LIGHT => lighting::read_directional_light(parameter, current),
        lighting::POINT_LIGHT => lighting::read_point_light(parameter, current),
        lighting::SPOT_LIGHT => lighting::read_spot_light(parameter, current),
        lighting::IMAGE_BASED_LIGHT => lighting::read_image_based_light(parameter, current),
        lighting::GROUNDING_SHADOW => lighting::read_grounding_shadow(parameter, current),
        audio::SPATIAL_AUDIO => audio::read_spatial_audio(parameter, current),
        audio::AMBIENT_AUDIO | audio::CHANNEL_AUDIO => audio::read_gain_only(parameter, current),
        anchoring::ANCHORING => anchoring::read_anchoring(parameter, current),
        presentation::MESH_SORTING => presentation::read_mesh_sorting(parameter, current),
        presentation::OPACITY => presentation::read_opacity(parameter, current),
        presentation::INPUT_TARGET => presentation::read_input_target(parameter, current),
        presentation::BILLBOARD => presentation::read_billboard(parameter, current),
        _ => None,
    }
}

/// Parameter keys the table accepts for a component.
pub fn parameter_keys(component: &str) -> &'static [&'static str] {
    match component {
        physics::COLLIDER => physics::COLLIDER_KEYS,
        physics::RIGID_BODY => physics::RIGID_BODY_KEYS,
        physics::CHARACTER_CONTROLLER => physics::CHARACTER_CONTROLLER_KEYS,
        lighting::DIRECTIONAL_LIGHT => lighting::DIRECTIONAL_LIGHT_KEYS,
        lighting::POINT_LIGHT => lighting::POINT_LIGHT_KEYS,
        lighting::SPOT_LIGHT => lighting::SPOT_LIGHT_KEYS,
        lighting::IMAGE_BASED_LIGHT => lighting::IMAGE_BASED_LIGHT_KEYS,
        lighting::GROUNDING_SHADOW => lighting::GROUNDING_SHADOW_KEYS,
        audio::SPATIAL_AUDIO => audio::SPATIAL_AUDIO_KEYS,
        audio::AMBIENT_AUDIO | audio::CHANNEL_AUDIO => audio::GAIN_ONLY_KEYS,
        anchoring::ANCHORING => anchoring::ANCHORING_KEYS,
        presentation::MESH_SORTING => presentation::MESH_SORTING_KEYS,
        presentation::OPACITY => presentation::OPACITY_KEYS,
        presentation::INPUT_TARGET => presentation::INPUT_TARGET_KEYS,
        presentation::BILLBOARD => presentation::BILLBOARD_KEYS,
        _ => &[],
    }
}

/// Every parameter of a component that currently has an authored value.
pub fn read_all_parameters(
    component: &str,
    current: &ComponentSnapshot<'_>,
) -> Vec<(&'static str, ParameterValue)> {
    parameter_keys(component)
        .iter()
        .filter_map(|key| read_parameter(component, key, current).map(|value| (*key, value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(
        component: &str,
        parameter: &str,
        value: ParameterValue,
    ) -> Result<Vec<ComponentParameterWriteSpec>> {
        map_parameter(component, parameter, &value, &ComponentSnapshot::default())
    }

    #[test]
    fn test_unsupported_names_the_pair() {
        let err = map("RealityKit.Collider", "colour", ParameterValue::Number(1.0)).unwrap_err();
        match err {
            Error::UnsupportedMapping { component, parameter } => {
                assert_eq!(component, "RealityKit.Collider");
                assert_eq!(parameter, "colour");
            }
            other => panic!("Expected UnsupportedMapping, got {:?}", other),
        }
        assert!(matches!(
            map("Vendor.Unknown", "anything", ParameterValue::Bool(true)),
            Err(Error::UnsupportedMapping { .. })
        ));
    }

    #[test]
    fn test_wrong_shape_is_invalid_value() {
        assert!(matches!(
            map("RealityKit.Collider", "shape", ParameterValue::Number(2.0)),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            map("RealityKit.Collider", "shape", ParameterValue::Text("Cone".into())),
            Err(Error::InvalidValue { .. })
        ));
        assert!(matches!(
            map("RealityKit.Opacity", "opacity", ParameterValue::Number(f64::NAN)),
            Err(Error::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_bitmask_rules() {
        let group = |value| map("RealityKit.Collider", "group", value).unwrap()[0].clone();
        assert_eq!(group(ParameterValue::Text("Default".into())).literal(), Some("1"));
        assert_eq!(group(ParameterValue::Text("All".into())).literal(), Some("4294967295"));
        assert_eq!(group(ParameterValue::Number(6.6)).literal(), Some("7"));
        assert_eq!(group(ParameterValue::Number(-3.0)).literal(), Some("0"));
        assert_eq!(group(ParameterValue::Number(1e12)).literal(), Some("4294967295"));
        assert_eq!(group(ParameterValue::Number(2.0)).type_tag, "uint");
    }

    #[test]
    fn test_snapshot_lookup_by_sub_path() {
        let descendants = vec![ComponentDescendantAttributes {
            path: "/Root/Collider/Shape".to_string(),
            name: "Shape".to_string(),
            attributes: vec![AuthoredAttribute::new("float", "radius", "0.25")],
        }];
        let own = vec![
            AuthoredAttribute::new("uint", "group", "1"),
            AuthoredAttribute::new("float", "declaredOnly", ""),
        ];
        let snapshot = ComponentSnapshot::new(&own, &descendants);
        assert_eq!(snapshot.number(Some("Shape"), "radius"), Some(0.25));
        assert_eq!(snapshot.number(None, "group"), Some(1.0));
        assert_eq!(snapshot.literal(None, "declaredOnly"), None);
        assert_eq!(snapshot.literal(Some("Missing"), "radius"), None);
    }

    #[test]
    fn test_parameter_value_from_json() {
        let parse = |text: &str| ParameterValue::from_json(&serde_json::from_str(text).unwrap());
        assert_eq!(parse("true"), Some(ParameterValue::Bool(true)));
        assert_eq!(parse("150"), Some(ParameterValue::Number(150.0)));
        assert_eq!(parse("\"Sphere\""), Some(ParameterValue::Text("Sphere".into())));
        assert_eq!(parse("[0, 1, 0]"), Some(ParameterValue::Vector3([0.0, 1.0, 0.0])));
        assert_eq!(parse("[0, 1]"), None);
        assert_eq!(parse("null"), None);
    }

    #[test]
    fn test_read_all_parameters_skips_unauthored() {
        let own = vec![AuthoredAttribute::new("float", "opacity", "0.5")];
        let snapshot = ComponentSnapshot::new(&own, &[]);
        let values = read_all_parameters("RealityKit.Opacity", &snapshot);
        assert_eq!(values, vec![("opacity", ParameterValue::Number(0.5))]);
        assert!(read_all_parameters("Vendor.Unknown", &snapshot).is_empty());
    }
}
