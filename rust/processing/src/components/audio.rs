// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial, ambient and channel audio parameters

use usda_lite_core::format_float;

use super::{
    read_number, ComponentParameterWriteSpec as Write, ComponentSnapshot, Param, ParameterValue,
};
use crate::error::Result;

pub const SPATIAL_AUDIO: &str = "RealityKit.SpatialAudio";
pub const AMBIENT_AUDIO: &str = "RealityKit.AmbientAudio";
pub const CHANNEL_AUDIO: &str = "RealityKit.ChannelAudio";

pub const SPATIAL_AUDIO_KEYS: &[&str] =
    &["gain", "reverbLevel", "directivityFocus", "rolloffFactor"];
pub const GAIN_ONLY_KEYS: &[&str] = &["gain"];

/// Prim type of an imported audio file.
pub const AUDIO_FILE_TYPE: &str = "RealityKitAudioFile";

/// Name of the resource container under a component.
pub const RESOURCES_NAME: &str = "resources";

/// Prim type of the resource container.
pub const DICT_TYPE: &str = "RealityKitDict";

pub(crate) fn map_spatial_audio(param: &Param<'_>) -> Result<Vec<Write>> {
    let value = match param.parameter {
        // Decibels, stored as authored
        "gain" | "reverbLevel" => param.number()?,
        "directivityFocus" => param.unit_interval()?,
        "rolloffFactor" => param.non_negative()?,
        _ => return Err(param.unsupported()),
    };
    Ok(vec![Write::set("double", param.parameter, format_float(value))])
}

pub(crate) fn read_spatial_audio(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    if SPATIAL_AUDIO_KEYS.contains(&parameter) {
        read_number(current.number(None, parameter))
    } else {
        None
    }
}

pub(crate) fn map_gain_only(param: &Param<'_>) -> Result<Vec<Write>> {
    match param.parameter {
        "gain" => Ok(vec![Write::set("double", "gain", format_float(param.number()?))]),
        _ => Err(param.unsupported()),
    }
}

pub(crate) fn read_gain_only(
    parameter: &str,
    current: &ComponentSnapshot<'_>,
) -> Option<ParameterValue> {
    match parameter {
        "gain" => read_number(current.number(None, "gain")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{map_parameter, read_parameter};
    use crate::error::Error;
    use usda_lite_core::AuthoredAttribute;

    fn map(component: &str, parameter: &str, value: f64) -> Result<Vec<Write>> {
        map_parameter(
            component,
            parameter,
            &ParameterValue::Number(value),
            &ComponentSnapshot::default(),
        )
    }

    #[test]
    fn test_spatial_audio_clamps() {
        let focus = map(SPATIAL_AUDIO, "directivityFocus", 1.7).unwrap();
        assert_eq!(focus[0].type_tag, "double");
        assert_eq!(focus[0].literal(), Some("1"));

        let rolloff = map(SPATIAL_AUDIO, "rolloffFactor", -0.5).unwrap();
        assert_eq!(rolloff[0].literal(), Some("0"));

        let gain = map(SPATIAL_AUDIO, "gain", -6.5).unwrap();
        assert_eq!(gain[0].literal(), Some("-6.5"));
    }

    #[test]
    fn test_gain_only_components() {
        for component in [AMBIENT_AUDIO, CHANNEL_AUDIO] {
            let writes = map(component, "gain", -12.0).unwrap();
            assert_eq!(writes[0].name, "gain");
            assert!(matches!(
                map(component, "reverbLevel", 1.0),
                Err(Error::UnsupportedMapping { .. })
            ));
        }
    }

    #[test]
    fn test_audio_read_back() {
        let own = vec![
            AuthoredAttribute::new("double", "gain", "-3"),
            AuthoredAttribute::new("double", "reverbLevel", "0.25"),
        ];
        let snapshot = ComponentSnapshot::new(&own, &[]);
        assert_eq!(
            read_parameter(SPATIAL_AUDIO, "reverbLevel", &snapshot),
            Some(ParameterValue::Number(0.25))
        );
        assert_eq!(
            read_parameter(AMBIENT_AUDIO, "gain", &snapshot),
            Some(ParameterValue::Number(-3.0))
        );
        assert_eq!(read_parameter(AMBIENT_AUDIO, "reverbLevel", &snapshot), None);
    }
}
