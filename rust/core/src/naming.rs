// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Prim-name synthesis for imported resources and new components

use crate::error::{Error, Result};
use crate::scene::is_valid_prim_name;

/// What a synthesized prim stands for; picks the fallback name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Audio,
    Texture,
    Reference,
    Material,
    Component,
    Generic,
}

impl ResourceKind {
    /// Name used when sanitizing leaves nothing.
    pub fn placeholder(self) -> &'static str {
        match self {
            ResourceKind::Audio => "AudioResource",
            ResourceKind::Texture => "TextureResource",
            ResourceKind::Reference => "ReferencedAsset",
            ResourceKind::Material => "Material",
            ResourceKind::Component => "Component",
            ResourceKind::Generic => "Prim",
        }
    }
}

/// Turn arbitrary text (usually a file stem) into a valid prim name.
///
/// Non-alphanumeric characters become `_`, a leading digit gets a `_`
/// prefix, and an empty result falls back to the kind's placeholder.
pub fn sanitize_prim_name(raw: &str, kind: ResourceKind) -> String {
    let mut name: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.is_empty() {
        return kind.placeholder().to_string();
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// Sanitize the stem of a file name (extension dropped).
pub fn prim_name_for_file(file_name: &str, kind: ResourceKind) -> String {
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };
    sanitize_prim_name(stem, kind)
}

/// First of `base`, `base_1`, `base_2`, ... not rejected by `taken`.
pub fn unique_name<F>(base: &str, taken: F) -> String
where
    F: Fn(&str) -> bool,
{
    if !taken(base) {
        return base.to_string();
    }
    (1u32..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Reject names that cannot be used as a prim name verbatim.
pub fn validate_prim_name(name: &str) -> Result<()> {
    if is_valid_prim_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_and_prefixes() {
        assert_eq!(sanitize_prim_name("door-creak 01", ResourceKind::Audio), "door_creak_01");
        assert_eq!(sanitize_prim_name("3rd.take", ResourceKind::Audio), "_3rd_take");
        assert_eq!(sanitize_prim_name("Already_Fine", ResourceKind::Generic), "Already_Fine");
    }

    #[test]
    fn test_sanitize_empty_uses_placeholder() {
        assert_eq!(sanitize_prim_name("", ResourceKind::Audio), "AudioResource");
        assert_eq!(sanitize_prim_name("", ResourceKind::Texture), "TextureResource");
        assert_ne!(
            ResourceKind::Audio.placeholder(),
            ResourceKind::Reference.placeholder()
        );
    }

    #[test]
    fn test_prim_name_for_file() {
        assert_eq!(prim_name_for_file("rain loop.wav", ResourceKind::Audio), "rain_loop");
        assert_eq!(prim_name_for_file(".wav", ResourceKind::Audio), "_wav");
        assert_eq!(prim_name_for_file("noext", ResourceKind::Audio), "noext");
    }

    #[test]
    fn test_unique_name() {
        let existing = ["Rain", "Rain_1"];
        assert_eq!(unique_name("Rain", |n| existing.contains(&n)), "Rain_2");
        assert_eq!(unique_name("Snow", |n| existing.contains(&n)), "Snow");
    }

    #[test]
    fn test_validate_prim_name() {
        assert!(validate_prim_name("Good_1").is_ok());
        assert_eq!(
            validate_prim_name("bad name"),
            Err(Error::InvalidName("bad name".to_string()))
        );
    }
}
