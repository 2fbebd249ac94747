// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer and prim metadata blocks
//!
//! Metadata lives in `( ... )` blocks: one at the top of the layer and one
//! optionally after each prim declaration. Entries are `key = value` lines;
//! values may be dictionaries (`{ ... }`) containing further typed entries.

use crate::literal::{
    format_asset_reference, format_float, format_string, parse_asset_reference, parse_bool,
    parse_number, parse_string, parse_string_array, parse_token,
};
use crate::scene::{PrimMetadata, ReferenceSpec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// List-op keywords that may prefix a metadata key.
const LIST_OPS: [&str; 5] = ["prepend", "append", "delete", "add", "reorder"];

/// One `key = value` metadata entry. The key keeps any list-op or type prefix
/// (`prepend references`, `string playbackMode`).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The bare entry name, without list-op or type prefix.
    pub fn name(&self) -> &str {
        self.key.split_whitespace().last().unwrap_or("")
    }

    /// The list-op prefix, if any.
    pub fn list_op(&self) -> Option<&str> {
        let first = self.key.split_whitespace().next()?;
        LIST_OPS.contains(&first).then_some(first)
    }

    /// Entries of a dictionary value (`{ ... }`), empty for other values.
    pub fn dictionary(&self) -> Vec<MetadataEntry> {
        let trimmed = self.value.trim();
        match trimmed.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => parse_metadata_block(inner),
            None => Vec::new(),
        }
    }

    /// Render as a single `key = value` line (a bare value when there is no key).
    pub fn to_line(&self) -> String {
        if self.key.is_empty() {
            self.value.clone()
        } else {
            format!("{} = {}", self.key, self.value)
        }
    }
}

/// Split the inside of a metadata block (or dictionary) into entries.
///
/// Entries are separated by newlines or `;` outside of strings and nested
/// brackets. Lines that cannot be read as an entry are skipped.
pub fn parse_metadata_block(inner: &str) -> Vec<MetadataEntry> {
    split_top_level(inner)
        .into_iter()
        .filter_map(|item| {
            let item = item.trim();
            if item.is_empty() {
                return None;
            }
            match find_top_level(item, '=') {
                Some(eq) => {
                    let key = item[..eq].trim();
                    let value = item[eq + 1..].trim();
                    (!key.is_empty()).then(|| MetadataEntry::new(key, value))
                }
                // A bare string documents the prim
                None if item.starts_with('"') => Some(MetadataEntry::new("", item)),
                None => None,
            }
        })
        .collect()
}

/// Split on newlines and `;` at nesting depth zero.
fn split_top_level(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '@' => {
                quote = Some(c);
                current.push(c);
            }
            '<' => {
                quote = Some('>');
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = (depth - 1).max(0);
                current.push(c);
            }
            '\n' | ';' if depth == 0 => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);
    items
}

/// Byte offset of the first `needle` outside strings and nested brackets.
pub(crate) fn find_top_level(text: &str, needle: char) -> Option<usize> {
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '@' => quote = Some(c),
            '<' => quote = Some('>'),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ if c == needle && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Layer-level metadata from the header block.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LayerMetadata {
    pub default_prim: Option<String>,
    pub meters_per_unit: Option<f64>,
    pub up_axis: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// `timeCodesPerSecond`, falling back to `framesPerSecond`
    pub fps: Option<f64>,
    /// Read-only: found anywhere in the header, including `customLayerData`
    pub auto_play: Option<bool>,
    /// Read-only: found anywhere in the header, including `customLayerData`
    pub playback_mode: Option<String>,
    /// Every entry not mapped to an editable field, in source order
    pub extra: Vec<MetadataEntry>,
}

impl LayerMetadata {
    pub fn from_entries(entries: Vec<MetadataEntry>) -> Self {
        let mut metadata = LayerMetadata::default();
        let mut frames_per_second = None;

        for entry in entries {
            match entry.name() {
                "defaultPrim" => metadata.default_prim = parse_token(&entry.value),
                "metersPerUnit" => metadata.meters_per_unit = parse_number(&entry.value),
                "upAxis" => metadata.up_axis = parse_token(&entry.value),
                "startTimeCode" => metadata.start_time = parse_number(&entry.value),
                "endTimeCode" => metadata.end_time = parse_number(&entry.value),
                "timeCodesPerSecond" => metadata.fps = parse_number(&entry.value),
                _ => {
                    if entry.name() == "framesPerSecond" {
                        frames_per_second = parse_number(&entry.value);
                    }
                    metadata.collect_playback(&entry);
                    metadata.extra.push(entry);
                }
            }
        }

        if metadata.fps.is_none() {
            metadata.fps = frames_per_second;
        }
        metadata
    }

    /// Pick up `autoPlay` / `playbackMode` at any depth.
    fn collect_playback(&mut self, entry: &MetadataEntry) {
        match entry.name() {
            "autoPlay" => self.auto_play = parse_bool(&entry.value),
            "playbackMode" => self.playback_mode = parse_token(&entry.value),
            _ => {
                for nested in entry.dictionary() {
                    self.collect_playback(&nested);
                }
            }
        }
    }

    /// Entries to write back, editable fields first.
    pub fn to_entries(&self) -> Vec<MetadataEntry> {
        let mut entries = Vec::new();
        if let Some(prim) = &self.default_prim {
            entries.push(MetadataEntry::new("defaultPrim", format_string(prim)));
        }
        if let Some(value) = self.meters_per_unit {
            entries.push(MetadataEntry::new("metersPerUnit", format_float(value)));
        }
        if let Some(axis) = &self.up_axis {
            entries.push(MetadataEntry::new("upAxis", format_string(axis)));
        }
        if let Some(value) = self.start_time {
            entries.push(MetadataEntry::new("startTimeCode", format_float(value)));
        }
        if let Some(value) = self.end_time {
            entries.push(MetadataEntry::new("endTimeCode", format_float(value)));
        }
        if let Some(value) = self.fps {
            if !self.extra.iter().any(|e| e.name() == "framesPerSecond") {
                entries.push(MetadataEntry::new("timeCodesPerSecond", format_float(value)));
            }
        }
        entries.extend(self.extra.iter().cloned());
        entries
    }
}

impl PrimMetadata {
    pub fn from_entries(entries: Vec<MetadataEntry>) -> Self {
        let mut metadata = PrimMetadata::default();

        for entry in entries {
            match entry.name() {
                "active" => metadata.active = parse_bool(&entry.value),
                "kind" => metadata.kind = parse_token(&entry.value),
                "references" => {
                    metadata.references_op = entry.list_op().map(str::to_string);
                    metadata.references = parse_references(&entry.value);
                }
                "variants" => {
                    for selection in entry.dictionary() {
                        if let Some(option) = parse_token(&selection.value) {
                            metadata
                                .variant_selections
                                .push((selection.name().to_string(), option));
                        }
                    }
                }
                _ => metadata.extra.push(entry),
            }
        }
        metadata
    }

    pub fn to_entries(&self) -> Vec<MetadataEntry> {
        let mut entries = Vec::new();
        if let Some(active) = self.active {
            entries.push(MetadataEntry::new("active", active.to_string()));
        }
        if let Some(kind) = &self.kind {
            entries.push(MetadataEntry::new("kind", format_string(kind)));
        }
        if !self.references.is_empty() {
            let key = match &self.references_op {
                Some(op) => format!("{} references", op),
                None => "references".to_string(),
            };
            entries.push(MetadataEntry::new(key, format_references(&self.references)));
        }
        if !self.variant_selections.is_empty() {
            let body: Vec<String> = self
                .variant_selections
                .iter()
                .map(|(set, option)| format!("string {} = {}", set, format_string(option)))
                .collect();
            entries.push(MetadataEntry::new("variants", format!("{{\n{}\n}}", body.join("\n"))));
        }
        entries.extend(self.extra.iter().cloned());
        entries
    }

    /// Names listed in `variantSets` entries (any list-op).
    pub fn declared_variant_sets(&self) -> Vec<String> {
        self.extra
            .iter()
            .filter(|e| e.name() == "variantSets")
            .flat_map(|e| {
                parse_string_array(&e.value)
                    .or_else(|| parse_string(&e.value).map(|s| vec![s]))
                    .unwrap_or_default()
            })
            .collect()
    }
}

/// Parse `@a@</P>` or `[@a@, @b@</Q>]`.
fn parse_references(value: &str) -> Vec<ReferenceSpec> {
    let trimmed = value.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);

    let mut references = Vec::new();
    let mut rest = body;
    while let Some(comma) = find_top_level(rest, ',') {
        references.extend(reference_item(&rest[..comma]));
        rest = &rest[comma + 1..];
    }
    references.extend(reference_item(rest));
    references
}

fn reference_item(item: &str) -> Option<ReferenceSpec> {
    let (asset_path, prim_path) = parse_asset_reference(item)?;
    Some(ReferenceSpec {
        asset_path,
        prim_path,
    })
}

fn format_references(references: &[ReferenceSpec]) -> String {
    let items: Vec<String> = references
        .iter()
        .map(|r| format_asset_reference(&r.asset_path, r.prim_path.as_deref()))
        .collect();
    if items.len() == 1 {
        items[0].clone()
    } else {
        format!("[{}]", items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metadata_block() {
        let entries = parse_metadata_block(
            "\n    defaultPrim = \"Root\"\n    metersPerUnit = 0.01; upAxis = \"Y\"\
             \n    doc = \"a = b\"\n",
        );
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].name(), "defaultPrim");
        assert_eq!(entries[2].value, "\"Y\"");
        assert_eq!(entries[3].value, "\"a = b\"");
    }

    #[test]
    fn test_layer_metadata() {
        let block = r#"
    defaultPrim = "Root"
    metersPerUnit = 1
    upAxis = "Y"
    startTimeCode = 0
    endTimeCode = 48
    timeCodesPerSecond = 24
    customLayerData = {
        dictionary playback = {
            bool autoPlay = 1
            string playbackMode = "loop"
        }
    }
"#;
        let metadata = LayerMetadata::from_entries(parse_metadata_block(block));
        assert_eq!(metadata.default_prim.as_deref(), Some("Root"));
        assert_eq!(metadata.meters_per_unit, Some(1.0));
        assert_eq!(metadata.end_time, Some(48.0));
        assert_eq!(metadata.fps, Some(24.0));
        assert_eq!(metadata.auto_play, Some(true));
        assert_eq!(metadata.playback_mode.as_deref(), Some("loop"));
        assert_eq!(metadata.extra.len(), 1);

        // Writing keeps the custom data verbatim
        let written = metadata.to_entries();
        assert!(written.iter().any(|e| e.name() == "customLayerData"));
        assert!(written.iter().any(|e| e.to_line() == "defaultPrim = \"Root\""));
    }

    #[test]
    fn test_frames_per_second_fallback() {
        let metadata = LayerMetadata::from_entries(parse_metadata_block("framesPerSecond = 30"));
        assert_eq!(metadata.fps, Some(30.0));
        assert!(metadata
            .to_entries()
            .iter()
            .all(|e| e.name() != "timeCodesPerSecond"));
    }

    #[test]
    fn test_prim_metadata() {
        let block = r#"
        active = false
        kind = "component"
        prepend references = [@./chair.usda@</Chair>, @./table.usda@]
        variants = {
            string color = "red"
        }
        prepend variantSets = "color"
        instanceable = true
"#;
        let metadata = PrimMetadata::from_entries(parse_metadata_block(block));
        assert_eq!(metadata.active, Some(false));
        assert_eq!(metadata.kind.as_deref(), Some("component"));
        assert_eq!(metadata.references_op.as_deref(), Some("prepend"));
        assert_eq!(metadata.references.len(), 2);
        assert_eq!(metadata.references[0].prim_path.as_deref(), Some("/Chair"));
        assert_eq!(metadata.references[1].prim_path, None);
        assert_eq!(metadata.variant_selection("color"), Some("red"));
        assert_eq!(metadata.declared_variant_sets(), vec!["color".to_string()]);
        assert_eq!(metadata.extra.len(), 2);

        let reparsed = PrimMetadata::from_entries(
            metadata
                .to_entries()
                .iter()
                .map(|e| MetadataEntry::new(e.key.clone(), e.value.clone()))
                .collect(),
        );
        assert_eq!(reparsed, metadata);
    }
}
