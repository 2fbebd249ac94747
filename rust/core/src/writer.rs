// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! USDA text writer
//!
//! Renders a [`ParsedLayer`] back to text. Literals and uninterpreted
//! metadata are written verbatim, so parsing the output yields the same tree.

use std::fmt::Write as _;

use crate::literal::format_string;
use crate::metadata::MetadataEntry;
use crate::parser::ParsedLayer;
use crate::scene::{AuthoredAttribute, SceneNode, VariantSetSpec};

const INDENT: &str = "    ";

/// Render a whole layer, header first.
pub fn write_layer(layer: &ParsedLayer) -> String {
    let mut out = String::from("#usda 1.0\n");
    let header = layer.metadata.to_entries();
    if !header.is_empty() {
        write_metadata_block(&mut out, &header, 0);
        out.push('\n');
    }
    for root in &layer.roots {
        out.push('\n');
        write_prim(&mut out, root, 0);
    }
    out
}

/// Render one prim subtree at the given depth.
pub fn write_prim(out: &mut String, node: &SceneNode, depth: usize) {
    let pad = INDENT.repeat(depth);
    out.push_str(&pad);
    out.push_str(node.specifier.keyword());
    if let Some(type_name) = &node.type_name {
        out.push(' ');
        out.push_str(type_name);
    }
    out.push(' ');
    out.push_str(&format_string(&node.name));

    let entries = node.metadata.to_entries();
    if entries.is_empty() {
        out.push('\n');
    } else {
        out.push(' ');
        write_metadata_block(out, &entries, depth);
    }

    let _ = writeln!(out, "{}{{", pad);
    write_body(out, &node.attributes, &node.children, &node.variant_sets, depth + 1);
    let _ = writeln!(out, "{}}}", pad);
}

fn write_body(
    out: &mut String,
    attributes: &[AuthoredAttribute],
    children: &[SceneNode],
    variant_sets: &[VariantSetSpec],
    depth: usize,
) {
    for attribute in attributes {
        write_attribute(out, attribute, depth);
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 || !attributes.is_empty() {
            out.push('\n');
        }
        write_prim(out, child, depth);
    }
    for set in variant_sets {
        out.push('\n');
        write_variant_set(out, set, depth);
    }
}

fn write_attribute(out: &mut String, attribute: &AuthoredAttribute, depth: usize) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(&attribute.type_name);
    out.push(' ');
    out.push_str(&attribute.name);
    if attribute.has_value() {
        out.push_str(" = ");
        out.push_str(&attribute.literal);
    }
    if let Some(metadata) = &attribute.metadata {
        let _ = write!(out, " ({})", metadata);
    }
    out.push('\n');
}

fn write_variant_set(out: &mut String, set: &VariantSetSpec, depth: usize) {
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    let _ = writeln!(out, "{}variantSet {} = {{", pad, format_string(&set.name));
    for option in &set.options {
        let _ = writeln!(out, "{}{} {{", inner, format_string(&option.name));
        write_body(out, &option.attributes, &option.children, &[], depth + 2);
        let _ = writeln!(out, "{}}}", inner);
    }
    let _ = writeln!(out, "{}}}", pad);
}

/// Write `(` entries `)` with the closing paren at `depth`.
fn write_metadata_block(out: &mut String, entries: &[MetadataEntry], depth: usize) {
    let pad = INDENT.repeat(depth);
    let inner = INDENT.repeat(depth + 1);
    out.push_str("(\n");
    for entry in entries {
        out.push_str(&inner);
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out.push_str(&pad);
    out.push_str(")\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_layer;
    use crate::scene::Specifier;

    const SAMPLE: &str = r#"#usda 1.0
(
    defaultPrim = "Root"
    metersPerUnit = 1
    customLayerData = {
        dictionary playback = {
            bool autoPlay = 0
        }
    }
)

def Xform "Root" (
    kind = "component"
    variants = {
        string look = "plain"
    }
    prepend variantSets = "look"
)
{
    double3 xformOp:translate = (0, 0.5, 0)
    rel material:binding = </Root/Mat> (bindMaterialAs = "weakerThanDescendants")
    float radius.timeSamples = {
        0: 1,
        24: 2,
    }

    def RealityKitComponent "Collider"
    {
        uint group = 1
    }

    over "Tweak"
    {
    }

    variantSet "look" = {
        "plain" {
            def Mesh "Plain" {}
        }
        "fancy" {
            float fancyness = 3
            def Mesh "Fancy" {}
        }
    }
}
"#;

    #[test]
    fn test_reparse_yields_equal_tree() {
        let first = parse_layer(SAMPLE);
        let text = write_layer(&first);
        let second = parse_layer(&text);
        assert_eq!(first, second);
        // Writing twice is stable
        assert_eq!(text, write_layer(&second));
    }

    #[test]
    fn test_written_header_and_specifiers() {
        let layer = parse_layer(SAMPLE);
        let text = write_layer(&layer);
        assert!(text.starts_with("#usda 1.0\n(\n    defaultPrim = \"Root\"\n"));
        assert!(text.contains("over \"Tweak\""));
        assert_eq!(layer.roots[0].children[1].specifier, Specifier::Over);
        assert_eq!(layer.metadata.auto_play, Some(false));
    }

    #[test]
    fn test_empty_layer() {
        assert_eq!(write_layer(&ParsedLayer::default()), "#usda 1.0\n");
    }
}
