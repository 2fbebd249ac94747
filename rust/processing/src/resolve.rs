// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cross-reference resolution over the prim tree
//!
//! Three independent walks: which prim owns the variant sets to edit, which
//! prim a material binding is authored on, and which prims sort into a
//! mesh-sorting group.

use std::collections::BTreeSet;

use rayon::prelude::*;
use usda_lite_core::{
    index_paths, last_component, parent_path, parse_relationship_target, parse_token,
    walk_nodes, SceneNode,
};

use crate::interop::VariantSetRecord;

/// Prim type of component prims.
pub const COMPONENT_TYPE: &str = "RealityKitComponent";

/// Identifier of the mesh-sorting component.
pub const MESH_SORTING_ID: &str = "RealityKit.MeshSorting";

/// Find the prim whose variant sets should be edited for `selected_path`.
///
/// A prim with its own sets is its own scope. A prim named after an option
/// of one of its parent's sets is a variant option; the walk continues from
/// the parent. Anything else stops where it is.
pub fn resolve_variant_scope<F>(selected_path: &str, variant_sets_of: F) -> String
where
    F: Fn(&str) -> Vec<VariantSetRecord>,
{
    let mut current = selected_path.to_string();
    loop {
        if variant_sets_of(&current).iter().any(|s| !s.options.is_empty()) {
            return current;
        }
        let Some(parent) = parent_path(&current) else {
            return current;
        };
        let option_name = last_component(&current);
        let parent_sets = variant_sets_of(parent);
        if parent_sets.iter().any(|s| s.has_option(option_name)) {
            current = parent.to_string();
        } else {
            return current;
        }
    }
}

/// Type names containing "material" or "shader" (any case).
pub fn is_material_like(type_name: &str) -> bool {
    let lower = type_name.to_ascii_lowercase();
    lower.contains("material") || lower.contains("shader")
}

/// Find the prim a material binding for `selected_path` is authored on.
///
/// Materials and shaders are not bound themselves; the binding lives on the
/// nearest ancestor that is neither. When no such ancestor exists the
/// selection is returned unchanged.
pub fn resolve_material_binding_prim(roots: &[SceneNode], selected_path: &str) -> String {
    let index = index_paths(roots);
    let type_of = |path: &str| index.get(path).map(|n| n.type_name_or_empty()).unwrap_or("");

    if !is_material_like(type_of(selected_path)) {
        return selected_path.to_string();
    }

    let mut current = parent_path(selected_path);
    while let Some(path) = current {
        if !is_material_like(type_of(path)) {
            return path.to_string();
        }
        current = parent_path(path);
    }
    selected_path.to_string()
}

/// Component identifier of a component prim, from its `info:id` token.
pub fn component_identifier(node: &SceneNode) -> Option<String> {
    node.attribute("info:id").and_then(|a| parse_token(&a.literal))
}

/// Whether `node` is a mesh-sorting component, by identifier or name.
fn is_mesh_sorting(node: &SceneNode) -> bool {
    if node.type_name_or_empty() != COMPONENT_TYPE {
        return false;
    }
    match component_identifier(node) {
        Some(id) => id == MESH_SORTING_ID,
        None => node.name == "MeshSorting",
    }
}

/// Paths of every prim owning a mesh-sorting component whose `group`
/// relationship targets `group_path`. Sorted and deduplicated.
///
/// `read_attribute(path, name)` returns the authored literal; the scan asks
/// it for each candidate component's `group`.
pub fn scan_group_members<F>(
    roots: &[SceneNode],
    group_path: &str,
    read_attribute: F,
) -> Vec<String>
where
    F: Fn(&str, &str) -> Option<String> + Sync,
{
    let owners: Vec<&SceneNode> = walk_nodes(roots).collect();

    let members: BTreeSet<String> = owners
        .par_iter()
        .filter(|owner| {
            owner
                .children
                .iter()
                .filter(|child| is_mesh_sorting(child))
                .any(|component| {
                    read_attribute(&component.path, "group")
                        .and_then(|literal| parse_relationship_target(&literal))
                        .is_some_and(|target| target == group_path)
                })
        })
        .map(|owner| owner.path.clone())
        .collect::<Vec<_>>()
        .into_iter()
        .collect();

    tracing::debug!(group = %group_path, count = members.len(), "Scanned group members");
    members.into_iter().collect()
}

/// Attribute reader over the authored literals of an in-memory tree.
pub fn tree_attribute_reader(
    roots: &[SceneNode],
) -> impl Fn(&str, &str) -> Option<String> + Sync + '_ {
    let index = index_paths(roots);
    move |path: &str, name: &str| {
        index
            .get(path)
            .and_then(|node| node.attribute(name))
            .map(|a| a.literal.clone())
    }
}
