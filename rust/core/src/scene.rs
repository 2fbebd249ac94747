// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene graph model produced by the parser
//!
//! A [`SceneNode`] is one prim of the layer. Its identity is its root-anchored
//! path (`/Root/Child`), which is always the concatenation of its ancestors'
//! names. Trees are rebuilt wholesale on every parse.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::metadata::MetadataEntry;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Prim specifier keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Specifier {
    /// `def` - a concrete prim
    Def,
    /// `over` - an override of a prim defined elsewhere
    Over,
    /// `class` - an abstract prim for inheritance
    Class,
}

impl Specifier {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "def" => Some(Specifier::Def),
            "over" => Some(Specifier::Over),
            "class" => Some(Specifier::Class),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Specifier::Def => "def",
            Specifier::Over => "over",
            Specifier::Class => "class",
        }
    }

    /// Only `def` denotes a concrete instance.
    #[inline]
    pub fn is_concrete(self) -> bool {
        self == Specifier::Def
    }
}

/// An authored attribute or relationship as written in the layer.
///
/// The literal is kept raw; typing is applied by whoever reads it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AuthoredAttribute {
    pub name: String,
    /// Declared type including qualifiers, e.g. `uniform token` or `rel`
    pub type_name: String,
    /// Raw literal text; empty for declarations without a value
    pub literal: String,
    /// Contents of a trailing `( ... )` metadata block
    pub metadata: Option<String>,
}

impl AuthoredAttribute {
    pub fn new(
        type_name: impl Into<String>,
        name: impl Into<String>,
        literal: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            literal: literal.into(),
            metadata: None,
        }
    }

    /// Relationships are declared with the `rel` keyword.
    pub fn is_relationship(&self) -> bool {
        self.type_name.split_whitespace().any(|t| t == "rel")
    }

    /// Whether a value was authored (as opposed to a bare declaration).
    pub fn has_value(&self) -> bool {
        !self.literal.is_empty()
    }
}

/// Find an attribute by name in an attribute list.
pub fn find_attribute<'a>(
    attributes: &'a [AuthoredAttribute],
    name: &str,
) -> Option<&'a AuthoredAttribute> {
    attributes.iter().find(|a| a.name == name)
}

/// A composition reference `@asset@</prim>`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceSpec {
    pub asset_path: String,
    pub prim_path: Option<String>,
}

/// One option of a variant set, with the content it contributes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariantOption {
    pub name: String,
    pub attributes: Vec<AuthoredAttribute>,
    pub children: Vec<SceneNode>,
}

impl VariantOption {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }
}

/// A `variantSet "name" = { ... }` block.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VariantSetSpec {
    pub name: String,
    pub options: Vec<VariantOption>,
}

/// Prim-level metadata from the `( ... )` block after the prim declaration.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimMetadata {
    pub active: Option<bool>,
    pub kind: Option<String>,
    /// List-op keyword used for references (`prepend`, `append`, ...)
    pub references_op: Option<String>,
    pub references: Vec<ReferenceSpec>,
    /// Authored `variants = { ... }` selections, in order
    pub variant_selections: Vec<(String, String)>,
    /// Entries the editor does not interpret, preserved for writing
    pub extra: Vec<MetadataEntry>,
}

impl PrimMetadata {
    pub fn variant_selection(&self, set_name: &str) -> Option<&str> {
        self.variant_selections
            .iter()
            .find(|(set, _)| set == set_name)
            .map(|(_, option)| option.as_str())
    }

    pub fn set_variant_selection(&mut self, set_name: &str, option: Option<&str>) {
        self.variant_selections.retain(|(set, _)| set != set_name);
        if let Some(option) = option {
            self.variant_selections
                .push((set_name.to_string(), option.to_string()));
        }
    }
}

/// One prim in the layer hierarchy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SceneNode {
    pub path: String,
    pub name: String,
    pub type_name: Option<String>,
    pub specifier: Specifier,
    pub metadata: PrimMetadata,
    pub attributes: Vec<AuthoredAttribute>,
    pub variant_sets: Vec<VariantSetSpec>,
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    /// Create a node whose path is synthesized from its parent's path.
    pub fn new(
        parent_path: Option<&str>,
        specifier: Specifier,
        type_name: Option<String>,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            path: join_path(parent_path, &name),
            name,
            type_name,
            specifier,
            metadata: PrimMetadata::default(),
            attributes: Vec::new(),
            variant_sets: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&AuthoredAttribute> {
        find_attribute(&self.attributes, name)
    }

    pub fn type_name_or_empty(&self) -> &str {
        self.type_name.as_deref().unwrap_or("")
    }

    pub fn is_active(&self) -> bool {
        self.metadata.active != Some(false)
    }

    pub fn variant_set(&self, name: &str) -> Option<&VariantSetSpec> {
        self.variant_sets.iter().find(|s| s.name == name)
    }

    /// Find a node by path in this subtree, including prims authored inside
    /// variant option bodies.
    pub fn find(&self, path: &str) -> Option<&SceneNode> {
        if self.path == path {
            return Some(self);
        }
        if !is_descendant_path(path, &self.path) {
            return None;
        }
        self.children
            .iter()
            .chain(
                self.variant_sets
                    .iter()
                    .flat_map(|s| s.options.iter())
                    .flat_map(|o| o.children.iter()),
            )
            .find_map(|child| child.find(path))
    }

    /// Mutable variant of [`SceneNode::find`].
    pub fn find_mut(&mut self, path: &str) -> Option<&mut SceneNode> {
        if self.path == path {
            return Some(self);
        }
        if !is_descendant_path(path, &self.path) {
            return None;
        }
        let variant_children = self
            .variant_sets
            .iter_mut()
            .flat_map(|s| s.options.iter_mut())
            .flat_map(|o| o.children.iter_mut());
        self.children
            .iter_mut()
            .chain(variant_children)
            .find_map(|child| child.find_mut(path))
    }

    /// Re-synthesize this subtree's paths under a new parent path.
    pub fn rebase(&mut self, parent_path: Option<&str>) {
        self.path = join_path(parent_path, &self.name);
        let path = self.path.clone();
        for child in &mut self.children {
            child.rebase(Some(&path));
        }
        for option in self.variant_sets.iter_mut().flat_map(|s| s.options.iter_mut()) {
            for child in &mut option.children {
                child.rebase(Some(&path));
            }
        }
    }

    /// Build the composed view of this subtree: direct children followed by
    /// the children of each selected variant option.
    ///
    /// `selection` resolves the active option for a `(prim path, set name)`
    /// pair; authored variant bodies are dropped from the composed nodes.
    pub fn composed<F>(&self, selection: &F) -> SceneNode
    where
        F: Fn(&SceneNode, &str) -> Option<String>,
    {
        let mut children: Vec<SceneNode> =
            self.children.iter().map(|c| c.composed(selection)).collect();

        for set in &self.variant_sets {
            let Some(selected) = selection(self, &set.name) else {
                continue;
            };
            if let Some(option) = set.options.iter().find(|o| o.name == selected) {
                for child in &option.children {
                    if !children.iter().any(|c| c.name == child.name) {
                        children.push(child.composed(selection));
                    }
                }
            }
        }

        SceneNode {
            path: self.path.clone(),
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            specifier: self.specifier,
            metadata: self.metadata.clone(),
            attributes: self.attributes.clone(),
            variant_sets: self
                .variant_sets
                .iter()
                .map(|s| VariantSetSpec {
                    name: s.name.clone(),
                    options: s.options.iter().map(|o| VariantOption::new(o.name.clone())).collect(),
                })
                .collect(),
            children,
        }
    }

    /// Depth-first, pre-order iterator over this node and its children.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: vec![self] }
    }
}

/// Pre-order traversal over a forest of nodes.
pub struct Walk<'a> {
    stack: Vec<&'a SceneNode>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a SceneNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Walk every node of a forest in document order.
pub fn walk_nodes(roots: &[SceneNode]) -> Walk<'_> {
    Walk {
        stack: roots.iter().rev().collect(),
    }
}

/// Find a node anywhere in a forest.
pub fn find_node<'a>(roots: &'a [SceneNode], path: &str) -> Option<&'a SceneNode> {
    roots.iter().find_map(|root| root.find(path))
}

/// Mutable variant of [`find_node`].
pub fn find_node_mut<'a>(roots: &'a mut [SceneNode], path: &str) -> Option<&'a mut SceneNode> {
    roots.iter_mut().find_map(|root| root.find_mut(path))
}

/// Path → node lookup table over a forest.
pub fn index_paths(roots: &[SceneNode]) -> FxHashMap<&str, &SceneNode> {
    walk_nodes(roots).map(|node| (node.path.as_str(), node)).collect()
}

/// Join a parent path and a child name into a root-anchored path.
pub fn join_path(parent_path: Option<&str>, name: &str) -> String {
    match parent_path {
        Some(parent) if parent != "/" && !parent.is_empty() => format!("{}/{}", parent, name),
        _ => format!("/{}", name),
    }
}

/// Parent of a prim path, `None` for root prims.
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    let idx = trimmed.rfind('/')?;
    if idx == 0 {
        None
    } else {
        Some(&trimmed[..idx])
    }
}

/// Last component of a prim path.
pub fn last_component(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant_path(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes()[ancestor.len()] == b'/'
}

/// Whether a name is a valid prim identifier.
pub fn is_valid_prim_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Validate a root-anchored prim path such as `/Root/Child`.
pub fn validate_prim_path(path: &str) -> Result<()> {
    let Some(body) = path.strip_prefix('/') else {
        return Err(Error::InvalidPath(path.to_string()));
    };
    if body.is_empty() || !body.split('/').all(is_valid_prim_name) {
        return Err(Error::InvalidPath(path.to_string()));
    }
    Ok(())
}
