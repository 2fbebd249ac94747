// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory stage over a parsed layer
//!
//! A [`Stage`] answers every read of the document boundary and applies every
//! write by editing the parsed tree in place; [`Stage::to_text`] renders the
//! result. Variant selections made without `persist` are held as session
//! overrides and never written.

use rustc_hash::FxHashMap;
use usda_lite_core::{
    find_attribute, format_relationship, format_string_array, format_vec3,
    parse_layer, parse_matrix4, parse_metadata_block, parse_relationship_target, parse_token,
    parse_vec3, validate_prim_name, validate_prim_path, walk_nodes, write_layer, AuthoredAttribute,
    MetadataEntry, ParsedLayer, ReferenceSpec, SceneNode, Specifier,
};
use usda_lite_geometry::{decompose_anchoring_matrix, tidy, Vector3};

use crate::error::{Error, Result};
use crate::interop::{
    AnimationTrack, AnimationTrackKind, DocumentMetadata, MaterialRecord, PrimAttributes,
    PrimTransform, ReferenceRecord, VariantOptionRecord, VariantSetRecord,
};

const TRANSLATE_OP: &str = "xformOp:translate";
const ROTATE_OP: &str = "xformOp:rotateXYZ";
const SCALE_OP: &str = "xformOp:scale";
const MATRIX_OP: &str = "xformOp:transform";
const OP_ORDER: &str = "xformOpOrder";
const BINDING: &str = "material:binding";
const TIME_SAMPLES_SUFFIX: &str = ".timeSamples";

/// `(scope path, set name)` to a session-only selection (`None` clears).
type SessionSelections = FxHashMap<(String, String), Option<String>>;

/// One hop from a node to a child: direct, or inside a variant option body.
#[derive(Debug, Clone, Copy)]
enum Step {
    Child(usize),
    Variant { set: usize, option: usize, child: usize },
}

fn step(node: &SceneNode, hop: Step) -> Option<&SceneNode> {
    match hop {
        Step::Child(i) => node.children.get(i),
        Step::Variant { set, option, child } => node
            .variant_sets
            .get(set)?
            .options
            .get(option)?
            .children
            .get(child),
    }
}

fn step_mut(node: &mut SceneNode, hop: Step) -> Option<&mut SceneNode> {
    match hop {
        Step::Child(i) => node.children.get_mut(i),
        Step::Variant { set, option, child } => node
            .variant_sets
            .get_mut(set)?
            .options
            .get_mut(option)?
            .children
            .get_mut(child),
    }
}

/// Effective selection of `set_name` on `node`: session override first.
fn selection_for(sessions: &SessionSelections, node: &SceneNode, set_name: &str) -> Option<String> {
    match sessions.get(&(node.path.clone(), set_name.to_string())) {
        Some(selection) => selection.clone(),
        None => node.metadata.variant_selection(set_name).map(str::to_string),
    }
}

/// Hop to child `name`: direct children win, then the selected option of
/// any set, then the first option that defines it.
fn hop_to(sessions: &SessionSelections, node: &SceneNode, name: &str) -> Option<Step> {
    if let Some(i) = node.children.iter().position(|c| c.name == name) {
        return Some(Step::Child(i));
    }
    let mut fallback = None;
    for (set_idx, set) in node.variant_sets.iter().enumerate() {
        let selected = selection_for(sessions, node, &set.name);
        for (option_idx, option) in set.options.iter().enumerate() {
            let Some(child) = option.children.iter().position(|c| c.name == name) else {
                continue;
            };
            let hop = Step::Variant {
                set: set_idx,
                option: option_idx,
                child,
            };
            if selected.as_deref() == Some(option.name.as_str()) {
                return Some(hop);
            }
            fallback.get_or_insert(hop);
        }
    }
    fallback
}

/// Insert or replace an attribute, keeping any authored metadata.
fn upsert_attribute(node: &mut SceneNode, type_name: &str, name: &str, literal: &str) {
    match node.attributes.iter_mut().find(|a| a.name == name) {
        Some(existing) => {
            existing.type_name = type_name.to_string();
            existing.literal = literal.to_string();
        }
        None => node
            .attributes
            .push(AuthoredAttribute::new(type_name, name, literal)),
    }
}

fn remove_attribute(node: &mut SceneNode, name: &str) -> bool {
    let before = node.attributes.len();
    node.attributes.retain(|a| a.name != name);
    node.attributes.len() != before
}

fn not_found(path: &str) -> Error {
    Error::NotFound(path.to_string())
}

/// A parsed document plus session state.
#[derive(Debug, Clone, Default)]
pub struct Stage {
    layer: ParsedLayer,
    sessions: SessionSelections,
}

impl Stage {
    pub fn parse(text: &str) -> Self {
        Self::from_layer(parse_layer(text))
    }

    pub fn from_layer(layer: ParsedLayer) -> Self {
        Self {
            layer,
            sessions: SessionSelections::default(),
        }
    }

    pub fn layer(&self) -> &ParsedLayer {
        &self.layer
    }

    /// Render the authored layer; session selections are not written.
    pub fn to_text(&self) -> String {
        write_layer(&self.layer)
    }

    /// Forest with each node's selected variant content folded in.
    pub fn composed_roots(&self) -> Vec<SceneNode> {
        let selection = |node: &SceneNode, set: &str| selection_for(&self.sessions, node, set);
        self.layer
            .roots
            .iter()
            .map(|root| root.composed(&selection))
            .collect()
    }

    fn route(&self, path: &str) -> Option<(usize, Vec<Step>)> {
        let mut names = path.strip_prefix('/')?.split('/');
        let first = names.next()?;
        let root = self.layer.roots.iter().position(|r| r.name == first)?;

        let mut node = &self.layer.roots[root];
        let mut hops = Vec::new();
        for name in names {
            let hop = hop_to(&self.sessions, node, name)?;
            node = step(node, hop)?;
            hops.push(hop);
        }
        Some((root, hops))
    }

    /// Authored node at `path`, looking inside variant bodies.
    pub fn node(&self, path: &str) -> Option<&SceneNode> {
        let (root, hops) = self.route(path)?;
        hops.into_iter()
            .try_fold(self.layer.roots.get(root)?, |node, hop| step(node, hop))
    }

    fn node_mut(&mut self, path: &str) -> Result<&mut SceneNode> {
        let (root, hops) = self.route(path).ok_or_else(|| not_found(path))?;
        let mut node = self.layer.roots.get_mut(root).ok_or_else(|| not_found(path))?;
        for hop in hops {
            node = step_mut(node, hop).ok_or_else(|| not_found(path))?;
        }
        Ok(node)
    }

    /// Authored literal of `name` on the prim at `path`.
    pub fn attribute_literal(&self, path: &str, name: &str) -> Option<&str> {
        let node = self.node(path)?;
        find_attribute(&node.attributes, name).map(|a| a.literal.as_str())
    }

    fn require(&self, path: &str) -> Result<&SceneNode> {
        self.node(path).ok_or_else(|| not_found(path))
    }

    // ---- reads ----

    pub fn metadata(&self) -> DocumentMetadata {
        let header = &self.layer.metadata;
        DocumentMetadata {
            default_prim: header.default_prim.clone(),
            meters_per_unit: header.meters_per_unit,
            up_axis: header.up_axis.clone(),
            start_time: header.start_time,
            end_time: header.end_time,
            fps: header.fps,
            auto_play: header.auto_play,
            playback_mode: header.playback_mode.clone(),
            animation_tracks: self.animation_tracks(),
        }
    }

    fn animation_tracks(&self) -> Vec<AnimationTrack> {
        let roots = self.composed_roots();
        let mut tracks = Vec::new();
        for node in walk_nodes(&roots) {
            if node.type_name_or_empty() == "SkelAnimation" {
                tracks.push(AnimationTrack {
                    prim_path: node.path.clone(),
                    name: node.name.clone(),
                    kind: AnimationTrackKind::Skeletal,
                });
            }
            for attribute in &node.attributes {
                if let Some(name) = attribute.name.strip_suffix(TIME_SAMPLES_SUFFIX) {
                    tracks.push(AnimationTrack {
                        prim_path: node.path.clone(),
                        name: name.to_string(),
                        kind: AnimationTrackKind::TimeSamples,
                    });
                }
            }
        }
        tracks
    }

    pub fn prim_attributes(&self, path: &str) -> Option<PrimAttributes> {
        let node = self.node(path)?;
        let token = |name: &str| node.attribute(name).and_then(|a| parse_token(&a.literal));
        Some(PrimAttributes {
            type_name: node.type_name_or_empty().to_string(),
            is_active: node.is_active(),
            visibility: token("visibility"),
            purpose: token("purpose"),
            kind: node.metadata.kind.clone(),
            authored_attributes: node.attributes.clone(),
        })
    }

    /// Local transform from a matrix op when authored, else the TRS ops.
    pub fn prim_transform(&self, path: &str) -> Option<PrimTransform> {
        let node = self.node(path)?;
        let matrix = node
            .attribute(MATRIX_OP)
            .and_then(|a| parse_matrix4(&a.literal))
            .and_then(|rows| decompose_anchoring_matrix(&rows).ok());
        if let Some(components) = matrix {
            let array = |v: Vector3<f64>| [tidy(v.x), tidy(v.y), tidy(v.z)];
            return Some(PrimTransform {
                position: array(components.position),
                rotation_degrees: array(components.orientation_degrees),
                scale: array(components.scale),
            });
        }

        let vec3 = |name: &str| node.attribute(name).and_then(|a| parse_vec3(&a.literal));
        let defaults = PrimTransform::default();
        Some(PrimTransform {
            position: vec3(TRANSLATE_OP).unwrap_or(defaults.position),
            rotation_degrees: vec3(ROTATE_OP).unwrap_or(defaults.rotation_degrees),
            scale: vec3(SCALE_OP).unwrap_or(defaults.scale),
        })
    }

    /// Variant sets on `scope_path`, including sets declared without a body.
    pub fn variant_sets(&self, scope_path: &str) -> Result<Vec<VariantSetRecord>> {
        let node = self.require(scope_path)?;
        let mut records: Vec<VariantSetRecord> = node
            .variant_sets
            .iter()
            .map(|set| VariantSetRecord {
                name: set.name.clone(),
                options: set
                    .options
                    .iter()
                    .map(|o| VariantOptionRecord {
                        id: o.name.clone(),
                        display_name: o.name.clone(),
                    })
                    .collect(),
                selected_option_id: selection_for(&self.sessions, node, &set.name),
            })
            .collect();

        for declared in node.metadata.declared_variant_sets() {
            if !records.iter().any(|r| r.name == declared) {
                let selected_option_id = selection_for(&self.sessions, node, &declared);
                records.push(VariantSetRecord {
                    name: declared,
                    options: Vec::new(),
                    selected_option_id,
                });
            }
        }
        Ok(records)
    }

    pub fn references(&self, path: &str) -> Result<Vec<ReferenceRecord>> {
        Ok(self
            .require(path)?
            .metadata
            .references
            .iter()
            .map(|r| ReferenceRecord {
                asset_path: r.asset_path.clone(),
                prim_path: r.prim_path.clone(),
            })
            .collect())
    }

    pub fn materials(&self) -> Vec<MaterialRecord> {
        let roots = self.composed_roots();
        walk_nodes(&roots)
            .filter(|node| node.type_name_or_empty() == "Material")
            .map(|node| MaterialRecord {
                path: node.path.clone(),
                name: node.name.clone(),
            })
            .collect()
    }

    pub fn material_binding(&self, path: &str) -> Result<Option<String>> {
        Ok(self
            .require(path)?
            .attribute(BINDING)
            .and_then(|a| parse_relationship_target(&a.literal)))
    }

    /// `bindMaterialAs` from the binding's metadata block.
    pub fn material_binding_strength(&self, path: &str) -> Result<Option<String>> {
        let strength = self
            .require(path)?
            .attribute(BINDING)
            .and_then(|a| a.metadata.as_deref())
            .and_then(|meta| {
                parse_metadata_block(meta)
                    .into_iter()
                    .find(|e| e.name() == "bindMaterialAs")
            })
            .and_then(|e| parse_token(&e.value));
        Ok(strength)
    }

    // ---- writes ----

    pub fn set_default_prim(&mut self, prim_name: &str) -> Result<()> {
        let name = prim_name.trim_start_matches('/');
        validate_prim_name(name)?;
        self.layer.metadata.default_prim = Some(name.to_string());
        Ok(())
    }

    pub fn set_meters_per_unit(&mut self, meters_per_unit: f64) -> Result<()> {
        if !meters_per_unit.is_finite() || meters_per_unit <= 0.0 {
            return Err(Error::Backend(format!(
                "metersPerUnit must be positive, got {}",
                meters_per_unit
            )));
        }
        self.layer.metadata.meters_per_unit = Some(meters_per_unit);
        Ok(())
    }

    pub fn set_up_axis(&mut self, axis: &str) -> Result<()> {
        match axis {
            "Y" | "Z" => {
                self.layer.metadata.up_axis = Some(axis.to_string());
                Ok(())
            }
            other => Err(Error::Backend(format!("Unsupported up axis '{}'", other))),
        }
    }

    /// Author translate / rotateXYZ / scale ops, replacing a matrix op.
    pub fn set_prim_transform(&mut self, path: &str, transform: &PrimTransform) -> Result<()> {
        let node = self.node_mut(path)?;
        remove_attribute(node, MATRIX_OP);
        upsert_attribute(node, "double3", TRANSLATE_OP, &format_vec3(transform.position));
        upsert_attribute(node, "float3", ROTATE_OP, &format_vec3(transform.rotation_degrees));
        upsert_attribute(node, "float3", SCALE_OP, &format_vec3(transform.scale));
        let order = [TRANSLATE_OP, ROTATE_OP, SCALE_OP].map(str::to_string);
        upsert_attribute(node, "uniform token[]", OP_ORDER, &format_string_array(&order));
        Ok(())
    }

    pub fn apply_variant_selection(
        &mut self,
        scope_path: &str,
        set_name: &str,
        selection: Option<&str>,
        persist: bool,
    ) -> Result<()> {
        let node = self.require(scope_path)?;
        let known = match node.variant_set(set_name) {
            Some(set) => selection.map_or(true, |s| set.options.iter().any(|o| o.name == s)),
            None => node.metadata.declared_variant_sets().iter().any(|d| d == set_name),
        };
        if !known {
            return Err(not_found(&format!(
                "{}{{{}={}}}",
                scope_path,
                set_name,
                selection.unwrap_or("")
            )));
        }

        let key = (scope_path.to_string(), set_name.to_string());
        if persist {
            self.sessions.remove(&key);
            self.node_mut(scope_path)?
                .metadata
                .set_variant_selection(set_name, selection);
        } else {
            self.sessions.insert(key, selection.map(str::to_string));
        }
        tracing::debug!(
            scope = %scope_path,
            set = %set_name,
            ?selection,
            persist,
            "Applied variant selection"
        );
        Ok(())
    }

    pub fn add_reference(&mut self, path: &str, reference: &ReferenceRecord) -> Result<()> {
        let metadata = &mut self.node_mut(path)?.metadata;
        let spec = ReferenceSpec {
            asset_path: reference.asset_path.clone(),
            prim_path: reference.prim_path.clone(),
        };
        if !metadata.references.contains(&spec) {
            metadata.references.push(spec);
        }
        if metadata.references_op.is_none() {
            metadata.references_op = Some("prepend".to_string());
        }
        Ok(())
    }

    pub fn remove_reference(&mut self, path: &str, reference: &ReferenceRecord) -> Result<()> {
        let metadata = &mut self.node_mut(path)?.metadata;
        let before = metadata.references.len();
        metadata.references.retain(|r| {
            r.asset_path != reference.asset_path || r.prim_path != reference.prim_path
        });
        if metadata.references.len() == before {
            return Err(not_found(&reference.asset_path));
        }
        Ok(())
    }

    pub fn set_material_binding(&mut self, path: &str, material_path: &str) -> Result<()> {
        validate_prim_path(material_path)?;
        let node = self.node_mut(path)?;
        upsert_attribute(node, "rel", BINDING, &format_relationship(material_path));
        if !node.metadata.extra.iter().any(|e| e.name() == "apiSchemas") {
            node.metadata
                .extra
                .push(MetadataEntry::new("prepend apiSchemas", "[\"MaterialBindingAPI\"]"));
        }
        Ok(())
    }

    pub fn clear_material_binding(&mut self, path: &str) -> Result<()> {
        remove_attribute(self.node_mut(path)?, BINDING);
        Ok(())
    }

    pub fn set_component_attribute(
        &mut self,
        path: &str,
        type_tag: &str,
        name: &str,
        literal: &str,
    ) -> Result<()> {
        upsert_attribute(self.node_mut(path)?, type_tag, name, literal);
        Ok(())
    }

    pub fn delete_component_attribute(&mut self, path: &str, name: &str) -> Result<()> {
        remove_attribute(self.node_mut(path)?, name);
        Ok(())
    }

    pub fn ensure_struct_prim(
        &mut self,
        parent_path: &str,
        type_name: &str,
        name: &str,
    ) -> Result<String> {
        validate_prim_name(name)?;
        let parent = self.node_mut(parent_path)?;
        if let Some(existing) = parent.children.iter().find(|c| c.name == name) {
            return Ok(existing.path.clone());
        }
        let child = SceneNode::new(
            Some(parent_path),
            Specifier::Def,
            Some(type_name.to_string()),
            name,
        );
        let path = child.path.clone();
        parent.children.push(child);
        Ok(path)
    }

    pub fn delete_prim(&mut self, path: &str) -> Result<()> {
        let (root, hops) = self.route(path).ok_or_else(|| not_found(path))?;
        let Some((&last, ancestors)) = hops.split_last() else {
            self.layer.roots.remove(root);
            return Ok(());
        };

        let mut parent = self.layer.roots.get_mut(root).ok_or_else(|| not_found(path))?;
        for &hop in ancestors {
            parent = step_mut(parent, hop).ok_or_else(|| not_found(path))?;
        }
        match last {
            Step::Child(i) => {
                parent.children.remove(i);
            }
            Step::Variant { set, option, child } => {
                parent.variant_sets[set].options[option].children.remove(child);
            }
        }
        Ok(())
    }

    pub fn set_prim_active(&mut self, path: &str, active: bool) -> Result<()> {
        self.node_mut(path)?.metadata.active = Some(active);
        Ok(())
    }
}
