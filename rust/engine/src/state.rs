// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inspector state
//!
//! Everything the inspector shows lives in [`InspectorState`]. Only the
//! reducer mutates it; observers take clones or JSON snapshots.

use std::collections::{BTreeMap, BTreeSet};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use usda_lite_core::{AuthoredAttribute, SceneNode};
use usda_lite_processing::{
    ComponentDescendantAttributes, ComponentInfo, ComponentReload, DocumentMetadata, DocumentRef,
    MaterialRecord, PrimAttributes, PrimTransform, ReferenceRecord, VariantSetRecord,
};

use crate::playback::PlaybackState;

/// Independently loaded parts of the selected prim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadSection {
    /// General data plus the components under the prim
    Attributes,
    Transform,
    Variants,
    References,
    MaterialBinding,
    Materials,
}

impl LoadSection {
    pub const ALL: [LoadSection; 6] = [
        LoadSection::Attributes,
        LoadSection::Transform,
        LoadSection::Variants,
        LoadSection::References,
        LoadSection::MaterialBinding,
        LoadSection::Materials,
    ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerStatus {
    /// No document open
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Document-wide state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayerState {
    pub status: LayerStatus,
    pub metadata: Option<DocumentMetadata>,
    pub tree: Vec<SceneNode>,
    pub error: Option<String>,
}

impl LayerState {
    pub fn is_loading(&self) -> bool {
        self.status == LayerStatus::Loading
    }
}

/// A component under the selected prim with its authored state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedComponent {
    pub info: ComponentInfo,
    pub reload: ComponentReload,
}

/// Where the selected prim's material binding lives and what it points at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingState {
    /// The prim the binding is read from and written to
    pub prim_path: String,
    pub material: Option<String>,
    pub strength: Option<String>,
}

/// Everything scoped to the selected prim.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectionState {
    pub path: Option<String>,
    pub pending: BTreeSet<LoadSection>,
    pub attributes: Option<PrimAttributes>,
    pub transform: Option<PrimTransform>,
    /// The prim whose variant sets are shown for this selection
    pub variant_scope: Option<String>,
    pub variant_sets: Vec<VariantSetRecord>,
    pub references: Vec<ReferenceRecord>,
    pub binding: Option<BindingState>,
    pub materials: Vec<MaterialRecord>,
    pub components: Vec<ComponentInfo>,
    pub component_active: FxHashMap<String, bool>,
    pub component_attributes: FxHashMap<String, Vec<AuthoredAttribute>>,
    pub component_descendants: FxHashMap<String, Vec<ComponentDescendantAttributes>>,
    pub section_errors: BTreeMap<LoadSection, String>,
    /// Failed writes keyed by the path they targeted
    pub write_errors: BTreeMap<String, String>,
}

impl SelectionState {
    pub fn for_path(path: Option<String>) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// True exactly while a section load is outstanding.
    pub fn is_loading(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn store_component(&mut self, path: &str, reload: ComponentReload) {
        self.component_active.insert(path.to_string(), reload.active);
        self.component_attributes
            .insert(path.to_string(), reload.attributes);
        self.component_descendants
            .insert(path.to_string(), reload.descendants);
    }

    /// The cached authored state of one component.
    pub fn component(&self, path: &str) -> Option<ComponentReload> {
        Some(ComponentReload {
            attributes: self.component_attributes.get(path)?.clone(),
            descendants: self
                .component_descendants
                .get(path)
                .cloned()
                .unwrap_or_default(),
            active: self.component_active.get(path).copied().unwrap_or(true),
        })
    }

    pub fn has_component(&self, path: &str) -> bool {
        self.components.iter().any(|c| c.path == path)
    }
}

/// Mesh-sorting group members from the last scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembers {
    pub group_path: String,
    pub members: Vec<String>,
}

/// The whole session for one inspector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InspectorState {
    pub document: Option<DocumentRef>,
    pub layer: LayerState,
    /// Bumped whenever the open document changes
    pub layer_generation: u64,
    pub selection: SelectionState,
    /// Bumped whenever the selection is (re)loaded
    pub selection_generation: u64,
    /// Mutation revision per component path. Never reset.
    pub revisions: FxHashMap<String, u64>,
    pub group_members: Option<GroupMembers>,
    pub group_error: Option<String>,
    pub playback: PlaybackState,
}

impl InspectorState {
    pub fn is_loading(&self) -> bool {
        self.layer.is_loading() || self.selection.is_loading()
    }

    pub fn revision(&self, component_path: &str) -> u64 {
        self.revisions.get(component_path).copied().unwrap_or(0)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
