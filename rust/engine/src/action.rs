// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inspector actions
//!
//! Requests come from the user; completions come back from spawned tasks
//! and carry the generation that issued them.

use std::path::PathBuf;

use usda_lite_core::SceneNode;
use usda_lite_processing::{
    ComponentReload, DocumentMetadata, DocumentRef, MaterialRecord, ParameterValue, PrimAttributes,
    PrimTransform, ReferenceRecord, VariantSetRecord,
};

use crate::state::{BindingState, LoadSection, LoadedComponent};

/// Metadata and composed tree of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSnapshot {
    pub metadata: DocumentMetadata,
    pub tree: Vec<SceneNode>,
}

/// Payload of one finished section load.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionData {
    Attributes {
        attributes: PrimAttributes,
        components: Vec<LoadedComponent>,
    },
    Transform(Option<PrimTransform>),
    Variants {
        scope: String,
        sets: Vec<VariantSetRecord>,
    },
    References(Vec<ReferenceRecord>),
    MaterialBinding(BindingState),
    Materials(Vec<MaterialRecord>),
}

impl SectionData {
    pub fn section(&self) -> LoadSection {
        match self {
            SectionData::Attributes { .. } => LoadSection::Attributes,
            SectionData::Transform(_) => LoadSection::Transform,
            SectionData::Variants { .. } => LoadSection::Variants,
            SectionData::References(_) => LoadSection::References,
            SectionData::MaterialBinding(_) => LoadSection::MaterialBinding,
            SectionData::Materials(_) => LoadSection::Materials,
        }
    }
}

/// What a finished write invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Layer metadata
    Layer,
    Transform,
    /// Variant selection; changes composed content
    Variant,
    References,
    MaterialBinding,
    /// Component prims or their resources
    Components,
}

/// One write through the document boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    DefaultPrim(String),
    MetersPerUnit(f64),
    UpAxis(String),
    Transform {
        path: String,
        transform: PrimTransform,
    },
    Variant {
        scope: String,
        set_name: String,
        selection: Option<String>,
        persist: bool,
    },
    AddReference {
        path: String,
        source: PathBuf,
        prim_path: Option<String>,
    },
    RemoveReference {
        path: String,
        reference: ReferenceRecord,
    },
    SetMaterialBinding {
        path: String,
        material_path: String,
    },
    ClearMaterialBinding {
        path: String,
    },
    ComponentActive {
        path: String,
        active: bool,
    },
    AddComponent {
        owner: String,
        identifier: String,
    },
    RemoveComponent {
        path: String,
    },
    ImportAudio {
        component_path: String,
        source: PathBuf,
    },
}

impl WriteOp {
    pub fn kind(&self) -> WriteKind {
        match self {
            WriteOp::DefaultPrim(_) | WriteOp::MetersPerUnit(_) | WriteOp::UpAxis(_) => {
                WriteKind::Layer
            }
            WriteOp::Transform { .. } => WriteKind::Transform,
            WriteOp::Variant { .. } => WriteKind::Variant,
            WriteOp::AddReference { .. } | WriteOp::RemoveReference { .. } => WriteKind::References,
            WriteOp::SetMaterialBinding { .. } | WriteOp::ClearMaterialBinding { .. } => {
                WriteKind::MaterialBinding
            }
            WriteOp::ComponentActive { .. }
            | WriteOp::AddComponent { .. }
            | WriteOp::RemoveComponent { .. }
            | WriteOp::ImportAudio { .. } => WriteKind::Components,
        }
    }

    /// Prim path the write is aimed at; `/` for layer metadata.
    pub fn target(&self) -> &str {
        match self {
            WriteOp::DefaultPrim(_) | WriteOp::MetersPerUnit(_) | WriteOp::UpAxis(_) => "/",
            WriteOp::Transform { path, .. }
            | WriteOp::AddReference { path, .. }
            | WriteOp::RemoveReference { path, .. }
            | WriteOp::SetMaterialBinding { path, .. }
            | WriteOp::ClearMaterialBinding { path }
            | WriteOp::ComponentActive { path, .. }
            | WriteOp::RemoveComponent { path } => path,
            WriteOp::Variant { scope, .. } => scope,
            WriteOp::AddComponent { owner, .. } => owner,
            WriteOp::ImportAudio { component_path, .. } => component_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ---- layer ----
    OpenDocument(DocumentRef),
    CloseDocument,
    /// Re-read the open document from its source
    ReloadTree,
    SetDefaultPrim(String),
    SetMetersPerUnit(f64),
    SetUpAxis(String),

    // ---- selection ----
    SelectPrim(Option<String>),

    // ---- prim writes ----
    SetTransform(PrimTransform),
    ApplyVariant {
        set_name: String,
        selection: Option<String>,
    },
    /// Import `source` next to the document and reference it
    AddReference {
        source: PathBuf,
        prim_path: Option<String>,
    },
    RemoveReference(ReferenceRecord),
    SetMaterialBinding(String),
    ClearMaterialBinding,
    SetComponentParameter {
        component_path: String,
        identifier: String,
        parameter: String,
        value: ParameterValue,
    },
    SetComponentActive {
        component_path: String,
        active: bool,
    },
    /// Add a component with this identifier to the selected prim
    AddComponent(String),
    RemoveComponent(String),
    ImportAudioResource {
        component_path: String,
        source: PathBuf,
    },
    ScanGroupMembers(String),

    // ---- playback ----
    TogglePlayback,
    SetPlaybackSpeed(f64),
    BeginScrub,
    Scrub(f64),
    EndScrub,
    Tick {
        generation: u64,
    },

    // ---- completions ----
    LayerLoaded {
        generation: u64,
        result: Result<LayerSnapshot, String>,
    },
    SectionLoaded {
        generation: u64,
        section: LoadSection,
        result: Result<SectionData, String>,
    },
    MutationCompleted {
        generation: u64,
        component_path: String,
        revision: u64,
        result: Result<ComponentReload, String>,
    },
    WriteCompleted {
        layer_generation: u64,
        selection_generation: u64,
        kind: WriteKind,
        target: String,
        result: Result<(), String>,
    },
    GroupMembersLoaded {
        generation: u64,
        group_path: String,
        result: Result<Vec<String>, String>,
    },
}

impl Action {
    /// Completions are produced by tasks, everything else by callers.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            Action::Tick { .. }
                | Action::LayerLoaded { .. }
                | Action::SectionLoaded { .. }
                | Action::MutationCompleted { .. }
                | Action::WriteCompleted { .. }
                | Action::GroupMembersLoaded { .. }
        )
    }
}
