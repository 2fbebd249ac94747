// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Document boundary contracts
//!
//! The inspector never touches document text directly. It reads and writes
//! through [`DocumentReader`] / [`DocumentWriter`] and copies resources through
//! [`ResourceImporter`]. All methods are blocking; async callers run them on a
//! blocking pool.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use usda_lite_core::{AuthoredAttribute, SceneNode};

use crate::error::Result;

/// Identifies an open document: the scene file plus the root that imported
/// assets are copied under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub scene_file: PathBuf,
    pub asset_root: PathBuf,
}

impl DocumentRef {
    /// Use the scene file's directory as the asset root.
    pub fn new(scene_file: impl Into<PathBuf>) -> Self {
        let scene_file = scene_file.into();
        let asset_root = scene_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            scene_file,
            asset_root,
        }
    }

    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scene_file.display())
    }
}

/// How a timeline track is authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationTrackKind {
    /// A `SkelAnimation` prim
    Skeletal,
    /// An attribute with `.timeSamples`
    TimeSamples,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationTrack {
    pub prim_path: String,
    pub name: String,
    pub kind: AnimationTrackKind,
}

/// Layer-level metadata plus timeline bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub default_prim: Option<String>,
    pub meters_per_unit: Option<f64>,
    pub up_axis: Option<String>,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub fps: Option<f64>,
    pub auto_play: Option<bool>,
    pub playback_mode: Option<String>,
    pub animation_tracks: Vec<AnimationTrack>,
}

/// General data of one prim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimAttributes {
    pub type_name: String,
    pub is_active: bool,
    pub visibility: Option<String>,
    pub purpose: Option<String>,
    pub kind: Option<String>,
    pub authored_attributes: Vec<AuthoredAttribute>,
}

/// Decomposed local transform: position in scene units, XYZ Euler degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PrimTransform {
    pub position: [f64; 3],
    pub rotation_degrees: [f64; 3],
    pub scale: [f64; 3],
}

impl Default for PrimTransform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation_degrees: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOptionRecord {
    pub id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSetRecord {
    pub name: String,
    pub options: Vec<VariantOptionRecord>,
    pub selected_option_id: Option<String>,
}

impl VariantSetRecord {
    /// Whether any option is identified or labelled `name`.
    pub fn has_option(&self, name: &str) -> bool {
        self.options
            .iter()
            .any(|o| o.id == name || o.display_name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub asset_path: String,
    pub prim_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub path: String,
    pub name: String,
}

/// Where an imported resource landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedResource {
    pub destination: PathBuf,
    /// Path relative to the scene file, as authored in asset literals
    pub relative_path: String,
}

/// Read side of the document boundary.
pub trait DocumentReader: Send + Sync {
    /// Drop cached state so the next read sees the document as stored.
    fn refresh(&self, _doc: &DocumentRef) -> Result<()> {
        Ok(())
    }

    /// Composed prim forest (selected variant content included).
    fn load_tree(&self, doc: &DocumentRef) -> Result<Vec<SceneNode>>;

    fn metadata(&self, doc: &DocumentRef) -> Result<DocumentMetadata>;

    fn prim_attributes(&self, doc: &DocumentRef, path: &str) -> Result<Option<PrimAttributes>>;

    fn prim_transform(&self, doc: &DocumentRef, path: &str) -> Result<Option<PrimTransform>>;

    fn variant_sets(&self, doc: &DocumentRef, scope_path: &str) -> Result<Vec<VariantSetRecord>>;

    fn references(&self, doc: &DocumentRef, path: &str) -> Result<Vec<ReferenceRecord>>;

    fn materials(&self, doc: &DocumentRef) -> Result<Vec<MaterialRecord>>;

    fn material_binding(&self, doc: &DocumentRef, path: &str) -> Result<Option<String>>;

    fn material_binding_strength(&self, doc: &DocumentRef, path: &str) -> Result<Option<String>>;
}

/// Write side of the document boundary. Writes to one document are
/// serialized by the implementation.
pub trait DocumentWriter: Send + Sync {
    fn set_default_prim(&self, doc: &DocumentRef, prim_name: &str) -> Result<()>;

    fn set_meters_per_unit(&self, doc: &DocumentRef, meters_per_unit: f64) -> Result<()>;

    fn set_up_axis(&self, doc: &DocumentRef, axis: &str) -> Result<()>;

    fn set_prim_transform(
        &self,
        doc: &DocumentRef,
        path: &str,
        transform: &PrimTransform,
    ) -> Result<()>;

    /// Select `selection` (or clear with `None`) in `set_name` on `scope_path`.
    /// Without `persist` the choice lives only in the session.
    fn apply_variant_selection(
        &self,
        doc: &DocumentRef,
        scope_path: &str,
        set_name: &str,
        selection: Option<&str>,
        persist: bool,
    ) -> Result<()>;

    fn add_reference(
        &self,
        doc: &DocumentRef,
        path: &str,
        reference: &ReferenceRecord,
    ) -> Result<()>;

    fn remove_reference(
        &self,
        doc: &DocumentRef,
        path: &str,
        reference: &ReferenceRecord,
    ) -> Result<()>;

    fn set_material_binding(
        &self,
        doc: &DocumentRef,
        path: &str,
        material_path: &str,
    ) -> Result<()>;

    fn clear_material_binding(&self, doc: &DocumentRef, path: &str) -> Result<()>;

    fn set_component_attribute(
        &self,
        doc: &DocumentRef,
        path: &str,
        type_tag: &str,
        name: &str,
        literal: &str,
    ) -> Result<()>;

    fn delete_component_attribute(&self, doc: &DocumentRef, path: &str, name: &str) -> Result<()>;

    /// Return the path of child `name` under `parent_path`, defining it with
    /// `type_name` when absent.
    fn ensure_struct_prim(
        &self,
        doc: &DocumentRef,
        parent_path: &str,
        type_name: &str,
        name: &str,
    ) -> Result<String>;

    fn delete_prim(&self, doc: &DocumentRef, path: &str) -> Result<()>;

    fn set_prim_active(&self, doc: &DocumentRef, path: &str, active: bool) -> Result<()>;
}

/// Both sides of the boundary.
pub trait DocumentBackend: DocumentReader + DocumentWriter {}

impl<T: DocumentReader + DocumentWriter + ?Sized> DocumentBackend for T {}

/// Copies a resource next to a document.
pub trait ResourceImporter: Send + Sync {
    fn import(&self, source: &Path, doc: &DocumentRef) -> Result<ImportedResource>;
}
