// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # USDA-Lite Processing
//!
//! Everything between the parsed tree and the inspector: the document
//! boundary contracts, reference resolution, the component parameter table
//! and the in-memory stage that backs the boundary.
//!
//! ## Overview
//!
//! - **Interop**: [`DocumentReader`], [`DocumentWriter`] and [`ResourceImporter`]
//! - **Resolve**: variant scope, material binding prim, mesh-sorting group members
//! - **Components**: `(identifier, parameter, value)` to typed attribute writes and back
//! - **Stage / Store**: parsed-layer document model with per-document caching
//! - **Authoring**: applying writes, component lifecycle, audio resources
//!
//! ## Quick Start
//!
//! ```rust
//! use usda_lite_processing::{map_parameter, ComponentSnapshot, ParameterValue};
//!
//! let writes = map_parameter(
//!     "RealityKit.Collider",
//!     "shape",
//!     &ParameterValue::Text("Sphere".into()),
//!     &ComponentSnapshot::default(),
//! )
//! .unwrap();
//! assert_eq!(writes[0].name, "shapeType");
//! assert_eq!(writes[0].sub_path(), Some("Shape"));
//! ```

pub mod authoring;
pub mod components;
pub mod error;
pub mod import;
pub mod interop;
pub mod resolve;
pub mod stage;
pub mod store;

pub use authoring::{
    add_component, apply_writes, attach_audio_resource, component_reload, discover_components,
    read_component, remove_component, set_component_active, set_component_parameter,
    AudioAttachment, ComponentInfo, ComponentReload, STRUCT_TYPE,
};
pub use components::{
    map_parameter, parameter_keys, read_all_parameters, read_parameter,
    ComponentDescendantAttributes, ComponentParameterWriteSpec, ComponentSnapshot, ParameterValue,
    WriteAction, WriteTarget,
};
pub use error::{Error, Result};
pub use import::{collision_free_destination, relative_path, FsResourceImporter};
pub use interop::{
    AnimationTrack, AnimationTrackKind, DocumentBackend, DocumentMetadata, DocumentReader,
    DocumentRef, DocumentWriter, ImportedResource, MaterialRecord, PrimAttributes, PrimTransform,
    ReferenceRecord, ResourceImporter, VariantOptionRecord, VariantSetRecord,
};
pub use resolve::{
    component_identifier, is_material_like, resolve_material_binding_prim, resolve_variant_scope,
    scan_group_members, tree_attribute_reader, COMPONENT_TYPE, MESH_SORTING_ID,
};
pub use stage::Stage;
pub use store::{StageSource, StageStore};
