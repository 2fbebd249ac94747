// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Component authoring through the document boundary
//!
//! Turns mapped [`ComponentParameterWriteSpec`]s into boundary writes,
//! creates and removes component prims, and attaches imported audio files
//! to a component's resource container.

use std::path::Path;

use serde::{Deserialize, Serialize};
use usda_lite_core::{
    find_node, format_asset, format_relationship_array, format_string, format_string_array,
    join_path, parent_path, parse_relationship_targets, parse_string_array, prim_name_for_file,
    sanitize_prim_name, unique_name, AuthoredAttribute, ResourceKind, SceneNode,
};

use crate::components::audio::{AUDIO_FILE_TYPE, DICT_TYPE, RESOURCES_NAME};
use crate::components::{
    map_parameter, ComponentDescendantAttributes, ComponentParameterWriteSpec, ComponentSnapshot,
    ParameterValue, WriteAction, WriteTarget,
};
use crate::error::{Error, Result};
use crate::interop::{
    DocumentBackend, DocumentReader, DocumentRef, DocumentWriter, ResourceImporter,
};
use crate::resolve::{component_identifier, COMPONENT_TYPE};

/// Prim type of the struct prims below a component.
pub const STRUCT_TYPE: &str = "RealityKitStruct";

/// A component prim found under an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub path: String,
    pub name: String,
    pub identifier: Option<String>,
}

/// Authored state of one component after a load or a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentReload {
    pub attributes: Vec<AuthoredAttribute>,
    pub descendants: Vec<ComponentDescendantAttributes>,
    pub active: bool,
}

impl ComponentReload {
    pub fn snapshot(&self) -> ComponentSnapshot<'_> {
        ComponentSnapshot::new(&self.attributes, &self.descendants)
    }
}

/// Where an attached audio file landed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioAttachment {
    pub prim_path: String,
    pub relative_path: String,
}

/// Component prims directly under `prim_path`, in document order.
pub fn discover_components(roots: &[SceneNode], prim_path: &str) -> Vec<ComponentInfo> {
    let Some(owner) = find_node(roots, prim_path) else {
        return Vec::new();
    };
    owner
        .children
        .iter()
        .filter(|child| child.type_name_or_empty() == COMPONENT_TYPE)
        .map(|child| ComponentInfo {
            path: child.path.clone(),
            name: child.name.clone(),
            identifier: component_identifier(child),
        })
        .collect()
}

/// Authored attributes of a component and every prim below it.
pub fn component_reload(roots: &[SceneNode], component_path: &str) -> Option<ComponentReload> {
    let component = find_node(roots, component_path)?;
    let descendants = component
        .children
        .iter()
        .flat_map(|child| child.walk())
        .map(|node| ComponentDescendantAttributes {
            path: node.path.clone(),
            name: node.name.clone(),
            attributes: node.attributes.clone(),
        })
        .collect();
    Some(ComponentReload {
        attributes: component.attributes.clone(),
        descendants,
        active: component.is_active(),
    })
}

/// Read a component through the boundary.
pub fn read_component<R>(
    reader: &R,
    doc: &DocumentRef,
    component_path: &str,
) -> Result<ComponentReload>
where
    R: DocumentReader + ?Sized,
{
    let roots = reader.load_tree(doc)?;
    component_reload(&roots, component_path)
        .ok_or_else(|| Error::NotFound(component_path.to_string()))
}

fn owner_of(component_path: &str) -> Result<&str> {
    parent_path(component_path)
        .ok_or_else(|| Error::NotFound(format!("owner of {}", component_path)))
}

/// Apply mapped writes relative to `component_path`.
///
/// Descendant struct prims are created on demand for sets. A clear aimed
/// at a struct prim that does not exist is a no-op.
pub fn apply_writes<B>(
    backend: &B,
    doc: &DocumentRef,
    component_path: &str,
    writes: &[ComponentParameterWriteSpec],
) -> Result<()>
where
    B: DocumentBackend + ?Sized,
{
    for write in writes {
        let target = match (&write.target, &write.action) {
            (WriteTarget::Component, _) => component_path.to_string(),
            (WriteTarget::Owner, _) => owner_of(component_path)?.to_string(),
            (WriteTarget::Descendant(sub), WriteAction::Set(_)) => {
                let mut path = component_path.to_string();
                for segment in sub.split('/').filter(|s| !s.is_empty()) {
                    path = backend.ensure_struct_prim(doc, &path, STRUCT_TYPE, segment)?;
                }
                path
            }
            (WriteTarget::Descendant(sub), WriteAction::Clear) => {
                let path = sub
                    .split('/')
                    .filter(|s| !s.is_empty())
                    .fold(component_path.to_string(), |parent, segment| {
                        join_path(Some(&parent), segment)
                    });
                if backend.prim_attributes(doc, &path)?.is_none() {
                    continue;
                }
                path
            }
        };

        match &write.action {
            WriteAction::Set(literal) => {
                backend.set_component_attribute(
                    doc,
                    &target,
                    &write.type_tag,
                    &write.name,
                    literal,
                )?
            }
            WriteAction::Clear => backend.delete_component_attribute(doc, &target, &write.name)?,
        }
        tracing::trace!(path = %target, name = %write.name, "Applied component write");
    }
    Ok(())
}

/// Map one parameter edit against the current authored state, write it,
/// and return the component as re-read afterwards.
pub fn set_component_parameter<B>(
    backend: &B,
    doc: &DocumentRef,
    component_path: &str,
    identifier: &str,
    parameter: &str,
    value: &ParameterValue,
) -> Result<ComponentReload>
where
    B: DocumentBackend + ?Sized,
{
    let roots = backend.load_tree(doc)?;
    let current = component_reload(&roots, component_path)
        .ok_or_else(|| Error::NotFound(component_path.to_string()))?;
    let owner_attributes = find_node(&roots, owner_of(component_path)?)
        .map(|owner| owner.attributes.clone())
        .unwrap_or_default();

    let snapshot = current.snapshot().with_owner(&owner_attributes);
    let writes = map_parameter(identifier, parameter, value, &snapshot)?;
    apply_writes(backend, doc, component_path, &writes)?;

    read_component(backend, doc, component_path)
}

/// Add a component to `owner_path`, reusing one with the same identifier.
pub fn add_component<B>(
    backend: &B,
    doc: &DocumentRef,
    owner_path: &str,
    identifier: &str,
) -> Result<String>
where
    B: DocumentBackend + ?Sized,
{
    let roots = backend.load_tree(doc)?;
    let owner = find_node(&roots, owner_path)
        .ok_or_else(|| Error::NotFound(owner_path.to_string()))?;

    if let Some(existing) = discover_components(&roots, owner_path)
        .into_iter()
        .find(|c| c.identifier.as_deref() == Some(identifier))
    {
        return Ok(existing.path);
    }

    let short = identifier.rsplit('.').next().unwrap_or(identifier);
    let base = sanitize_prim_name(short, ResourceKind::Component);
    let name = unique_name(&base, |candidate| owner.children.iter().any(|c| c.name == candidate));

    let path = backend.ensure_struct_prim(doc, owner_path, COMPONENT_TYPE, &name)?;
    backend.set_component_attribute(
        doc,
        &path,
        "uniform token",
        "info:id",
        &format_string(identifier),
    )?;
    tracing::info!(owner = %owner_path, component = %identifier, path = %path, "Added component");
    Ok(path)
}

pub fn remove_component<B>(backend: &B, doc: &DocumentRef, component_path: &str) -> Result<()>
where
    B: DocumentBackend + ?Sized,
{
    backend.delete_prim(doc, component_path)?;
    tracing::info!(path = %component_path, "Removed component");
    Ok(())
}

pub fn set_component_active<B>(
    backend: &B,
    doc: &DocumentRef,
    component_path: &str,
    active: bool,
) -> Result<()>
where
    B: DocumentBackend + ?Sized,
{
    backend.set_prim_active(doc, component_path, active)
}

/// Import an audio file and register it with a component.
///
/// The file prim is created under the component's owner; the component's
/// `resources` dictionary gains the prim name as key and the prim as value.
pub fn attach_audio_resource<B, I>(
    backend: &B,
    importer: &I,
    doc: &DocumentRef,
    component_path: &str,
    source: &Path,
) -> Result<AudioAttachment>
where
    B: DocumentBackend + ?Sized,
    I: ResourceImporter + ?Sized,
{
    let owner_path = owner_of(component_path)?;
    let roots = backend.load_tree(doc)?;
    let owner = find_node(&roots, owner_path)
        .ok_or_else(|| Error::NotFound(owner_path.to_string()))?;
    let imported = importer.import(source, doc)?;

    let file_name = source.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let base = prim_name_for_file(file_name, ResourceKind::Audio);
    let name = unique_name(&base, |candidate| owner.children.iter().any(|c| c.name == candidate));

    let prim_path = backend.ensure_struct_prim(doc, owner_path, AUDIO_FILE_TYPE, &name)?;
    backend.set_component_attribute(
        doc,
        &prim_path,
        "uniform asset",
        "file",
        &format_asset(&imported.relative_path),
    )?;

    let resources_path = join_path(Some(component_path), RESOURCES_NAME);
    let existing = find_node(&roots, &resources_path);
    let mut keys = existing
        .and_then(|n| n.attribute("keys"))
        .and_then(|a| parse_string_array(&a.literal))
        .unwrap_or_default();
    let mut values = existing
        .and_then(|n| n.attribute("values"))
        .map(|a| parse_relationship_targets(&a.literal))
        .unwrap_or_default();
    keys.push(name);
    values.push(prim_path.clone());

    let resources_path =
        backend.ensure_struct_prim(doc, component_path, DICT_TYPE, RESOURCES_NAME)?;
    backend.set_component_attribute(
        doc,
        &resources_path,
        "string[]",
        "keys",
        &format_string_array(&keys),
    )?;
    backend.set_component_attribute(
        doc,
        &resources_path,
        "rel",
        "values",
        &format_relationship_array(&values),
    )?;

    tracing::info!(component = %component_path, prim = %prim_path, "Attached audio resource");
    Ok(AudioAttachment {
        prim_path,
        relative_path: imported.relative_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::read_parameter;
    use crate::import::FsResourceImporter;
    use crate::store::StageStore;

    const SCENE: &str = r#"def Xform "Root" {
    def Sphere "Ball" {
        def RealityKitComponent "Collider" {
            uniform token info:id = "RealityKit.Collider"
        }
        def RealityKitComponent "Controller" {
            uniform token info:id = "RealityKit.CharacterController"
        }
    }
}"#;

    fn store() -> (StageStore, DocumentRef) {
        let store = StageStore::in_memory();
        let doc = DocumentRef::new("/scenes/ball.usda");
        store.insert_text(&doc, SCENE).unwrap();
        (store, doc)
    }

    #[test]
    fn test_collider_shape_lands_on_shape_struct() {
        let (store, doc) = store();
        let reload = set_component_parameter(
            &store,
            &doc,
            "/Root/Ball/Collider",
            "RealityKit.Collider",
            "shape",
            &ParameterValue::Text("Sphere".into()),
        )
        .unwrap();

        assert_eq!(reload.descendants.len(), 1);
        assert_eq!(reload.descendants[0].path, "/Root/Ball/Collider/Shape");
        assert_eq!(reload.descendants[0].attributes[0].name, "shapeType");
        assert_eq!(reload.descendants[0].attributes[0].literal, "\"Sphere\"");
        assert!(store.text(&doc).unwrap().contains("def RealityKitStruct \"Shape\""));
    }

    #[test]
    fn test_up_vector_writes_owner_ops() {
        let (store, doc) = store();
        set_component_parameter(
            &store,
            &doc,
            "/Root/Ball/Controller",
            "RealityKit.CharacterController",
            "upVector",
            &ParameterValue::Vector3([0.0, 0.0, 1.0]),
        )
        .unwrap();
        let owner = store.prim_attributes(&doc, "/Root/Ball").unwrap().unwrap();
        let rotate = owner
            .authored_attributes
            .iter()
            .find(|a| a.name == "xformOp:rotateXYZ")
            .unwrap();
        assert_eq!(rotate.literal, "(90, 0, 0)");
        assert!(owner.authored_attributes.iter().any(|a| a.name == "xformOpOrder"));
    }

    #[test]
    fn test_height_round_trip_through_store() {
        let (store, doc) = store();
        let reload = set_component_parameter(
            &store,
            &doc,
            "/Root/Ball/Controller",
            "RealityKit.CharacterController",
            "height",
            &ParameterValue::Number(150.0),
        )
        .unwrap();
        assert!(store.text(&doc).unwrap().contains("float3 extents = (0.15, 0.25, 0)"));
        assert_eq!(
            read_parameter("RealityKit.CharacterController", "height", &reload.snapshot()),
            Some(ParameterValue::Number(150.0))
        );
    }

    #[test]
    fn test_clear_on_missing_struct_is_noop() {
        let (store, doc) = store();
        let writes = vec![ComponentParameterWriteSpec::clear("float", "zNear").at("Shadow")];
        apply_writes(&store, &doc, "/Root/Ball/Collider", &writes).unwrap();
        assert!(!store.text(&doc).unwrap().contains("Shadow"));
    }

    #[test]
    fn test_unsupported_parameter_surfaces() {
        let (store, doc) = store();
        let result = set_component_parameter(
            &store,
            &doc,
            "/Root/Ball/Collider",
            "RealityKit.Collider",
            "colour",
            &ParameterValue::Number(1.0),
        );
        assert!(matches!(result, Err(Error::UnsupportedMapping { .. })));
    }

    #[test]
    fn test_component_lifecycle() {
        let (store, doc) = store();
        let existing = add_component(&store, &doc, "/Root/Ball", "RealityKit.Collider").unwrap();
        assert_eq!(existing, "/Root/Ball/Collider");

        let added = add_component(&store, &doc, "/Root/Ball", "RealityKit.Opacity").unwrap();
        assert_eq!(added, "/Root/Ball/Opacity");
        let roots = store.load_tree(&doc).unwrap();
        let components = discover_components(&roots, "/Root/Ball");
        assert_eq!(components.len(), 3);
        assert_eq!(components[2].identifier.as_deref(), Some("RealityKit.Opacity"));

        set_component_active(&store, &doc, &added, false).unwrap();
        assert!(!read_component(&store, &doc, &added).unwrap().active);

        remove_component(&store, &doc, &added).unwrap();
        let roots = store.load_tree(&doc).unwrap();
        assert_eq!(discover_components(&roots, "/Root/Ball").len(), 2);
    }

    #[test]
    fn test_add_component_avoids_name_clash() {
        let store = StageStore::in_memory();
        let doc = DocumentRef::new("/scenes/clash.usda");
        store
            .insert_text(&doc, r#"def Xform "Root" { def Mesh "Opacity" {} }"#)
            .unwrap();
        let path = add_component(&store, &doc, "/Root", "RealityKit.Opacity").unwrap();
        assert_eq!(path, "/Root/Opacity_1");
    }

    #[test]
    fn test_attach_audio_resource() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("01 chime.wav");
        std::fs::write(&source, b"RIFF").unwrap();

        let store = StageStore::in_memory();
        let doc = DocumentRef::new(dir.path().join("Scene.usda"));
        store
            .insert_text(
                &doc,
                r#"def Xform "Root" {
                    def RealityKitComponent "SpatialAudio" {
                        uniform token info:id = "RealityKit.SpatialAudio"
                    }
                }"#,
            )
            .unwrap();
        let importer = FsResourceImporter::default();

        let first =
            attach_audio_resource(&store, &importer, &doc, "/Root/SpatialAudio", &source)
                .unwrap();
        assert_eq!(first.prim_path, "/Root/_01_chime");
        assert_eq!(first.relative_path, "./Assets/01 chime.wav");

        let second =
            attach_audio_resource(&store, &importer, &doc, "/Root/SpatialAudio", &source)
                .unwrap();
        assert_eq!(second.prim_path, "/Root/_01_chime_1");

        let reload = read_component(&store, &doc, "/Root/SpatialAudio").unwrap();
        let resources = &reload.descendants[0];
        assert_eq!(resources.name, "resources");
        let keys = resources.attributes.iter().find(|a| a.name == "keys").unwrap();
        assert_eq!(keys.literal, r#"["_01_chime", "_01_chime_1"]"#);
        let values = resources.attributes.iter().find(|a| a.name == "values").unwrap();
        assert_eq!(values.literal, "[</Root/_01_chime>, </Root/_01_chime_1>]");
    }
}
