// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fs;
use std::sync::Arc;

use usda_lite_engine::{Action, EngineConfig, Inspector, LayerStatus, LoadSection};
use usda_lite_processing::{
    read_parameter, DocumentRef, FsResourceImporter, ParameterValue, PrimTransform, StageStore,
};

const TWO_LINE: &str = "def Xform \"Root\" {\n    def Sphere \"Ball\" {}\n}\n";

const SCENE: &str = r#"#usda 1.0
(
    defaultPrim = "Root"
    metersPerUnit = 1
    upAxis = "Y"
)

def Xform "Root" (
    variants = {
        string look = "Red"
    }
    prepend variantSets = "look"
)
{
    def Sphere "Ball" {}

    def Cube "Box" {}

    def Scope "Looks" {
        def Material "Red" {}
    }

    variantSet "look" = {
        "Red" {
            def Sphere "Trim" {}
        }
        "Blue" {
            def Cube "Trim" {}
        }
    }
}
"#;

fn in_memory(text: &str) -> (Arc<StageStore>, DocumentRef, Inspector) {
    let store = Arc::new(StageStore::in_memory());
    let doc = DocumentRef::new("/virtual/Scene.usda");
    store.insert_text(&doc, text).unwrap();
    let inspector = Inspector::new(
        store.clone(),
        Arc::new(FsResourceImporter::default()),
        EngineConfig::default(),
    );
    (store, doc, inspector)
}

async fn open(inspector: &mut Inspector, doc: &DocumentRef) {
    inspector.dispatch(Action::OpenDocument(doc.clone()));
    inspector.run_until_idle().await;
}

async fn select(inspector: &mut Inspector, path: &str) {
    inspector.dispatch(Action::SelectPrim(Some(path.to_string())));
    inspector.run_until_idle().await;
}

#[tokio::test]
async fn test_select_and_author_collider_shape() {
    let (store, doc, mut inspector) = in_memory(TWO_LINE);
    open(&mut inspector, &doc).await;

    let layer = &inspector.state().layer;
    assert_eq!(layer.status, LayerStatus::Ready);
    assert_eq!(layer.tree.len(), 1);
    assert_eq!(layer.tree[0].name, "Root");
    assert_eq!(layer.tree[0].children.len(), 1);
    assert_eq!(layer.tree[0].children[0].name, "Ball");

    select(&mut inspector, "/Root/Ball").await;
    let selection = &inspector.state().selection;
    assert!(!selection.is_loading());
    assert_eq!(selection.attributes.as_ref().unwrap().type_name, "Sphere");
    assert!(selection.components.is_empty());

    inspector.dispatch(Action::AddComponent("RealityKit.Collider".into()));
    inspector.run_until_idle().await;
    let components = &inspector.state().selection.components;
    assert_eq!(components.len(), 1);
    assert_eq!(components[0].identifier.as_deref(), Some("RealityKit.Collider"));
    let component = components[0].path.clone();

    inspector.dispatch(Action::SetComponentParameter {
        component_path: component.clone(),
        identifier: "RealityKit.Collider".into(),
        parameter: "shape".into(),
        value: ParameterValue::Text("Sphere".into()),
    });
    inspector.run_until_idle().await;

    let reload = inspector.state().selection.component(&component).unwrap();
    let shape = reload
        .descendants
        .iter()
        .find(|d| d.path == format!("{}/Shape", component))
        .expect("shape struct");
    let shape_type = shape.attributes.iter().find(|a| a.name == "shapeType").unwrap();
    assert_eq!(shape_type.literal, "\"Sphere\"");
    assert_eq!(inspector.state().revision(&component), 1);

    let text = store.text(&doc).unwrap();
    assert!(text.contains("def RealityKitStruct \"Shape\""));
    assert!(text.contains("token shapeType = \"Sphere\""));
}

#[tokio::test]
async fn test_character_height_round_trip() {
    let (store, doc, mut inspector) = in_memory(TWO_LINE);
    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Ball").await;
    inspector.dispatch(Action::AddComponent("RealityKit.CharacterController".into()));
    inspector.run_until_idle().await;
    let component = inspector.state().selection.components[0].path.clone();

    inspector.dispatch(Action::SetComponentParameter {
        component_path: component.clone(),
        identifier: "RealityKit.CharacterController".into(),
        parameter: "height".into(),
        value: ParameterValue::Number(150.0),
    });
    inspector.run_until_idle().await;

    let reload = inspector.state().selection.component(&component).unwrap();
    let height = read_parameter("RealityKit.CharacterController", "height", &reload.snapshot());
    assert_eq!(height, Some(ParameterValue::Number(150.0)));
    assert!(store.text(&doc).unwrap().contains("float3 extents = (0.15, 0.25, 0)"));
}

#[tokio::test]
async fn test_only_latest_mutation_lands() {
    let (_store, doc, mut inspector) = in_memory(TWO_LINE);
    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Ball").await;
    inspector.dispatch(Action::AddComponent("RealityKit.Collider".into()));
    inspector.run_until_idle().await;
    let component = inspector.state().selection.components[0].path.clone();

    // Both edits are in flight before either result is folded
    inspector.dispatch(Action::SetComponentParameter {
        component_path: component.clone(),
        identifier: "RealityKit.Collider".into(),
        parameter: "mode".into(),
        value: ParameterValue::Text("Trigger".into()),
    });
    inspector.dispatch(Action::SetComponentParameter {
        component_path: component.clone(),
        identifier: "RealityKit.Collider".into(),
        parameter: "shape".into(),
        value: ParameterValue::Text("Sphere".into()),
    });
    assert_eq!(inspector.state().revision(&component), 2);
    inspector.run_until_idle().await;

    let landed = inspector.state().selection.component(&component).unwrap();
    assert_eq!(
        read_parameter("RealityKit.Collider", "shape", &landed.snapshot()),
        Some(ParameterValue::Text("Sphere".into()))
    );

    // A first-revision result arriving late is discarded
    let mut late = landed.clone();
    for descendant in &mut late.descendants {
        for attribute in &mut descendant.attributes {
            if attribute.name == "shapeType" {
                attribute.literal = "\"Box\"".into();
            }
        }
    }
    let generation = inspector.state().selection_generation;
    inspector
        .sender()
        .send(Action::MutationCompleted {
            generation,
            component_path: component.clone(),
            revision: 1,
            result: Ok(late),
        })
        .unwrap();
    inspector
        .sender()
        .send(Action::MutationCompleted {
            generation,
            component_path: component.clone(),
            revision: 1,
            result: Err("superseded".into()),
        })
        .unwrap();
    inspector.run_until_idle().await;

    let selection = &inspector.state().selection;
    let current = selection.component(&component).unwrap();
    assert_eq!(
        read_parameter("RealityKit.Collider", "shape", &current.snapshot()),
        Some(ParameterValue::Text("Sphere".into()))
    );
    assert!(!selection.write_errors.contains_key(&component));
    assert_eq!(inspector.state().revision(&component), 2);
}

#[tokio::test]
async fn test_failed_section_keeps_others() {
    let (_store, doc, mut inspector) = in_memory(TWO_LINE);
    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Missing").await;

    let selection = &inspector.state().selection;
    assert!(!selection.is_loading());
    assert!(selection.section_errors.contains_key(&LoadSection::Attributes));
    // Document-wide reads still succeed for a missing prim.
    assert!(!selection.section_errors.contains_key(&LoadSection::Materials));
    assert!(inspector.state().layer.error.is_none());
}

#[tokio::test]
async fn test_material_binding_and_variants() {
    let (store, doc, mut inspector) = in_memory(SCENE);
    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Ball").await;

    let selection = &inspector.state().selection;
    assert_eq!(selection.materials.len(), 1);
    assert_eq!(selection.binding.as_ref().unwrap().prim_path, "/Root/Ball");
    assert!(selection.binding.as_ref().unwrap().material.is_none());

    inspector.dispatch(Action::SetMaterialBinding("/Root/Looks/Red".into()));
    inspector.run_until_idle().await;
    let binding = inspector.state().selection.binding.clone().unwrap();
    assert_eq!(binding.material.as_deref(), Some("/Root/Looks/Red"));
    assert!(store.text(&doc).unwrap().contains("rel material:binding = </Root/Looks/Red>"));

    select(&mut inspector, "/Root").await;
    let selection = &inspector.state().selection;
    assert_eq!(selection.variant_scope.as_deref(), Some("/Root"));
    assert_eq!(selection.variant_sets[0].selected_option_id.as_deref(), Some("Red"));

    inspector.dispatch(Action::ApplyVariant {
        set_name: "look".into(),
        selection: Some("Blue".into()),
    });
    inspector.run_until_idle().await;
    let state = inspector.state();
    assert_eq!(state.selection.variant_sets[0].selected_option_id.as_deref(), Some("Blue"));
    let trim = state.layer.tree[0]
        .children
        .iter()
        .find(|c| c.name == "Trim")
        .unwrap();
    assert_eq!(trim.type_name.as_deref(), Some("Cube"));
}

#[tokio::test]
async fn test_transform_write_reloads() {
    let (_store, doc, mut inspector) = in_memory(SCENE);
    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Box").await;
    assert_eq!(inspector.state().selection.transform, Some(PrimTransform::default()));

    let transform = PrimTransform {
        position: [1.0, 2.0, 3.0],
        rotation_degrees: [0.0, 90.0, 0.0],
        scale: [2.0, 2.0, 2.0],
    };
    inspector.dispatch(Action::SetTransform(transform));
    inspector.run_until_idle().await;
    assert_eq!(inspector.state().selection.transform, Some(transform));
}

#[tokio::test]
async fn test_group_scan() {
    let (_store, doc, mut inspector) = in_memory(SCENE);
    open(&mut inspector, &doc).await;

    for owner in ["/Root/Box", "/Root/Ball"] {
        select(&mut inspector, owner).await;
        inspector.dispatch(Action::AddComponent("RealityKit.MeshSorting".into()));
        inspector.run_until_idle().await;
        let component = inspector.state().selection.components[0].path.clone();
        inspector.dispatch(Action::SetComponentParameter {
            component_path: component,
            identifier: "RealityKit.MeshSorting".into(),
            parameter: "group".into(),
            value: ParameterValue::Text("/Root/G".into()),
        });
        inspector.run_until_idle().await;
    }

    inspector.dispatch(Action::ScanGroupMembers("/Root/G".into()));
    inspector.run_until_idle().await;
    let members = inspector.state().group_members.clone().unwrap();
    assert_eq!(members.members, vec!["/Root/Ball".to_string(), "/Root/Box".to_string()]);
}

#[tokio::test]
async fn test_file_backed_layer_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Scene.usda");
    fs::write(&path, SCENE).unwrap();
    let doc = DocumentRef::new(&path);
    let mut inspector = Inspector::with_files(EngineConfig::default());

    open(&mut inspector, &doc).await;
    inspector.dispatch(Action::SetMetersPerUnit(0.01));
    inspector.dispatch(Action::SetUpAxis("Z".into()));
    inspector.run_until_idle().await;

    let metadata = inspector.state().layer.metadata.clone().unwrap();
    assert_eq!(metadata.meters_per_unit, Some(0.01));
    assert_eq!(metadata.up_axis.as_deref(), Some("Z"));
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("metersPerUnit = 0.01"));
    assert!(written.contains("upAxis = \"Z\""));

    inspector.dispatch(Action::SetUpAxis("X".into()));
    inspector.run_until_idle().await;
    assert!(inspector.state().layer.error.is_some());
}

#[tokio::test]
async fn test_session_variant_is_not_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Scene.usda");
    fs::write(&path, SCENE).unwrap();
    let doc = DocumentRef::new(&path);
    let config = EngineConfig {
        persist_variant_selection: false,
        ..EngineConfig::default()
    };
    let mut inspector = Inspector::with_files(config);

    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root").await;
    inspector.dispatch(Action::ApplyVariant {
        set_name: "look".into(),
        selection: Some("Blue".into()),
    });
    inspector.run_until_idle().await;

    let trim = inspector.state().layer.tree[0]
        .children
        .iter()
        .find(|c| c.name == "Trim")
        .cloned()
        .unwrap();
    assert_eq!(trim.type_name.as_deref(), Some("Cube"));
    assert_eq!(fs::read_to_string(&path).unwrap(), SCENE);
}

#[tokio::test]
async fn test_audio_import_attaches_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Scene.usda");
    fs::write(&path, SCENE).unwrap();
    let source = dir.path().join("chime.wav");
    fs::write(&source, b"RIFF").unwrap();
    let doc = DocumentRef::new(&path);
    let mut inspector = Inspector::with_files(EngineConfig::default());

    open(&mut inspector, &doc).await;
    select(&mut inspector, "/Root/Ball").await;
    inspector.dispatch(Action::AddComponent("RealityKit.SpatialAudio".into()));
    inspector.run_until_idle().await;
    let component = inspector.state().selection.components[0].path.clone();

    inspector.dispatch(Action::ImportAudioResource {
        component_path: component,
        source: source.clone(),
    });
    inspector.run_until_idle().await;

    assert!(dir.path().join("Assets").join("chime.wav").is_file());
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.contains("def RealityKitAudioFile \"chime\""));
    assert!(written.contains("uniform asset file = @./Assets/chime.wav@"));
    assert!(inspector.state().selection.write_errors.is_empty());
}

#[tokio::test]
async fn test_autoplay_runs_to_the_end() {
    let text = r#"#usda 1.0
(
    startTimeCode = 0
    endTimeCode = 2
    timeCodesPerSecond = 100
    customLayerData = {
        bool autoPlay = 1
    }
)

def Xform "Root" {}
"#;
    let (_store, doc, mut inspector) = in_memory(text);
    open(&mut inspector, &doc).await;
    assert!(inspector.state().playback.is_playing);

    while inspector.next_tick().await {}
    let playback = &inspector.state().playback;
    assert!(!playback.is_playing);
    assert_eq!(playback.current_time, 0.02);
}

#[tokio::test]
async fn test_close_document_stops_playback() {
    let text = "#usda 1.0\n(\n    endTimeCode = 1000\n    playbackMode = \"loop\"\n)\n\n\
                def Xform \"Root\" {}\n";
    let (_store, doc, mut inspector) = in_memory(text);
    open(&mut inspector, &doc).await;
    inspector.dispatch(Action::TogglePlayback);
    assert!(inspector.state().playback.is_playing);

    inspector.dispatch(Action::CloseDocument);
    assert!(!inspector.state().playback.is_playing);
    assert!(inspector.state().document.is_none());
    inspector.next_tick().await;
    assert_eq!(inspector.state().playback.current_time, 0.0);
}
