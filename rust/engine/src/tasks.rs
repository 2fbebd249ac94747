// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocking task bodies
//!
//! Each task talks to the document boundary and turns its outcome into a
//! completion [`Action`]. Errors cross back as display strings.

use std::sync::Arc;

use usda_lite_processing::{
    add_component, attach_audio_resource, component_reload, discover_components, remove_component,
    resolve_material_binding_prim, resolve_variant_scope, scan_group_members,
    set_component_active, set_component_parameter, tree_attribute_reader, ComponentReload,
    DocumentBackend, DocumentRef, Error, ParameterValue, ReferenceRecord, ResourceImporter, Result,
};

use crate::action::{Action, LayerSnapshot, SectionData, WriteOp};
use crate::effect::Task;
use crate::state::{BindingState, LoadSection, LoadedComponent};

/// What tasks run against.
#[derive(Clone)]
pub struct TaskContext {
    pub backend: Arc<dyn DocumentBackend>,
    pub importer: Arc<dyn ResourceImporter>,
}

impl TaskContext {
    pub fn new(backend: Arc<dyn DocumentBackend>, importer: Arc<dyn ResourceImporter>) -> Self {
        Self { backend, importer }
    }
}

/// Run `task` against `doc` and report its completion.
pub fn run(ctx: &TaskContext, doc: &DocumentRef, task: Task) -> Action {
    match task {
        Task::LoadLayer {
            generation,
            refresh,
        } => Action::LayerLoaded {
            generation,
            result: load_layer(ctx, doc, refresh)
                .map_err(|e| format!("Failed to load {}: {}", doc, e)),
        },
        Task::LoadSection {
            generation,
            path,
            section,
        } => Action::SectionLoaded {
            generation,
            section,
            result: load_section(ctx, doc, &path, section)
                .map_err(|e| format!("Failed to load {:?} of {}: {}", section, path, e)),
        },
        Task::MutateComponent {
            generation,
            revision,
            component_path,
            identifier,
            parameter,
            value,
        } => {
            let result =
                mutate_component(ctx, doc, &component_path, &identifier, &parameter, &value)
                    .map_err(|e| {
                        format!("Failed to set {} on {}: {}", parameter, component_path, e)
                    });
            Action::MutationCompleted {
                generation,
                component_path,
                revision,
                result,
            }
        }
        Task::Write {
            layer_generation,
            selection_generation,
            op,
        } => Action::WriteCompleted {
            layer_generation,
            selection_generation,
            kind: op.kind(),
            target: op.target().to_string(),
            result: write(ctx, doc, &op)
                .map_err(|e| format!("Write to {} failed: {}", op.target(), e)),
        },
        Task::ScanGroup {
            generation,
            group_path,
        } => {
            let result = scan_group(ctx, doc, &group_path)
                .map_err(|e| format!("Failed to scan group {}: {}", group_path, e));
            Action::GroupMembersLoaded {
                generation,
                group_path,
                result,
            }
        }
        Task::Tick { generation, .. } => Action::Tick { generation },
    }
}

fn load_layer(ctx: &TaskContext, doc: &DocumentRef, refresh: bool) -> Result<LayerSnapshot> {
    if refresh {
        ctx.backend.refresh(doc)?;
    }
    Ok(LayerSnapshot {
        metadata: ctx.backend.metadata(doc)?,
        tree: ctx.backend.load_tree(doc)?,
    })
}

fn load_section(
    ctx: &TaskContext,
    doc: &DocumentRef,
    path: &str,
    section: LoadSection,
) -> Result<SectionData> {
    let backend = ctx.backend.as_ref();
    let data = match section {
        LoadSection::Attributes => {
            let attributes = backend
                .prim_attributes(doc, path)?
                .ok_or_else(|| Error::NotFound(path.to_string()))?;
            let tree = backend.load_tree(doc)?;
            let components = discover_components(&tree, path)
                .into_iter()
                .map(|info| {
                    let reload = component_reload(&tree, &info.path).unwrap_or_default();
                    LoadedComponent { info, reload }
                })
                .collect();
            SectionData::Attributes {
                attributes,
                components,
            }
        }
        LoadSection::Transform => SectionData::Transform(backend.prim_transform(doc, path)?),
        LoadSection::Variants => {
            let scope =
                resolve_variant_scope(path, |p| backend.variant_sets(doc, p).unwrap_or_default());
            let sets = backend.variant_sets(doc, &scope)?;
            SectionData::Variants { scope, sets }
        }
        LoadSection::References => SectionData::References(backend.references(doc, path)?),
        LoadSection::MaterialBinding => {
            let tree = backend.load_tree(doc)?;
            let prim_path = resolve_material_binding_prim(&tree, path);
            let material = backend.material_binding(doc, &prim_path)?;
            let strength = backend.material_binding_strength(doc, &prim_path)?;
            SectionData::MaterialBinding(BindingState {
                prim_path,
                material,
                strength,
            })
        }
        LoadSection::Materials => SectionData::Materials(backend.materials(doc)?),
    };
    Ok(data)
}

fn mutate_component(
    ctx: &TaskContext,
    doc: &DocumentRef,
    component_path: &str,
    identifier: &str,
    parameter: &str,
    value: &ParameterValue,
) -> Result<ComponentReload> {
    set_component_parameter(ctx.backend.as_ref(), doc, component_path, identifier, parameter, value)
}

fn write(ctx: &TaskContext, doc: &DocumentRef, op: &WriteOp) -> Result<()> {
    let backend = ctx.backend.as_ref();
    match op {
        WriteOp::DefaultPrim(name) => backend.set_default_prim(doc, name),
        WriteOp::MetersPerUnit(value) => backend.set_meters_per_unit(doc, *value),
        WriteOp::UpAxis(axis) => backend.set_up_axis(doc, axis),
        WriteOp::Transform { path, transform } => backend.set_prim_transform(doc, path, transform),
        WriteOp::Variant {
            scope,
            set_name,
            selection,
            persist,
        } => backend.apply_variant_selection(doc, scope, set_name, selection.as_deref(), *persist),
        WriteOp::AddReference {
            path,
            source,
            prim_path,
        } => {
            let imported = ctx.importer.import(source, doc)?;
            let reference = ReferenceRecord {
                asset_path: imported.relative_path,
                prim_path: prim_path.clone(),
            };
            backend.add_reference(doc, path, &reference)
        }
        WriteOp::RemoveReference { path, reference } => {
            backend.remove_reference(doc, path, reference)
        }
        WriteOp::SetMaterialBinding {
            path,
            material_path,
        } => backend.set_material_binding(doc, path, material_path),
        WriteOp::ClearMaterialBinding { path } => backend.clear_material_binding(doc, path),
        WriteOp::ComponentActive { path, active } => {
            set_component_active(backend, doc, path, *active)
        }
        WriteOp::AddComponent { owner, identifier } => {
            add_component(backend, doc, owner, identifier).map(|_| ())
        }
        WriteOp::RemoveComponent { path } => remove_component(backend, doc, path),
        WriteOp::ImportAudio {
            component_path,
            source,
        } => {
            let attachment =
                attach_audio_resource(backend, ctx.importer.as_ref(), doc, component_path, source)?;
            tracing::info!(
                component = %component_path,
                prim = %attachment.prim_path,
                file = %attachment.relative_path,
                "Attached audio resource"
            );
            Ok(())
        }
    }
}

fn scan_group(ctx: &TaskContext, doc: &DocumentRef, group_path: &str) -> Result<Vec<String>> {
    let tree = ctx.backend.load_tree(doc)?;
    Ok(scan_group_members(&tree, group_path, tree_attribute_reader(&tree)))
}
