// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The inspector fold
//!
//! [`reduce`] applies one [`Action`] to the state and returns the effects
//! the runtime must carry out. It never blocks and never touches the
//! document. Completions are checked against the generation that issued
//! them; mutation results are additionally checked against the component's
//! live revision.

use crate::action::{Action, SectionData, WriteKind, WriteOp};
use crate::config::EngineConfig;
use crate::effect::{CancelKey, Effect, Task};
use crate::playback::{PlaybackState, Timeline};
use crate::state::{
    GroupMembers, InspectorState, LayerState, LayerStatus, LoadSection, SelectionState,
};

/// Apply `action` to `state`.
pub fn reduce(state: &mut InspectorState, action: Action, config: &EngineConfig) -> Vec<Effect> {
    let mut fx = Vec::new();
    match action {
        Action::OpenDocument(doc) => {
            tracing::info!(doc = %doc, "Opening document");
            fx.extend(CancelKey::all().into_iter().map(Effect::Cancel));
            state.document = Some(doc);
            reset_document_scope(state, config);
            begin_layer_load(state, true, &mut fx);
        }
        Action::CloseDocument => {
            fx.extend(CancelKey::all().into_iter().map(Effect::Cancel));
            state.document = None;
            reset_document_scope(state, config);
        }
        Action::ReloadTree => {
            if state.document.is_some() {
                begin_layer_load(state, true, &mut fx);
                let path = state.selection.path.clone();
                begin_selection(state, path, &mut fx);
            }
        }
        Action::SetDefaultPrim(name) => write(state, WriteOp::DefaultPrim(name), None, &mut fx),
        Action::SetMetersPerUnit(value) => {
            write(state, WriteOp::MetersPerUnit(value), None, &mut fx)
        }
        Action::SetUpAxis(axis) => write(state, WriteOp::UpAxis(axis), None, &mut fx),

        Action::SelectPrim(path) => {
            tracing::debug!(path = ?path, "Selection changed");
            begin_selection(state, path, &mut fx);
        }

        Action::SetTransform(transform) => {
            if let Some(path) = state.selection.path.clone() {
                write(state, WriteOp::Transform { path, transform }, None, &mut fx);
            }
        }
        Action::ApplyVariant { set_name, selection } => {
            let scope = state
                .selection
                .variant_scope
                .clone()
                .or_else(|| state.selection.path.clone());
            if let Some(scope) = scope {
                let op = WriteOp::Variant {
                    scope,
                    set_name,
                    selection,
                    persist: config.persist_variant_selection,
                };
                write(state, op, Some(CancelKey::VariantApply), &mut fx);
            }
        }
        Action::AddReference { source, prim_path } => {
            if let Some(path) = state.selection.path.clone() {
                let op = WriteOp::AddReference {
                    path,
                    source,
                    prim_path,
                };
                write(state, op, None, &mut fx);
            }
        }
        Action::RemoveReference(reference) => {
            if let Some(path) = state.selection.path.clone() {
                write(state, WriteOp::RemoveReference { path, reference }, None, &mut fx);
            }
        }
        Action::SetMaterialBinding(material_path) => {
            if let Some(path) = binding_target(&state.selection) {
                let op = WriteOp::SetMaterialBinding {
                    path,
                    material_path,
                };
                write(state, op, None, &mut fx);
            }
        }
        Action::ClearMaterialBinding => {
            if let Some(path) = binding_target(&state.selection) {
                write(state, WriteOp::ClearMaterialBinding { path }, None, &mut fx);
            }
        }
        Action::SetComponentParameter {
            component_path,
            identifier,
            parameter,
            value,
        } => {
            if state.document.is_none() {
                return fx;
            }
            let counter = state.revisions.entry(component_path.clone()).or_insert(0);
            *counter += 1;
            let revision = *counter;
            tracing::debug!(
                path = %component_path,
                parameter = %parameter,
                revision,
                "Issuing component mutation"
            );
            fx.push(Effect::detached(Task::MutateComponent {
                generation: state.selection_generation,
                revision,
                component_path,
                identifier,
                parameter,
                value,
            }));
        }
        Action::SetComponentActive {
            component_path,
            active,
        } => {
            let op = WriteOp::ComponentActive {
                path: component_path,
                active,
            };
            write(state, op, None, &mut fx);
        }
        Action::AddComponent(identifier) => {
            if let Some(owner) = state.selection.path.clone() {
                write(state, WriteOp::AddComponent { owner, identifier }, None, &mut fx);
            }
        }
        Action::RemoveComponent(path) => {
            write(state, WriteOp::RemoveComponent { path }, None, &mut fx)
        }
        Action::ImportAudioResource {
            component_path,
            source,
        } => {
            let op = WriteOp::ImportAudio {
                component_path,
                source,
            };
            write(state, op, None, &mut fx);
        }
        Action::ScanGroupMembers(group_path) => {
            if state.document.is_some() {
                state.group_error = None;
                fx.push(Effect::spawn(
                    CancelKey::GroupScan,
                    Task::ScanGroup {
                        generation: state.layer_generation,
                        group_path,
                    },
                ));
            }
        }

        Action::TogglePlayback => {
            if state.playback.is_playing {
                stop_playback(&mut state.playback, &mut fx);
            } else {
                start_playback(&mut state.playback, &mut fx);
            }
        }
        Action::SetPlaybackSpeed(speed) => {
            if speed.is_finite() {
                state.playback.speed = speed.max(0.0);
            }
        }
        Action::BeginScrub => {
            state.playback.is_scrubbing = true;
            if state.playback.is_playing {
                stop_playback(&mut state.playback, &mut fx);
            }
        }
        Action::Scrub(time) => {
            if let Some(timeline) = state.playback.timeline {
                state.playback.current_time = timeline.clamp(time);
            }
        }
        Action::EndScrub => {
            state.playback.is_scrubbing = false;
            schedule_tick(&state.playback, &mut fx);
        }
        Action::Tick { generation } => {
            let playback = &mut state.playback;
            if generation != playback.generation || !playback.should_tick() {
                return fx;
            }
            if let Some(timeline) = playback.timeline {
                let advance = timeline.advance(playback.current_time, playback.speed);
                playback.current_time = advance.time;
                if advance.finished {
                    playback.is_playing = false;
                } else {
                    schedule_tick(playback, &mut fx);
                }
            }
        }

        Action::LayerLoaded { generation, result } => {
            if generation != state.layer_generation {
                tracing::debug!(
                    generation,
                    current = state.layer_generation,
                    "Dropping stale layer load"
                );
                return fx;
            }
            match result {
                Ok(snapshot) => {
                    let timeline = Timeline::from_metadata(&snapshot.metadata, config.fallback_fps);
                    let first_load = state.playback.timeline.is_none();
                    let auto_play = snapshot.metadata.auto_play == Some(true);
                    state.playback.timeline = Some(timeline);
                    if first_load {
                        state.playback.current_time = timeline.start;
                        if auto_play {
                            start_playback(&mut state.playback, &mut fx);
                        }
                    } else {
                        state.playback.current_time = timeline.clamp(state.playback.current_time);
                    }
                    state.layer.metadata = Some(snapshot.metadata);
                    state.layer.tree = snapshot.tree;
                    state.layer.status = LayerStatus::Ready;
                    state.layer.error = None;
                }
                Err(message) => {
                    tracing::warn!(error = %message, "Layer load failed");
                    state.layer.status = LayerStatus::Failed;
                    state.layer.error = Some(message);
                }
            }
        }
        Action::SectionLoaded {
            generation,
            section,
            result,
        } => {
            if generation != state.selection_generation {
                tracing::debug!(section = ?section, generation, "Dropping stale section load");
                return fx;
            }
            let selection = &mut state.selection;
            selection.pending.remove(&section);
            match result {
                Ok(data) => {
                    selection.section_errors.remove(&section);
                    apply_section(selection, data);
                }
                Err(message) => {
                    tracing::warn!(section = ?section, error = %message, "Section load failed");
                    selection.section_errors.insert(section, message);
                }
            }
        }
        Action::MutationCompleted {
            generation,
            component_path,
            revision,
            result,
        } => {
            let live = state.revision(&component_path);
            if revision != live {
                tracing::debug!(
                    path = %component_path,
                    revision,
                    live,
                    "Discarding stale mutation result"
                );
                return fx;
            }
            if generation != state.selection_generation
                || !state.selection.has_component(&component_path)
            {
                tracing::debug!(
                    path = %component_path,
                    "Mutation result outside the current selection"
                );
                return fx;
            }
            match result {
                Ok(reload) => {
                    state.selection.write_errors.remove(&component_path);
                    state.selection.store_component(&component_path, reload);
                }
                Err(message) => {
                    tracing::warn!(
                        path = %component_path,
                        error = %message,
                        "Component mutation failed"
                    );
                    state.selection.write_errors.insert(component_path, message);
                }
            }
        }
        Action::WriteCompleted {
            layer_generation,
            selection_generation,
            kind,
            target,
            result,
        } => {
            if layer_generation != state.layer_generation {
                tracing::debug!(
                    target = %target,
                    "Dropping write completion for a closed document"
                );
                return fx;
            }
            let same_selection = selection_generation == state.selection_generation;
            match result {
                Ok(()) => {
                    tracing::debug!(target = %target, kind = ?kind, "Write completed");
                    if same_selection {
                        state.selection.write_errors.remove(&target);
                    }
                    match kind {
                        WriteKind::Layer => begin_layer_load(state, false, &mut fx),
                        WriteKind::Transform if same_selection => {
                            reload_section(state, LoadSection::Transform, &mut fx)
                        }
                        WriteKind::References if same_selection => {
                            reload_section(state, LoadSection::References, &mut fx)
                        }
                        WriteKind::MaterialBinding if same_selection => {
                            reload_section(state, LoadSection::MaterialBinding, &mut fx)
                        }
                        WriteKind::Variant | WriteKind::Components => {
                            begin_layer_load(state, false, &mut fx);
                            let path = state.selection.path.clone();
                            begin_selection(state, path, &mut fx);
                        }
                        _ => {}
                    }
                }
                Err(message) => {
                    tracing::warn!(target = %target, error = %message, "Write failed");
                    if kind == WriteKind::Layer {
                        state.layer.error = Some(message);
                    } else if same_selection {
                        state.selection.write_errors.insert(target, message);
                    }
                }
            }
        }
        Action::GroupMembersLoaded {
            generation,
            group_path,
            result,
        } => {
            if generation != state.layer_generation {
                return fx;
            }
            match result {
                Ok(members) => {
                    state.group_members = Some(GroupMembers {
                        group_path,
                        members,
                    });
                    state.group_error = None;
                }
                Err(message) => state.group_error = Some(message),
            }
        }
    }
    fx
}

/// Forget everything tied to the previous document.
fn reset_document_scope(state: &mut InspectorState, config: &EngineConfig) {
    state.layer_generation += 1;
    state.layer = LayerState::default();
    state.selection_generation += 1;
    state.selection = SelectionState::default();
    state.group_members = None;
    state.group_error = None;
    let ticker = state.playback.generation + 1;
    state.playback = PlaybackState::new(config.default_playback_speed);
    state.playback.generation = ticker;
}

fn begin_layer_load(state: &mut InspectorState, refresh: bool, fx: &mut Vec<Effect>) {
    state.layer.status = LayerStatus::Loading;
    fx.push(Effect::spawn(
        CancelKey::LayerLoad,
        Task::LoadLayer {
            generation: state.layer_generation,
            refresh,
        },
    ));
}

/// Reset per-selection caches and load every section of `path`.
fn begin_selection(state: &mut InspectorState, path: Option<String>, fx: &mut Vec<Effect>) {
    fx.extend(
        LoadSection::ALL
            .iter()
            .map(|s| Effect::Cancel(CancelKey::Section(*s))),
    );
    state.selection_generation += 1;
    state.selection = SelectionState::for_path(path);
    if state.document.is_none() {
        return;
    }
    for section in LoadSection::ALL {
        reload_section(state, section, fx);
    }
}

fn reload_section(state: &mut InspectorState, section: LoadSection, fx: &mut Vec<Effect>) {
    let Some(path) = state.selection.path.clone() else {
        return;
    };
    state.selection.pending.insert(section);
    fx.push(Effect::spawn(
        CancelKey::Section(section),
        Task::LoadSection {
            generation: state.selection_generation,
            path,
            section,
        },
    ));
}

fn apply_section(selection: &mut SelectionState, data: SectionData) {
    match data {
        SectionData::Attributes {
            attributes,
            components,
        } => {
            selection.attributes = Some(attributes);
            selection.component_active.clear();
            selection.component_attributes.clear();
            selection.component_descendants.clear();
            selection.components = components.iter().map(|c| c.info.clone()).collect();
            for component in components {
                selection.store_component(&component.info.path, component.reload);
            }
        }
        SectionData::Transform(transform) => selection.transform = transform,
        SectionData::Variants { scope, sets } => {
            selection.variant_scope = Some(scope);
            selection.variant_sets = sets;
        }
        SectionData::References(references) => selection.references = references,
        SectionData::MaterialBinding(binding) => selection.binding = Some(binding),
        SectionData::Materials(materials) => selection.materials = materials,
    }
}

fn binding_target(selection: &SelectionState) -> Option<String> {
    selection
        .binding
        .as_ref()
        .map(|b| b.prim_path.clone())
        .or_else(|| selection.path.clone())
}

fn write(state: &mut InspectorState, op: WriteOp, key: Option<CancelKey>, fx: &mut Vec<Effect>) {
    if state.document.is_none() {
        tracing::debug!(target = %op.target(), "Ignoring write without an open document");
        return;
    }
    fx.push(Effect::Spawn {
        key,
        task: Task::Write {
            layer_generation: state.layer_generation,
            selection_generation: state.selection_generation,
            op,
        },
    });
}

fn start_playback(playback: &mut PlaybackState, fx: &mut Vec<Effect>) {
    let Some(timeline) = playback.timeline else {
        return;
    };
    if playback.current_time >= timeline.end {
        playback.current_time = timeline.start;
    }
    playback.is_playing = true;
    playback.generation += 1;
    schedule_tick(playback, fx);
}

fn stop_playback(playback: &mut PlaybackState, fx: &mut Vec<Effect>) {
    playback.is_playing = false;
    playback.generation += 1;
    fx.push(Effect::Cancel(CancelKey::Playback));
}

fn schedule_tick(playback: &PlaybackState, fx: &mut Vec<Effect>) {
    if !playback.should_tick() {
        return;
    }
    if let Some(timeline) = playback.timeline {
        fx.push(Effect::spawn(
            CancelKey::Playback,
            Task::Tick {
                generation: playback.generation,
                interval: timeline.tick_interval(),
            },
        ));
    }
}
