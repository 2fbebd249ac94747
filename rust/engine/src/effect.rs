// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Effects requested by the reducer and carried out by the runtime.

use std::time::Duration;

use usda_lite_processing::ParameterValue;

use crate::action::WriteOp;
use crate::state::LoadSection;

/// Identifies in-flight work that a later request supersedes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelKey {
    LayerLoad,
    Section(LoadSection),
    Playback,
    VariantApply,
    GroupScan,
}

impl CancelKey {
    /// Every key a document change cancels.
    pub fn all() -> Vec<CancelKey> {
        let mut keys = vec![
            CancelKey::LayerLoad,
            CancelKey::Playback,
            CancelKey::VariantApply,
            CancelKey::GroupScan,
        ];
        keys.extend(LoadSection::ALL.iter().map(|s| CancelKey::Section(*s)));
        keys
    }
}

/// Work run off the fold loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    LoadLayer {
        generation: u64,
        /// Drop cached document state first
        refresh: bool,
    },
    LoadSection {
        generation: u64,
        path: String,
        section: LoadSection,
    },
    MutateComponent {
        generation: u64,
        revision: u64,
        component_path: String,
        identifier: String,
        parameter: String,
        value: ParameterValue,
    },
    Write {
        layer_generation: u64,
        selection_generation: u64,
        op: WriteOp,
    },
    ScanGroup {
        generation: u64,
        group_path: String,
    },
    /// Sleep, then deliver a tick
    Tick {
        generation: u64,
        interval: Duration,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Start `task`, replacing any in-flight task under the same key
    Spawn { key: Option<CancelKey>, task: Task },
    Cancel(CancelKey),
}

impl Effect {
    pub fn spawn(key: CancelKey, task: Task) -> Self {
        Effect::Spawn {
            key: Some(key),
            task,
        }
    }

    /// Start `task` without a key; it is never cancelled.
    pub fn detached(task: Task) -> Self {
        Effect::Spawn { key: None, task }
    }
}
