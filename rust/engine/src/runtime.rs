// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Async inspector runtime
//!
//! [`Inspector`] owns the state and folds actions into it on the caller's
//! task. Document work runs on the blocking pool; completions come back
//! over an unbounded channel. Keyed tasks are aborted when a newer request
//! under the same key arrives or the reducer cancels the key.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use usda_lite_processing::{DocumentBackend, FsResourceImporter, ResourceImporter};

use crate::action::Action;
use crate::config::EngineConfig;
use crate::effect::{CancelKey, Effect, Task};
use crate::reduce::reduce;
use crate::state::InspectorState;
use crate::store::file_store;
use crate::tasks::{self, TaskContext};

pub struct Inspector {
    state: InspectorState,
    config: EngineConfig,
    ctx: TaskContext,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Action>,
    /// Document work
    tasks: JoinSet<()>,
    /// The pending playback tick, kept apart so idling ignores playback
    ticker: Option<JoinHandle<()>>,
    running: FxHashMap<CancelKey, AbortHandle>,
}

impl Inspector {
    pub fn new(
        backend: Arc<dyn DocumentBackend>,
        importer: Arc<dyn ResourceImporter>,
        config: EngineConfig,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Action>();
        let mut state = InspectorState::default();
        state.playback.speed = config.default_playback_speed;
        Self {
            state,
            config,
            ctx: TaskContext::new(backend, importer),
            tx,
            rx,
            tasks: JoinSet::new(),
            ticker: None,
            running: FxHashMap::default(),
        }
    }

    /// Inspector over scene files on disk.
    pub fn with_files(config: EngineConfig) -> Self {
        let importer = FsResourceImporter::new(config.asset_dir_name.clone());
        Self::new(Arc::new(file_store()), Arc::new(importer), config)
    }

    pub fn state(&self) -> &InspectorState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A sender other tasks can queue actions on. Queued actions are folded
    /// by [`Inspector::step`].
    pub fn sender(&self) -> mpsc::UnboundedSender<Action> {
        self.tx.clone()
    }

    /// Fold one action and carry out its effects.
    pub fn dispatch(&mut self, action: Action) {
        let effects = reduce(&mut self.state, action, &self.config);
        for effect in effects {
            match effect {
                Effect::Cancel(key) => self.cancel(key),
                Effect::Spawn { key, task } => self.spawn(key, task),
            }
        }
    }

    /// Wait for one outstanding task, then fold everything queued.
    /// Returns whether work is still outstanding.
    pub async fn step(&mut self) -> bool {
        self.drain();
        if let Some(Err(e)) = self.tasks.join_next().await {
            if e.is_panic() {
                tracing::error!("Inspector task panicked: {}", e);
            }
        }
        self.drain();
        !self.tasks.is_empty()
    }

    /// Step until no document work is outstanding. Playback ticks are not
    /// waited for.
    pub async fn run_until_idle(&mut self) {
        while self.step().await {}
    }

    /// Wait for the pending playback tick and fold it. Returns false when
    /// no ticker is running.
    pub async fn next_tick(&mut self) -> bool {
        let Some(ticker) = self.ticker.take() else {
            return false;
        };
        let _ = ticker.await;
        self.drain();
        true
    }

    fn drain(&mut self) {
        while let Ok(action) = self.rx.try_recv() {
            self.dispatch(action);
        }
    }

    fn cancel(&mut self, key: CancelKey) {
        if let Some(handle) = self.running.remove(&key) {
            handle.abort();
            tracing::trace!(key = ?key, "Cancelled task");
        }
    }

    fn spawn(&mut self, key: Option<CancelKey>, task: Task) {
        let Some(doc) = self.state.document.clone() else {
            tracing::debug!(task = ?task, "No document open, dropping task");
            return;
        };
        if let Some(key) = key {
            self.cancel(key);
        }

        let tx = self.tx.clone();
        let handle = match task {
            Task::Tick {
                generation,
                interval,
            } => {
                let ticker = tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    let _ = tx.send(Action::Tick { generation });
                });
                let handle = ticker.abort_handle();
                self.ticker = Some(ticker);
                handle
            }
            task => {
                let ctx = self.ctx.clone();
                self.tasks.spawn(async move {
                    let result =
                        tokio::task::spawn_blocking(move || tasks::run(&ctx, &doc, task)).await;
                    match result {
                        Ok(action) => {
                            let _ = tx.send(action);
                        }
                        Err(e) => tracing::error!("Blocking task failed: {}", e),
                    }
                })
            }
        };
        if let Some(key) = key {
            self.running.insert(key, handle);
        }
    }
}
