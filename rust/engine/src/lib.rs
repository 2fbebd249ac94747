// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # USDA-Lite Engine
//!
//! The inspection state machine. A pure reducer folds [`Action`]s into an
//! [`InspectorState`] and asks for [`Effect`]s; the async [`Inspector`]
//! runs those effects against a document backend and feeds completions
//! back in.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use usda_lite_engine::{Action, EngineConfig, Inspector};
//! use usda_lite_processing::DocumentRef;
//!
//! # async fn demo() {
//! let mut inspector = Inspector::with_files(EngineConfig::from_env());
//! inspector.dispatch(Action::OpenDocument(DocumentRef::new("Scene.usda")));
//! inspector.run_until_idle().await;
//! inspector.dispatch(Action::SelectPrim(Some("/Root".into())));
//! inspector.run_until_idle().await;
//! println!("{}", inspector.state().to_json().unwrap());
//! # }
//! ```

pub mod action;
pub mod config;
pub mod effect;
pub mod error;
pub mod playback;
pub mod reduce;
pub mod runtime;
pub mod state;
pub mod store;
pub mod tasks;

pub use action::{Action, LayerSnapshot, SectionData, WriteKind, WriteOp};
pub use config::EngineConfig;
pub use effect::{CancelKey, Effect, Task};
pub use error::{EngineError, Result};
pub use playback::{is_looping_mode, Advance, PlaybackState, Timeline};
pub use reduce::reduce;
pub use runtime::Inspector;
pub use state::{
    BindingState, GroupMembers, InspectorState, LayerState, LayerStatus, LoadSection,
    LoadedComponent, SelectionState,
};
pub use store::{file_store, FileStageSource};
pub use tasks::TaskContext;
