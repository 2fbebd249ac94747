// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `usda-inspect` - open a scene file, drive the inspector, print JSON.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use usda_lite_engine::{Action, EngineConfig, EngineError, Inspector};
use usda_lite_processing::{DocumentRef, ParameterValue};

#[derive(Parser)]
#[command(name = "usda-inspect")]
#[command(about = "Inspect and edit USDA scene files")]
struct Cli {
    /// Scene file to open
    file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Layer metadata and prim tree
    Tree,
    /// Everything loaded for one prim
    Prim { path: String },
    /// Set a component parameter; the value is JSON or plain text
    Set {
        prim: String,
        component: String,
        identifier: String,
        parameter: String,
        value: String,
    },
    /// Add a component to a prim
    AddComponent { prim: String, identifier: String },
    /// Prims whose mesh-sorting group targets a path
    Group { path: String },
}

fn parse_value(raw: &str) -> ParameterValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|v| ParameterValue::from_json(&v))
        .unwrap_or_else(|| ParameterValue::Text(raw.to_string()))
}

async fn select(inspector: &mut Inspector, path: &str) {
    inspector.dispatch(Action::SelectPrim(Some(path.to_string())));
    inspector.run_until_idle().await;
}

#[tokio::main]
async fn main() -> Result<(), EngineError> {
    let config = EngineConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.clone())
        .pretty()
        .init();

    let cli = Cli::parse();
    let doc = DocumentRef::new(&cli.file);
    tracing::info!(doc = %doc, "Opening scene");
    let mut inspector = Inspector::with_files(config);

    inspector.dispatch(Action::OpenDocument(doc.clone()));
    inspector.run_until_idle().await;
    if let Some(error) = &inspector.state().layer.error {
        return Err(EngineError::Layer(error.clone()));
    }

    let output = match cli.command {
        Command::Tree => serde_json::to_string_pretty(&inspector.state().layer)?,
        Command::Prim { path } => {
            select(&mut inspector, &path).await;
            serde_json::to_string_pretty(&inspector.state().selection)?
        }
        Command::Set {
            prim,
            component,
            identifier,
            parameter,
            value,
        } => {
            select(&mut inspector, &prim).await;
            inspector.dispatch(Action::SetComponentParameter {
                component_path: component.clone(),
                identifier,
                parameter,
                value: parse_value(&value),
            });
            inspector.run_until_idle().await;
            let selection = &inspector.state().selection;
            if let Some(error) = selection.write_errors.get(&component) {
                return Err(EngineError::Write(error.clone()));
            }
            serde_json::to_string_pretty(&selection.component(&component))?
        }
        Command::AddComponent { prim, identifier } => {
            select(&mut inspector, &prim).await;
            inspector.dispatch(Action::AddComponent(identifier));
            inspector.run_until_idle().await;
            if let Some(error) = inspector.state().selection.write_errors.get(&prim) {
                return Err(EngineError::Write(error.clone()));
            }
            serde_json::to_string_pretty(&inspector.state().selection.components)?
        }
        Command::Group { path } => {
            inspector.dispatch(Action::ScanGroupMembers(path));
            inspector.run_until_idle().await;
            serde_json::to_string_pretty(&inspector.state().group_members)?
        }
    };
    println!("{}", output);
    Ok(())
}
