// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Owner command - find a stage's owning environment

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::load_graph;
use crate::environment::resolve_owning_environment;
use crate::errors::StagegraphError;
use crate::graph::Environment;

/// Run the owner command
pub async fn run(descriptor_path: PathBuf, stage: String, verbose: bool) -> Result<()> {
    let conversion = load_graph(&descriptor_path)?;
    let graph = &conversion.graph;

    let node = graph
        .node_by_label(&stage)
        .ok_or(StagegraphError::StageNotFound { stage: stage.clone() })?;

    match resolve_owning_environment(graph, &node.id) {
        Some(owner) => {
            let environment = Environment::from_stage_type(&owner.stage_type);
            println!("{}", owner.label);
            if verbose {
                println!(
                    "  {} {} ({})",
                    "environment:".dimmed(),
                    environment.display_name(),
                    owner.stage_type
                );
                println!("  {} {}", "node:".dimmed(), owner.id);
            }
        }
        None => {
            println!("{}", "No owning environment".yellow());
        }
    }

    Ok(())
}
