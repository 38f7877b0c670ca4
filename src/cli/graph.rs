// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Graph command - render stage dependencies

use miette::Result;
use std::path::PathBuf;

use super::{load_graph, GraphFormat};
use crate::graph::DependencyGraph;

/// Run the graph command
pub async fn run(descriptor_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    let conversion = load_graph(&descriptor_path)?;
    let dag = DependencyGraph::build(&conversion.graph);

    let output = match format {
        GraphFormat::Text => dag.to_text(),
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
