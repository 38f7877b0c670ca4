// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Validate command - lint a descriptor

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::{load_descriptor, output};
use crate::convert::graph_from_descriptor;
use crate::descriptor::DescriptorValidator;
use crate::environment::resolve_owning_environment;

/// Run the validate command
pub async fn run(descriptor_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating descriptor...".bold());

    if check(&descriptor_path, verbose)? {
        println!();
        println!("{}", "Descriptor is valid!".green().bold());
        Ok(())
    } else {
        Err(miette::miette!("Descriptor validation failed"))
    }
}

/// Parse and lint a descriptor, printing a report
///
/// Returns whether the descriptor has no errors. Parse failures are
/// returned as errors.
pub(crate) fn check(descriptor_path: &Path, verbose: bool) -> Result<bool> {
    let descriptor = match load_descriptor(descriptor_path) {
        Ok(d) => d,
        Err(e) => {
            output::failed("Failed to parse descriptor");
            return Err(e);
        }
    };

    println!();
    output::ok(&format!(
        "Parsed '{}' ({} stages)",
        descriptor.metadata.name,
        descriptor.spec.stages.len()
    ));

    let validation = DescriptorValidator::validate(&descriptor);

    if !validation.errors.is_empty() {
        output::section("Errors");
        for error in &validation.errors {
            output::failed(error);
        }
    }

    if validation.has_warnings() {
        output::section("Warnings");
        for warning in &validation.warnings {
            output::warn(warning);
        }
    }

    if verbose {
        let conversion = graph_from_descriptor(descriptor.clone());
        let graph = &conversion.graph;

        output::section("Pipeline summary");
        output::field("Name", &descriptor.metadata.name);
        output::field("Version", &descriptor.metadata.version);
        output::field("Stages", graph.node_count());
        output::field("Dependencies", graph.edge_count());

        for node in graph.nodes() {
            let owner = resolve_owning_environment(graph, &node.id)
                .map(|env| format!(" [env: {}]", env.label))
                .unwrap_or_default();
            println!(
                "    - {} ({}){}",
                node.label,
                node.stage_type,
                owner.dimmed()
            );
        }
    }

    Ok(validation.is_valid())
}
