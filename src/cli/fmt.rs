// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Fmt command - rewrite a descriptor through the graph model
//!
//! Missing positions are filled in, unresolved dependencies dropped and
//! timestamps refreshed.

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{current_dir, load_graph};
use crate::config::Config;
use crate::convert::to_descriptor;
use crate::descriptor::DescriptorFormat;

/// Run the fmt command
pub async fn run(
    descriptor_path: PathBuf,
    json: bool,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = Config::discover(&current_dir()?)?;
    let format = if json {
        DescriptorFormat::Json
    } else {
        config.output.format
    };

    // Dropped dependencies are logged by the conversion
    let conversion = load_graph(&descriptor_path)?;

    let text = to_descriptor(&conversion.graph, &conversion.metadata).to_text(format)?;

    match output {
        Some(path) => {
            std::fs::write(&path, text).map_err(|e| {
                miette::miette!("Failed to write '{}': {}", path.display(), e)
            })?;
            if verbose {
                println!("{} {}", "Wrote".green(), path.display());
            }
        }
        None => print!("{}", text),
    }

    Ok(())
}
