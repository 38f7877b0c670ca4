// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Fields command - list derived configuration fields

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{load_graph, OutputFormat};
use crate::errors::StagegraphError;
use crate::fields::derive_fields;

/// Run the fields command
pub async fn run(descriptor_path: PathBuf, format: OutputFormat, _verbose: bool) -> Result<()> {
    let conversion = load_graph(&descriptor_path)?;
    let fields = derive_fields(&conversion.graph);

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&fields.into_vec())
                .map_err(StagegraphError::from)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if fields.is_empty() {
                println!("{}", "No configuration fields required".dimmed());
                return Ok(());
            }

            let width = fields.iter().map(|f| f.key.len()).max().unwrap_or(0);
            for field in &fields {
                println!(
                    "{:<width$}  {:<8}  {}",
                    field.key,
                    field.field_type.to_string(),
                    field.label,
                    width = width
                );
            }
        }
    }

    Ok(())
}
