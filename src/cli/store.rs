// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Store command - manage the configured descriptor store

use colored::Colorize;
use miette::Result;

use super::{current_dir, output, StoreAction};
use crate::config::Config;
use crate::descriptor::Descriptor;
use crate::errors::StagegraphError;
use crate::store::{DescriptorStore, FilesystemStore};

/// Run a store action
pub async fn run(action: StoreAction, verbose: bool) -> Result<()> {
    let root = current_dir()?;
    let config = Config::discover(&root)?;
    let store = FilesystemStore::new(config.store_directory(&root))?;

    if verbose {
        eprintln!("{} {}", "Store:".dimmed(), store.root().display());
    }

    match action {
        StoreAction::List => {
            let all = store.list_all().await?;
            if all.is_empty() {
                println!("{}", "No stored pipelines".dimmed());
                return Ok(());
            }

            for (id, text) in &all {
                match Descriptor::parse(text) {
                    Ok(descriptor) => println!(
                        "{}  {} ({} stages)",
                        id.bold(),
                        descriptor.metadata.name,
                        descriptor.spec.stages.len()
                    ),
                    Err(e) => println!("{}  {}", id.bold(), format!("unreadable: {}", e).red()),
                }
            }
        }

        StoreAction::Get { id } => {
            let text = store
                .get(&id)
                .await?
                .ok_or_else(|| StagegraphError::DescriptorNotFound { id: id.clone() })?;
            print!("{}", text);
        }

        StoreAction::Put { id, file } => {
            let text = std::fs::read_to_string(&file)
                .map_err(|e| miette::miette!("Failed to read '{}': {}", file.display(), e))?;
            let descriptor = Descriptor::parse(&text)?;

            store.put(&id, &text).await?;
            output::ok(&format!(
                "Stored '{}' as {}",
                descriptor.metadata.name,
                id.bold()
            ));
        }

        StoreAction::Delete { id } => {
            store.delete(&id).await?;
            output::ok(&format!("Deleted {}", id.bold()));
        }
    }

    Ok(())
}
