// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Watch command - re-validate a descriptor on change

use colored::Colorize;
use miette::Result;
use notify::{RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;

use super::{current_dir, validate};

/// Run the watch command
pub async fn run(descriptor_path: PathBuf, debounce_ms: u64, verbose: bool) -> Result<()> {
    if !descriptor_path.exists() {
        return Err(miette::miette!(
            "Descriptor file not found: {}",
            descriptor_path.display()
        ));
    }

    // Editors often replace the file on save, so watch its directory
    let target = current_dir()?.join(&descriptor_path);
    let directory = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = target.file_name().map(|n| n.to_os_string());

    println!("{}", "Starting watch mode...".bold());
    println!(
        "Watching {} (debounce: {}ms)",
        descriptor_path.display(),
        debounce_ms
    );
    println!("Press {} to exit.", "Ctrl+C".cyan());
    println!();

    let (tx, rx) = channel();

    let mut debouncer = new_debouncer(Duration::from_millis(debounce_ms), tx)
        .map_err(|e| miette::miette!("Failed to create file watcher: {}", e))?;

    debouncer
        .watcher()
        .watch(&directory, RecursiveMode::NonRecursive)
        .map_err(|e| miette::miette!("Failed to start watching: {}", e))?;

    revalidate(&descriptor_path, verbose);

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let changed = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .any(|e| e.path.file_name() == file_name.as_deref());

                if changed {
                    println!();
                    println!("{}", "─".repeat(50).dimmed());
                    println!("{}", "Descriptor changed".yellow());
                    revalidate(&descriptor_path, verbose);
                }
            }
            Ok(Err(e)) => {
                eprintln!("{}: {:?}", "Watch error".red(), e);
            }
            Err(e) => {
                eprintln!("{}: {}", "Channel error".red(), e);
                break;
            }
        }
    }

    Ok(())
}

fn revalidate(descriptor_path: &Path, verbose: bool) {
    match validate::check(descriptor_path, verbose) {
        Ok(true) => println!("{}", "Descriptor is valid".green()),
        Ok(false) => println!("{}", "Descriptor has errors".red()),
        Err(e) => eprintln!("{}: {}", "Failed to load descriptor".red(), e),
    }
}
