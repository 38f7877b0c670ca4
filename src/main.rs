// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! stagegraph - pipeline descriptor graph tool

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagegraph::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "stagegraph=debug"
    } else {
        "stagegraph=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Validate { descriptor } => {
            stagegraph::cli::validate::run(descriptor, cli.verbose).await
        }
        Commands::Graph { descriptor, format } => {
            stagegraph::cli::graph::run(descriptor, format, cli.verbose).await
        }
        Commands::Owner { descriptor, stage } => {
            stagegraph::cli::owner::run(descriptor, stage, cli.verbose).await
        }
        Commands::Fields { descriptor, format } => {
            stagegraph::cli::fields::run(descriptor, format, cli.verbose).await
        }
        Commands::Fmt {
            descriptor,
            json,
            output,
        } => stagegraph::cli::fmt::run(descriptor, json, output, cli.verbose).await,
        Commands::Store { action } => stagegraph::cli::store::run(action, cli.verbose).await,
        Commands::Watch {
            descriptor,
            debounce,
        } => stagegraph::cli::watch::run(descriptor, debounce, cli.verbose).await,
    }
}
