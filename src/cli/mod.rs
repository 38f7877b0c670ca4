// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stagegraph.

pub mod fields;
pub mod fmt;
pub mod graph;
pub mod owner;
pub mod store;
pub mod validate;
pub mod watch;

mod output;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::convert::{graph_from_descriptor, Conversion};
use crate::descriptor::Descriptor;

/// Pipeline descriptor graph tool
///
/// Inspect, lint and normalize pipeline descriptors.
#[derive(Parser, Debug)]
#[clap(
    name = "stagegraph",
    version,
    about = "Inspect, lint and normalize pipeline descriptors",
    long_about = None,
    after_help = "Examples:\n\
        stagegraph validate pipeline.yaml           Lint a descriptor\n\
        stagegraph graph pipeline.yaml -f mermaid   Render dependencies\n\
        stagegraph fields pipeline.yaml             List operator inputs\n\
        stagegraph store list                       Show stored pipelines\n\n\
        See 'stagegraph <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and lint a descriptor
    Validate {
        /// Descriptor file (YAML or JSON)
        descriptor: PathBuf,
    },

    /// Show stage dependencies as a graph
    Graph {
        /// Descriptor file
        descriptor: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },

    /// Show the environment that owns a stage
    Owner {
        /// Descriptor file
        descriptor: PathBuf,

        /// Stage name
        stage: String,
    },

    /// List the configuration fields an operator must fill in
    Fields {
        /// Descriptor file
        descriptor: PathBuf,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Rewrite a descriptor in normalized form
    Fmt {
        /// Descriptor file
        descriptor: PathBuf,

        /// Write JSON instead of the configured format
        #[clap(long)]
        json: bool,

        /// Output file (default: stdout)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the descriptor store
    Store {
        #[clap(subcommand)]
        action: StoreAction,
    },

    /// Re-validate a descriptor whenever it changes
    Watch {
        /// Descriptor file
        descriptor: PathBuf,

        /// Debounce delay in milliseconds
        #[clap(long, default_value = "500")]
        debounce: u64,
    },
}

/// Store actions
#[derive(Subcommand, Debug, Clone)]
pub enum StoreAction {
    /// List stored pipelines
    List,

    /// Print a stored descriptor
    Get {
        /// Pipeline id
        id: String,
    },

    /// Store a descriptor file under an id
    Put {
        /// Pipeline id
        id: String,

        /// Descriptor file
        file: PathBuf,
    },

    /// Remove a stored descriptor
    Delete {
        /// Pipeline id
        id: String,
    },
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Read and parse a descriptor file
pub(crate) fn load_descriptor(path: &Path) -> Result<Descriptor> {
    if !path.exists() {
        return Err(miette::miette!(
            "Descriptor file not found: {}",
            path.display()
        ));
    }

    Ok(Descriptor::from_file(path)?)
}

/// Read a descriptor file and convert it into a graph
pub(crate) fn load_graph(path: &Path) -> Result<Conversion> {
    let descriptor = load_descriptor(path)?;
    Ok(graph_from_descriptor(descriptor))
}

/// Current working directory as a diagnostic-friendly result
pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().map_err(|e| miette::miette!("Failed to get current directory: {}", e))
}
