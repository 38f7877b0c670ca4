// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Error types
//!
//! Every fallible operation in stagegraph returns a [`StagegraphError`],
//! which doubles as a `miette` diagnostic for the CLI.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stagegraph operations
pub type StagegraphResult<T> = Result<T, StagegraphError>;

/// Main error type for stagegraph
#[derive(Error, Debug, Diagnostic)]
pub enum StagegraphError {
    // ─────────────────────────────────────────────────────────────────────────
    // Descriptor Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid pipeline descriptor: {reason}")]
    #[diagnostic(code(stagegraph::format))]
    Format {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Node '{id}' does not exist in the graph")]
    #[diagnostic(code(stagegraph::unknown_node))]
    UnknownNode { id: String },

    #[error("Node '{id}' already exists in the graph")]
    #[diagnostic(
        code(stagegraph::duplicate_node),
        help("Use StageGraph::next_node_id to allocate a free id")
    )]
    DuplicateNode { id: String },

    #[error("Node '{id}' cannot depend on itself")]
    #[diagnostic(code(stagegraph::self_dependency))]
    SelfDependency { id: String },

    #[error("Circular dependency detected: {}", stages.join(" -> "))]
    #[diagnostic(
        code(stagegraph::circular_dependency),
        help("Review your stage dependencies to remove the cycle")
    )]
    CircularDependency { stages: Vec<String> },

    #[error("Stage '{stage}' not found in pipeline")]
    #[diagnostic(code(stagegraph::stage_not_found))]
    StageNotFound { stage: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Store Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline '{id}' not found in store")]
    #[diagnostic(
        code(stagegraph::descriptor_not_found),
        help("Run 'stagegraph store list' to see stored pipelines")
    )]
    DescriptorNotFound { id: String },

    #[error("Invalid pipeline id '{id}'")]
    #[diagnostic(
        code(stagegraph::invalid_descriptor_id),
        help("Ids may contain letters, digits, '.', '_' and '-', and must not start with '.'")
    )]
    InvalidDescriptorId { id: String },

    #[error("Store error: {message}")]
    #[diagnostic(code(stagegraph::store_error))]
    Store { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Invalid configuration in '{path}': {message}")]
    #[diagnostic(code(stagegraph::config_error))]
    Config { path: PathBuf, message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stagegraph::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(stagegraph::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(stagegraph::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(stagegraph::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for StagegraphError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StagegraphError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StagegraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for StagegraphError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl StagegraphError {
    /// Descriptor text could not be parsed
    pub fn unparseable(error: impl std::fmt::Display) -> Self {
        Self::Format {
            reason: error.to_string(),
            help: Some("Descriptors are YAML or JSON documents with apiVersion, kind, metadata and spec".into()),
        }
    }

    /// Descriptor parsed but is not a pipeline
    pub fn unsupported_kind(kind: &str) -> Self {
        Self::Format {
            reason: format!("expected kind 'Pipeline', found '{}'", kind),
            help: Some("Set 'kind: Pipeline' at the top level of the descriptor".into()),
        }
    }

    /// Whether this error is a descriptor format error
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
