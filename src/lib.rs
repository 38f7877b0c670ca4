// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! # stagegraph - pipeline descriptor graph engine
//!
//! `stagegraph` turns pipeline descriptors into editable stage graphs and
//! back, and answers the questions an editor needs answered about them.
//!
//! ## Features
//!
//! - **Conversion** - descriptor text to a node/edge graph and back
//! - **Environment attribution** - which `node_*` stage owns a stage
//! - **Field derivation** - the inputs an operator fills in before a run
//! - **Notification policies** - per-node settings with debounced saving
//! - **Stores** - in-memory and filesystem descriptor storage
//!
//! ## Quick Start
//!
//! ```bash
//! # Lint a descriptor
//! stagegraph validate pipeline.yaml
//!
//! # List operator inputs
//! stagegraph fields pipeline.yaml --format json
//!
//! # Which environment owns a stage
//! stagegraph owner pipeline.yaml release-image
//! ```

pub mod cli;
pub mod config;
pub mod convert;
pub mod descriptor;
pub mod environment;
pub mod errors;
pub mod fields;
pub mod graph;
pub mod notification;
pub mod store;

// Re-export commonly used types
pub use convert::{from_descriptor, to_descriptor};
pub use descriptor::{Descriptor, PipelineMetadata, Stage};
pub use environment::resolve_owning_environment;
pub use errors::{StagegraphError, StagegraphResult};
pub use fields::{derive_fields, ConfigurationField, FieldSet};
pub use graph::{GraphEdge, GraphNode, NodeId, StageGraph};
pub use notification::{NotificationPolicies, NotificationPolicy, PolicySaver};
pub use store::{DescriptorStore, FilesystemStore, MemoryStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
