// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Descriptor storage
//!
//! Descriptors are stored as text keyed by pipeline id. Two backends:
//! - `MemoryStore`: in-process map, for tests and embedding
//! - `FilesystemStore`: one file per descriptor in a directory
//!
//! Both also accept notification policy snapshots from a
//! [`PolicySaver`](crate::notification::PolicySaver).

mod filesystem;
mod memory;

pub use filesystem::FilesystemStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::convert::{from_descriptor_with_report, to_descriptor, Conversion};
use crate::descriptor::{DescriptorFormat, PipelineMetadata};
use crate::errors::{StagegraphError, StagegraphResult};
use crate::graph::StageGraph;

/// Storage backend for descriptor text
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// Descriptor text stored under `id`, if any
    async fn get(&self, id: &str) -> StagegraphResult<Option<String>>;

    /// Store descriptor text under `id`, replacing any previous value
    async fn put(&self, id: &str, text: &str) -> StagegraphResult<()>;

    /// Remove the descriptor stored under `id`
    async fn delete(&self, id: &str) -> StagegraphResult<()>;

    /// Every stored descriptor, keyed by id
    async fn list_all(&self) -> StagegraphResult<BTreeMap<String, String>>;
}

fn id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]*$").ok())
        .as_ref()
}

/// Check that `id` can be used as a storage key
///
/// Ids are non-empty, use only `[A-Za-z0-9._-]` and do not start with a dot.
pub fn validate_id(id: &str) -> StagegraphResult<()> {
    if id_pattern().is_some_and(|pattern| pattern.is_match(id)) {
        Ok(())
    } else {
        Err(StagegraphError::InvalidDescriptorId { id: id.to_string() })
    }
}

/// Load a stored pipeline into a graph
pub async fn load_pipeline(
    store: &dyn DescriptorStore,
    id: &str,
) -> StagegraphResult<Conversion> {
    let text = store
        .get(id)
        .await?
        .ok_or_else(|| StagegraphError::DescriptorNotFound { id: id.to_string() })?;

    from_descriptor_with_report(&text)
}

/// Serialize a graph and store it under `id`
pub async fn save_pipeline(
    store: &dyn DescriptorStore,
    id: &str,
    graph: &StageGraph,
    metadata: &PipelineMetadata,
    format: DescriptorFormat,
) -> StagegraphResult<()> {
    let text = to_descriptor(graph, metadata).to_text(format)?;
    store.put(id, &text).await
}
