// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Filesystem store
//!
//! Layout under the store directory:
//!
//! ```text
//! <dir>/<id>.yaml            descriptor text
//! <dir>/policies/<id>.json   last saved notification policies
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{validate_id, DescriptorStore};
use crate::errors::{StagegraphError, StagegraphResult};
use crate::notification::{NotificationPolicies, PolicySink};

const DESCRIPTOR_EXTENSION: &str = "yaml";
const POLICY_DIR: &str = "policies";

/// Directory-backed descriptor store
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn new(root: impl Into<PathBuf>) -> StagegraphResult<Self> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root).map_err(|e| StagegraphError::Store {
                message: format!("Failed to create store directory {}: {}", root.display(), e),
            })?;
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn descriptor_path(&self, id: &str) -> StagegraphResult<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(format!("{}.{}", id, DESCRIPTOR_EXTENSION)))
    }

    fn policy_path(&self, id: &str) -> StagegraphResult<PathBuf> {
        validate_id(id)?;
        Ok(self.root.join(POLICY_DIR).join(format!("{}.json", id)))
    }

    /// Last policy snapshot saved for a pipeline
    pub async fn load_policies(&self, pipeline_id: &str) -> StagegraphResult<Option<NotificationPolicies>> {
        let path = self.policy_path(pipeline_id)?;
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| StagegraphError::Store {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let policies = serde_json::from_str(&content)?;

        Ok(Some(policies))
    }
}

#[async_trait]
impl DescriptorStore for FilesystemStore {
    async fn get(&self, id: &str) -> StagegraphResult<Option<String>> {
        let path = self.descriptor_path(id)?;
        if !path.exists() {
            return Ok(None);
        }

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| StagegraphError::Store {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;

        Ok(Some(text))
    }

    async fn put(&self, id: &str, text: &str) -> StagegraphResult<()> {
        let path = self.descriptor_path(id)?;

        tokio::fs::write(&path, text).await.map_err(|e| StagegraphError::Store {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;

        tracing::debug!(id, path = %path.display(), "stored descriptor");
        Ok(())
    }

    async fn delete(&self, id: &str) -> StagegraphResult<()> {
        let path = self.descriptor_path(id)?;
        if !path.exists() {
            return Err(StagegraphError::DescriptorNotFound { id: id.to_string() });
        }

        tokio::fs::remove_file(&path).await.map_err(|e| StagegraphError::Store {
            message: format!("Failed to remove {}: {}", path.display(), e),
        })?;

        let policies = self.policy_path(id)?;
        if policies.exists() {
            tokio::fs::remove_file(&policies).await.map_err(|e| StagegraphError::Store {
                message: format!("Failed to remove {}: {}", policies.display(), e),
            })?;
        }

        tracing::debug!(id, "deleted descriptor");
        Ok(())
    }

    async fn list_all(&self) -> StagegraphResult<BTreeMap<String, String>> {
        let mut all = BTreeMap::new();

        let pattern = format!(
            "{}/*.{}",
            glob::Pattern::escape(&self.root.to_string_lossy()),
            DESCRIPTOR_EXTENSION
        );

        let entries = glob::glob(&pattern).map_err(|e| StagegraphError::Store {
            message: format!("Invalid store path {}: {}", self.root.display(), e),
        })?;

        for entry in entries {
            let path = entry.map_err(|e| StagegraphError::Store {
                message: format!("Failed to read store entry: {}", e),
            })?;

            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_id(id).is_err() {
                tracing::debug!(path = %path.display(), "skipping file with invalid id");
                continue;
            }

            let text = tokio::fs::read_to_string(&path).await.map_err(|e| StagegraphError::Store {
                message: format!("Failed to read {}: {}", path.display(), e),
            })?;
            all.insert(id.to_string(), text);
        }

        Ok(all)
    }
}

#[async_trait]
impl PolicySink for FilesystemStore {
    async fn save_policies(
        &self,
        pipeline_id: &str,
        policies: &NotificationPolicies,
    ) -> StagegraphResult<()> {
        let path = self.policy_path(pipeline_id)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| StagegraphError::Store {
                message: format!("Failed to create {}: {}", parent.display(), e),
            })?;
        }

        let json = serde_json::to_string_pretty(policies)?;
        tokio::fs::write(&path, json).await.map_err(|e| StagegraphError::Store {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;

        tracing::debug!(pipeline = pipeline_id, policies = policies.len(), "wrote policy snapshot");
        Ok(())
    }
}
