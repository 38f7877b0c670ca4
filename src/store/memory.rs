// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! In-memory store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{validate_id, DescriptorStore};
use crate::errors::{StagegraphError, StagegraphResult};
use crate::notification::{NotificationPolicies, PolicySink};

/// Descriptor and policy storage held in process memory
#[derive(Default)]
pub struct MemoryStore {
    descriptors: RwLock<BTreeMap<String, String>>,
    policies: RwLock<HashMap<String, NotificationPolicies>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last policy snapshot saved for a pipeline
    pub async fn policies(&self, pipeline_id: &str) -> Option<NotificationPolicies> {
        self.policies.read().await.get(pipeline_id).cloned()
    }
}

#[async_trait]
impl DescriptorStore for MemoryStore {
    async fn get(&self, id: &str) -> StagegraphResult<Option<String>> {
        Ok(self.descriptors.read().await.get(id).cloned())
    }

    async fn put(&self, id: &str, text: &str) -> StagegraphResult<()> {
        validate_id(id)?;
        self.descriptors
            .write()
            .await
            .insert(id.to_string(), text.to_string());
        tracing::debug!(id, bytes = text.len(), "stored descriptor in memory");
        Ok(())
    }

    async fn delete(&self, id: &str) -> StagegraphResult<()> {
        match self.descriptors.write().await.remove(id) {
            Some(_) => {
                self.policies.write().await.remove(id);
                Ok(())
            }
            None => Err(StagegraphError::DescriptorNotFound { id: id.to_string() }),
        }
    }

    async fn list_all(&self) -> StagegraphResult<BTreeMap<String, String>> {
        Ok(self.descriptors.read().await.clone())
    }
}

#[async_trait]
impl PolicySink for MemoryStore {
    async fn save_policies(
        &self,
        pipeline_id: &str,
        policies: &NotificationPolicies,
    ) -> StagegraphResult<()> {
        validate_id(pipeline_id)?;
        self.policies
            .write()
            .await
            .insert(pipeline_id.to_string(), policies.clone());
        Ok(())
    }
}
