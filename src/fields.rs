// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Operator configuration fields
//!
//! Plan, approval and release stages need input from whoever launches the
//! pipeline: a ticket reference, an approver, a release identifier. The
//! fields are derived from the graph on every call; only their keys are
//! stable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::environment::group_by_environment;
use crate::graph::category::{title_case, tool_name};
use crate::graph::{Category, StageGraph};

/// Kind of input a field asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Plan,
    Approval,
    Release,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::Approval => write!(f, "approval"),
            Self::Release => write!(f, "release"),
        }
    }
}

/// One operator input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Environment the field belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

/// Caller-owned `field key -> entered value` map
pub type FieldValues = BTreeMap<String, String>;

/// Ordered set of derived fields with unique keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<ConfigurationField>,
}

impl FieldSet {
    pub fn iter(&self) -> std::slice::Iter<'_, ConfigurationField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigurationField> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn into_vec(self) -> Vec<ConfigurationField> {
        self.fields
    }

    /// Every key mapped to an empty value
    pub fn initial_values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), String::new()))
            .collect()
    }

    /// Values for this field set, keeping whatever was already entered for
    /// keys that still exist
    pub fn reconcile(&self, previous: &FieldValues) -> FieldValues {
        self.fields
            .iter()
            .map(|f| {
                let value = previous.get(&f.key).cloned().unwrap_or_default();
                (f.key.clone(), value)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a FieldSet {
    type Item = &'a ConfigurationField;
    type IntoIter = std::slice::Iter<'a, ConfigurationField>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

/// Derive the operator fields a graph requires
///
/// Plan fields are emitted once per tool across the whole pipeline.
/// Approval fields are emitted once per environment. Release fields are
/// emitted once per environment and tool. Stages without an owning
/// environment contribute nothing.
pub fn derive_fields(graph: &StageGraph) -> FieldSet {
    let mut fields = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for group in group_by_environment(graph) {
        let env_key = group.environment.key().to_string();
        let env_name = group.environment.display_name();

        for stage in &group.stages {
            let field = match stage.category() {
                Category::Plan => {
                    let Some(tool) = tool_name(&stage.stage_type) else {
                        continue;
                    };
                    let display = title_case(tool);
                    ConfigurationField {
                        key: format!("plan_{}", tool),
                        label: format!("{}#", display),
                        field_type: FieldType::Plan,
                        node_name: None,
                        tool_name: Some(display),
                    }
                }
                Category::Approval => ConfigurationField {
                    key: format!("approval_{}", env_key),
                    label: format!("{} Sign off(Approver)", env_name),
                    field_type: FieldType::Approval,
                    node_name: Some(env_name.clone()),
                    tool_name: None,
                },
                Category::Release => {
                    let Some(tool) = tool_name(&stage.stage_type) else {
                        continue;
                    };
                    let display = title_case(tool);
                    ConfigurationField {
                        key: format!("release_{}_{}", env_key, tool),
                        label: format!("{} {}#", env_name, display),
                        field_type: FieldType::Release,
                        node_name: Some(env_name.clone()),
                        tool_name: Some(display),
                    }
                }
                Category::Environment
                | Category::Code
                | Category::Build
                | Category::Test
                | Category::Deploy
                | Category::Other => continue,
            };

            // Keys carry the dedup scope: plan keys are global, approval keys
            // per environment, release keys per environment and tool.
            if seen.insert(field.key.clone()) {
                fields.push(field);
            }
        }
    }

    FieldSet { fields }
}
