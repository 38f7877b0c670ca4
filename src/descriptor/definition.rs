// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Descriptor structures
//!
//! Defines the schema of serialized pipeline descriptors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use super::ConfigMap;
use crate::errors::{StagegraphError, StagegraphResult};

/// `apiVersion` written on every descriptor we produce
pub const API_VERSION: &str = "stagegraph.io/v1";

/// The only accepted `kind`
pub const PIPELINE_KIND: &str = "Pipeline";

/// Serialized pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Schema version (informational)
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Must be "Pipeline"
    pub kind: String,

    /// Pipeline metadata
    pub metadata: PipelineMetadata,

    /// Stages and pipeline-level settings
    #[serde(default)]
    pub spec: PipelineSpec,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

impl Descriptor {
    /// Create an empty pipeline descriptor
    pub fn new(metadata: PipelineMetadata) -> Self {
        Self {
            api_version: default_api_version(),
            kind: PIPELINE_KIND.to_string(),
            metadata,
            spec: PipelineSpec::default(),
        }
    }

    /// Load a descriptor from a YAML or JSON file
    pub fn from_file(path: &Path) -> StagegraphResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse descriptor text (YAML, or JSON through the YAML reader)
    ///
    /// Fails with a format error when the text does not parse or the
    /// document is not a pipeline.
    pub fn parse(text: &str) -> StagegraphResult<Self> {
        let descriptor: Descriptor =
            serde_yaml::from_str(text).map_err(StagegraphError::unparseable)?;

        if descriptor.kind != PIPELINE_KIND {
            return Err(StagegraphError::unsupported_kind(&descriptor.kind));
        }

        Ok(descriptor)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> StagegraphResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> StagegraphResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize in the requested text format
    pub fn to_text(&self, format: DescriptorFormat) -> StagegraphResult<String> {
        match format {
            DescriptorFormat::Yaml => self.to_yaml(),
            DescriptorFormat::Json => self.to_json(),
        }
    }

    /// Get a stage by name
    pub fn get_stage(&self, name: &str) -> Option<&Stage> {
        self.spec.stages.iter().find(|s| s.name == name)
    }

    /// Get all stage names, in descriptor order
    pub fn stage_names(&self) -> Vec<&str> {
        self.spec.stages.iter().map(|s| s.name.as_str()).collect()
    }
}

impl std::str::FromStr for Descriptor {
    type Err = StagegraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Text format of a descriptor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorFormat {
    #[default]
    Yaml,
    Json,
}

impl std::str::FromStr for DescriptorFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yaml" | "yml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown descriptor format: {}", s)),
        }
    }
}

/// Pipeline metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetadata {
    /// Pipeline name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owning enterprise record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enterprise: Option<String>,

    /// Owning product or service record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,

    #[serde(default)]
    pub deployment_type: DeploymentType,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,

    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl PipelineMetadata {
    /// Metadata with defaults for everything but the name
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: None,
            enterprise: None,
            entity: None,
            deployment_type: DeploymentType::default(),
            created_at: now,
            updated_at: now,
            version: default_version(),
        }
    }
}

/// How the pipeline is deployed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentType {
    #[default]
    Integration,
    Extension,
}

/// Stages plus pipeline-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Stages, order-significant
    #[serde(default)]
    pub stages: Vec<Stage>,

    /// Pipeline variables
    #[serde(default, deserialize_with = "null_as_default")]
    pub variables: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<PipelineNotifications>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggers: Option<BTreeMap<String, TriggerFlag>>,
}

/// Pipeline-level notification recipients
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineNotifications {
    #[serde(default)]
    pub email: Vec<String>,

    #[serde(default)]
    pub slack: Vec<String>,
}

/// A trigger setting: either a switch or a value such as a cron expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggerFlag {
    Bool(bool),
    Text(String),
}

/// Read an explicit `null` as the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Stage name (must be unique within pipeline)
    pub name: String,

    /// Category-qualified type, e.g. `plan_jira`
    #[serde(rename = "type")]
    pub stage_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Names of the stages this one depends on
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub depends_on: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub config: ConfigMap,

    /// Canvas coordinate hint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<StageNotifications>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl Stage {
    /// A stage with only a name and type
    pub fn new(name: impl Into<String>, stage_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stage_type: stage_type.into(),
            description: None,
            depends_on: Vec::new(),
            config: ConfigMap::new(),
            position: None,
            notifications: None,
            status: None,
            duration: None,
        }
    }

    /// Builder-style dependency list
    pub fn depending_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }
}

/// 2D canvas coordinate
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Serialized per-stage notification channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageNotifications {
    #[serde(default)]
    pub email: bool,

    #[serde(default)]
    pub slack: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINEAR: &str = r#"
apiVersion: stagegraph.io/v1
kind: Pipeline
metadata:
  name: web-app
  deploymentType: Extension
  createdAt: 2025-01-01T00:00:00Z
  updatedAt: 2025-01-02T00:00:00Z
  version: "2.1.0"
spec:
  stages:
    - name: source-code
      type: code_github
      config:
        repository: acme/web
    - name: build-application
      type: build_maven
      dependsOn: [source-code]
      position: { x: 10, y: 20 }
      notifications: { email: true, slack: false }
  variables:
    REGION: eu-west-1
  triggers:
    manual: true
    schedule: "0 2 * * *"
"#;

    #[test]
    fn test_parse_descriptor() {
        let descriptor = Descriptor::parse(LINEAR).unwrap();

        assert_eq!(descriptor.metadata.name, "web-app");
        assert_eq!(descriptor.metadata.deployment_type, DeploymentType::Extension);
        assert_eq!(descriptor.metadata.version, "2.1.0");
        assert_eq!(descriptor.stage_names(), vec!["source-code", "build-application"]);

        let build = descriptor.get_stage("build-application").unwrap();
        assert_eq!(build.stage_type, "build_maven");
        assert_eq!(build.depends_on, vec!["source-code"]);
        assert_eq!(build.position, Some(Position::new(10.0, 20.0)));
        assert_eq!(
            build.notifications,
            Some(StageNotifications { email: true, slack: false })
        );

        let triggers = descriptor.spec.triggers.as_ref().unwrap();
        assert_eq!(triggers["manual"], TriggerFlag::Bool(true));
        assert_eq!(triggers["schedule"], TriggerFlag::Text("0 2 * * *".into()));
        assert_eq!(descriptor.spec.variables["REGION"], "eu-west-1");
    }

    #[test]
    fn test_parse_json_descriptor() {
        let json = r#"{
            "apiVersion": "stagegraph.io/v1",
            "kind": "Pipeline",
            "metadata": { "name": "json-pipeline" },
            "spec": { "stages": [ { "name": "plan", "type": "plan_jira" } ] }
        }"#;

        let descriptor = Descriptor::parse(json).unwrap();
        assert_eq!(descriptor.metadata.name, "json-pipeline");
        assert_eq!(descriptor.metadata.deployment_type, DeploymentType::Integration);
        assert_eq!(descriptor.spec.stages[0].stage_type, "plan_jira");
    }

    #[test]
    fn test_reject_wrong_kind() {
        let yaml = "kind: Deployment\nmetadata:\n  name: x\n";
        let err = Descriptor::parse(yaml).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_reject_unparseable_text() {
        let err = Descriptor::parse("kind: [unterminated").unwrap_err();
        assert!(err.is_format());

        let err = Descriptor::parse("kind: Pipeline\n").unwrap_err();
        assert!(err.is_format(), "missing metadata must be a format error");
    }

    #[test]
    fn test_null_lists_and_maps_read_as_empty() {
        let yaml = r#"
kind: Pipeline
metadata: { name: nulls }
spec:
  stages:
    - name: a
      type: build_make
      dependsOn: null
      config: null
    - name: b
      type: test_unit
      dependsOn: ~
  variables: null
"#;

        let descriptor = Descriptor::parse(yaml).unwrap();
        for stage in &descriptor.spec.stages {
            assert!(stage.depends_on.is_empty());
            assert!(stage.config.is_empty());
        }
        assert!(descriptor.spec.variables.is_empty());

        let json = r#"{"kind":"Pipeline","metadata":{"name":"n"},
            "spec":{"stages":[{"name":"a","type":"build_make","dependsOn":null,"config":null}]}}"#;
        let descriptor = Descriptor::parse(json).unwrap();
        assert!(descriptor.spec.stages[0].depends_on.is_empty());
    }

    #[test]
    fn test_round_trip_yaml() {
        let descriptor = Descriptor::parse(LINEAR).unwrap();
        let yaml = descriptor.to_yaml().unwrap();
        let parsed = Descriptor::parse(&yaml).unwrap();

        assert_eq!(parsed, descriptor);
    }

    #[test]
    fn test_serialized_keys_are_camel_case() {
        let descriptor = Descriptor::parse(LINEAR).unwrap();
        let json = descriptor.to_json().unwrap();

        assert!(json.contains("\"apiVersion\""));
        assert!(json.contains("\"dependsOn\""));
        assert!(json.contains("\"deploymentType\": \"Extension\""));
        assert!(json.contains("\"type\": \"build_maven\""));
        assert!(!json.contains("\"description\""));
    }
}
