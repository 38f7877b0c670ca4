// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Stage categories
//!
//! A stage's `type` is `<category>_<tool>`. The category is computed once
//! here and matched on everywhere else.

use serde::{Deserialize, Serialize};

/// Stage category derived from the `type` prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Environment container (`node_dev`, `node_qa`, `node_prod`)
    #[serde(rename = "node")]
    Environment,
    Plan,
    Code,
    Build,
    Test,
    Deploy,
    Approval,
    Release,
    /// Unrecognised type
    Other,
}

impl Category {
    /// Classify a stage type
    pub fn classify(stage_type: &str) -> Self {
        let prefix = stage_type.split_once('_').map(|(prefix, _)| prefix);

        match prefix {
            Some("node") => Self::Environment,
            Some("plan") => Self::Plan,
            Some("code") => Self::Code,
            Some("build") => Self::Build,
            Some("test") => Self::Test,
            Some("deploy") => Self::Deploy,
            Some("approval") => Self::Approval,
            Some("release") => Self::Release,
            _ if stage_type.contains("approval") => Self::Approval,
            _ => Self::Other,
        }
    }

    /// Type prefix for this category, without the trailing underscore
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Environment => Some("node"),
            Self::Plan => Some("plan"),
            Self::Code => Some("code"),
            Self::Build => Some("build"),
            Self::Test => Some("test"),
            Self::Deploy => Some("deploy"),
            Self::Approval => Some("approval"),
            Self::Release => Some("release"),
            Self::Other => None,
        }
    }

    /// Only these categories are grouped under an owning environment
    pub fn is_attributable(self) -> bool {
        match self {
            Self::Plan | Self::Approval | Self::Release => true,
            Self::Environment
            | Self::Code
            | Self::Build
            | Self::Test
            | Self::Deploy
            | Self::Other => false,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.prefix().unwrap_or("other"))
    }
}

/// Tool part of a stage type (`plan_jira` -> `jira`)
///
/// `None` when the type has no category prefix or nothing follows it.
pub fn tool_name(stage_type: &str) -> Option<&str> {
    let prefix = Category::classify(stage_type).prefix()?;
    stage_type
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .filter(|tool| !tool.is_empty())
}

/// Deployment environment represented by a `node_*` stage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Environment {
    Dev,
    Qa,
    Prod,
    Other(String),
}

impl Environment {
    /// Environment named by an environment stage type
    pub fn from_stage_type(stage_type: &str) -> Self {
        let name = stage_type.strip_prefix("node_").unwrap_or(stage_type);
        match name.to_lowercase().as_str() {
            "dev" => Self::Dev,
            "qa" => Self::Qa,
            "prod" => Self::Prod,
            other => Self::Other(other.to_string()),
        }
    }

    /// Identifier used inside field keys
    pub fn key(&self) -> &str {
        match self {
            Self::Dev => "dev",
            Self::Qa => "qa",
            Self::Prod => "prod",
            Self::Other(name) => name,
        }
    }

    /// Human-facing name used inside field labels
    pub fn display_name(&self) -> String {
        match self {
            Self::Dev => "Dev".into(),
            Self::Qa => "QA".into(),
            Self::Prod => "Prod".into(),
            Self::Other(name) => title_case(name),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Title-case a tool or environment name (`azure_boards` -> `Azure Boards`)
pub fn title_case(name: &str) -> String {
    name.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
