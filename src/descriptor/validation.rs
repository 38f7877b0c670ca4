// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Descriptor validation
//!
//! Lints a parsed descriptor before it is loaded into an editor or stored.
//! Conversion itself is tolerant, so everything here is advisory.

use std::collections::HashSet;

use super::{Descriptor, Stage, PIPELINE_KIND};
use crate::convert::{graph_from_descriptor, SkipReason};
use crate::errors::StagegraphError;
use crate::graph::category::tool_name;
use crate::graph::{Category, DependencyGraph};

/// Descriptor validator
pub struct DescriptorValidator;

impl DescriptorValidator {
    /// Validate a descriptor
    pub fn validate(descriptor: &Descriptor) -> ValidationResult {
        let mut result = ValidationResult::new();

        if descriptor.kind != PIPELINE_KIND {
            result.add_error(&format!(
                "Unsupported kind '{}', expected '{}'",
                descriptor.kind, PIPELINE_KIND
            ));
        }

        if descriptor.metadata.name.trim().is_empty() {
            result.add_warning("Pipeline has no name");
        }

        if descriptor.spec.stages.is_empty() {
            result.add_warning("Pipeline has no stages defined");
            return result;
        }

        let mut seen_names = HashSet::new();
        for stage in &descriptor.spec.stages {
            if !stage.name.is_empty() && !seen_names.insert(stage.name.as_str()) {
                result.add_error(&format!("Duplicate stage name: '{}'", stage.name));
            }
        }

        for (index, stage) in descriptor.spec.stages.iter().enumerate() {
            Self::validate_stage(index, stage, &mut result);
        }

        let conversion = graph_from_descriptor(descriptor.clone());
        for skipped in &conversion.skipped {
            match skipped.reason {
                SkipReason::Unresolved => result.add_warning(&format!(
                    "Stage '{}' depends on unknown stage '{}'; the dependency will be dropped",
                    skipped.stage, skipped.dependency
                )),
                SkipReason::SelfReference => result.add_warning(&format!(
                    "Stage '{}' depends on itself; the dependency will be dropped",
                    skipped.stage
                )),
            }
        }

        match DependencyGraph::build(&conversion.graph).topological_order() {
            Ok(_) => {}
            Err(StagegraphError::CircularDependency { stages }) => {
                result.add_error(&format!("Circular dependency: {}", stages.join(" -> ")));
            }
            Err(e) => result.add_error(&format!("Dependency analysis failed: {}", e)),
        }

        result
    }

    fn validate_stage(index: usize, stage: &Stage, result: &mut ValidationResult) {
        if stage.name.trim().is_empty() {
            result.add_error(&format!("Stage #{} has an empty name", index + 1));
        }

        let name = if stage.name.is_empty() {
            format!("#{}", index + 1)
        } else {
            format!("'{}'", stage.name)
        };

        if stage.stage_type.trim().is_empty() {
            result.add_error(&format!("Stage {}: type is empty", name));
            return;
        }

        match Category::classify(&stage.stage_type) {
            Category::Other => result.add_warning(&format!(
                "Stage {}: type '{}' has no known category prefix",
                name, stage.stage_type
            )),
            Category::Plan | Category::Release
                if tool_name(&stage.stage_type).is_none() =>
            {
                result.add_warning(&format!(
                    "Stage {}: type '{}' names no tool, no configuration field will be derived",
                    name, stage.stage_type
                ));
            }
            _ => {}
        }
    }
}

/// Result of descriptor validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
