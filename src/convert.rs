// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Descriptor <-> graph conversion
//!
//! Descriptors key stages by name and express dependencies as name lists;
//! graphs key nodes by positional id and express dependencies as edges.
//! Node ids are regenerated on every parse, so a round trip preserves
//! dependencies by label, not by id.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::descriptor::{
    Descriptor, PipelineMetadata, PipelineSpec, Position, Stage, API_VERSION, PIPELINE_KIND,
};
use crate::errors::StagegraphResult;
use crate::graph::{GraphNode, NodeId, PipelineSettings, StageGraph};
use crate::notification::{Channels, NotificationPolicy};

/// X coordinate of the first stage when a descriptor carries no positions
pub const LAYOUT_ORIGIN_X: f64 = 300.0;
/// Horizontal distance between consecutive stages in the fallback layout
pub const LAYOUT_SPACING_X: f64 = 250.0;
/// Row of the fallback layout
pub const LAYOUT_ROW_Y: f64 = 100.0;

/// Fallback canvas position of the stage at `index`
pub fn default_position(index: usize) -> Position {
    Position::new(LAYOUT_ORIGIN_X + LAYOUT_SPACING_X * index as f64, LAYOUT_ROW_Y)
}

/// Why a `dependsOn` entry produced no edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No stage has that name
    Unresolved,
    /// A stage named itself
    SelfReference,
}

/// A `dependsOn` entry that was dropped during conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDependency {
    pub stage: String,
    pub dependency: String,
    pub reason: SkipReason,
}

/// Result of converting a descriptor into a graph
#[derive(Debug, Clone)]
pub struct Conversion {
    pub graph: StageGraph,
    pub metadata: PipelineMetadata,
    pub skipped: Vec<SkippedDependency>,
}

/// Stage name written for a node
fn stage_name(node: &GraphNode) -> String {
    if node.label.is_empty() {
        format!("stage-{}", node.id)
    } else {
        node.label.clone()
    }
}

/// Build a descriptor from a graph, stamping the current time
pub fn to_descriptor(graph: &StageGraph, metadata: &PipelineMetadata) -> Descriptor {
    to_descriptor_at(graph, metadata, Utc::now())
}

/// Build a descriptor from a graph with explicit timestamps
///
/// Only the success branch's channels of a node's notification policy are
/// written; the rest of the policy has no serialized form.
pub fn to_descriptor_at(
    graph: &StageGraph,
    metadata: &PipelineMetadata,
    now: DateTime<Utc>,
) -> Descriptor {
    let mut sources_by_target: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for edge in graph.edges() {
        sources_by_target
            .entry(&edge.target)
            .or_default()
            .push(&edge.source);
    }

    let stages: Vec<Stage> = graph
        .nodes()
        .iter()
        .map(|node| {
            let depends_on = sources_by_target
                .get(&node.id)
                .map(|sources| {
                    sources
                        .iter()
                        .filter_map(|id| graph.node(id))
                        .map(stage_name)
                        .collect()
                })
                .unwrap_or_default();

            Stage {
                name: stage_name(node),
                stage_type: node.stage_type.clone(),
                description: Some(node.description.clone()).filter(|d| !d.is_empty()),
                depends_on,
                config: node.config.clone(),
                position: Some(node.position),
                notifications: node
                    .notification_policy
                    .as_ref()
                    .map(|policy| policy.success.channels.into()),
                status: node.status.clone(),
                duration: node.duration.clone(),
            }
        })
        .collect();

    tracing::debug!(
        pipeline = %metadata.name,
        stages = stages.len(),
        edges = graph.edge_count(),
        "serialized stage graph"
    );

    Descriptor {
        api_version: API_VERSION.to_string(),
        kind: PIPELINE_KIND.to_string(),
        metadata: PipelineMetadata {
            created_at: now,
            updated_at: now,
            ..metadata.clone()
        },
        spec: PipelineSpec {
            stages,
            variables: graph.settings.variables.clone(),
            notifications: graph.settings.notifications.clone(),
            triggers: graph.settings.triggers.clone(),
        },
    }
}

/// Parse descriptor text into a graph and its metadata
pub fn from_descriptor(text: &str) -> StagegraphResult<(StageGraph, PipelineMetadata)> {
    let conversion = from_descriptor_with_report(text)?;
    Ok((conversion.graph, conversion.metadata))
}

/// Parse descriptor text, also reporting dropped dependencies
pub fn from_descriptor_with_report(text: &str) -> StagegraphResult<Conversion> {
    let descriptor = Descriptor::parse(text)?;
    Ok(graph_from_descriptor(descriptor))
}

/// Convert an already parsed descriptor
///
/// Dependencies on unknown names, and on the stage itself, are dropped
/// rather than failing the conversion.
pub fn graph_from_descriptor(descriptor: Descriptor) -> Conversion {
    let Descriptor { metadata, spec, .. } = descriptor;
    let PipelineSpec {
        stages,
        variables,
        notifications,
        triggers,
    } = spec;

    let mut name_to_id: HashMap<&str, NodeId> = HashMap::new();
    for (index, stage) in stages.iter().enumerate() {
        name_to_id
            .entry(stage.name.as_str())
            .or_insert_with(|| NodeId::positional(index));
    }

    let nodes = stages
        .iter()
        .enumerate()
        .map(|(index, stage)| GraphNode {
            id: NodeId::positional(index),
            stage_type: stage.stage_type.clone(),
            label: stage.name.clone(),
            description: stage.description.clone().unwrap_or_default(),
            config: stage.config.clone(),
            position: stage.position.unwrap_or_else(|| default_position(index)),
            status: stage.status.clone(),
            duration: stage.duration.clone(),
            notification_policy: stage
                .notifications
                .map(|n| NotificationPolicy::with_channels(Channels::from(n))),
        })
        .collect();

    let mut graph = StageGraph::from_nodes(
        nodes,
        PipelineSettings {
            variables,
            notifications,
            triggers,
        },
    );

    let mut skipped = Vec::new();
    for (index, stage) in stages.iter().enumerate() {
        let target = NodeId::positional(index);

        for dependency in &stage.depends_on {
            let reason = match name_to_id.get(dependency.as_str()) {
                Some(source) if *source == target => SkipReason::SelfReference,
                Some(source) => {
                    graph.link(source, &target);
                    continue;
                }
                None => SkipReason::Unresolved,
            };

            tracing::warn!(
                stage = %stage.name,
                dependency = %dependency,
                ?reason,
                "dropping dependency"
            );
            skipped.push(SkippedDependency {
                stage: stage.name.clone(),
                dependency: dependency.clone(),
                reason,
            });
        }
    }

    tracing::debug!(
        pipeline = %metadata.name,
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped = skipped.len(),
        "converted descriptor"
    );

    Conversion {
        graph,
        metadata,
        skipped,
    }
}
