// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Owning environment resolution
//!
//! Stages do not record their environment. It is found by walking
//! dependency edges backwards until an environment node (`node_*`) is hit.

use std::collections::{HashMap, HashSet};

use crate::graph::{Environment, GraphNode, NodeId, StageGraph};

/// Find the environment node that causally precedes `stage`
///
/// Incoming edges are tried in insertion order and the first environment
/// reached wins. Each node is entered at most once, so cyclic graphs
/// terminate. `None` means no environment precedes the stage.
pub fn resolve_owning_environment<'g>(
    graph: &'g StageGraph,
    stage: &NodeId,
) -> Option<&'g GraphNode> {
    let mut visited = HashSet::new();
    walk_upstream(graph, stage, &mut visited)
}

fn walk_upstream<'g>(
    graph: &'g StageGraph,
    current: &NodeId,
    visited: &mut HashSet<&'g NodeId>,
) -> Option<&'g GraphNode> {
    for edge in graph.incoming(current) {
        let Some(source) = graph.node(&edge.source) else {
            continue;
        };

        if source.is_environment() {
            return Some(source);
        }

        if visited.insert(&source.id) {
            if let Some(found) = walk_upstream(graph, &source.id, visited) {
                return Some(found);
            }
        }
    }

    None
}

/// Owning environment of the stage with the given label
pub fn resolve_by_label<'g>(graph: &'g StageGraph, label: &str) -> Option<&'g GraphNode> {
    let stage = graph.node_by_label(label)?;
    resolve_owning_environment(graph, &stage.id)
}

/// Attributable stages sharing one owning environment
#[derive(Debug, Clone)]
pub struct EnvironmentGroup<'g> {
    pub environment_node: &'g GraphNode,
    pub environment: Environment,
    /// Plan, approval and release stages, in graph order
    pub stages: Vec<&'g GraphNode>,
}

/// Group plan, approval and release stages by owning environment
///
/// Groups appear in the order their first stage appears in the graph.
/// Stages with no owning environment are left out.
pub fn group_by_environment(graph: &StageGraph) -> Vec<EnvironmentGroup<'_>> {
    let mut groups: Vec<EnvironmentGroup<'_>> = Vec::new();
    let mut index_of: HashMap<&NodeId, usize> = HashMap::new();

    for stage in graph.nodes() {
        if !stage.category().is_attributable() {
            continue;
        }

        let Some(owner) = resolve_owning_environment(graph, &stage.id) else {
            tracing::debug!(stage = %stage.label, "stage has no owning environment");
            continue;
        };

        let index = *index_of.entry(&owner.id).or_insert_with(|| {
            groups.push(EnvironmentGroup {
                environment_node: owner,
                environment: Environment::from_stage_type(&owner.stage_type),
                stages: Vec::new(),
            });
            groups.len() - 1
        });
        groups[index].stages.push(stage);
    }

    groups
}
