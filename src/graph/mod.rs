// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Stage graph
//!
//! The editable, id-keyed form of a pipeline: nodes for stages, edges for
//! dependencies. Edges point from the dependency (`source`) to the stage
//! that waits on it (`target`).

pub mod category;
mod dag;

pub use category::{Category, Environment};
pub use dag::DependencyGraph;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::descriptor::{ConfigMap, PipelineNotifications, Position, TriggerFlag};
use crate::errors::{StagegraphError, StagegraphResult};
use crate::notification::NotificationPolicy;

/// Stable node identity (`node-<n>`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the stage at `index` in descriptor order
    pub fn positional(index: usize) -> Self {
        Self(format!("node-{}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Edge identity, derived from its endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("edge-{}-{}", source, target))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stage in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: NodeId,

    #[serde(rename = "type")]
    pub stage_type: String,

    /// Stage name in the descriptor
    pub label: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub config: ConfigMap,

    #[serde(default)]
    pub position: Position,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_policy: Option<NotificationPolicy>,
}

impl GraphNode {
    pub fn new(id: NodeId, stage_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id,
            stage_type: stage_type.into(),
            label: label.into(),
            description: String::new(),
            config: ConfigMap::new(),
            position: Position::default(),
            status: None,
            duration: None,
            notification_policy: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn category(&self) -> Category {
        Category::classify(&self.stage_type)
    }

    /// Whether this node is a deployment environment container
    pub fn is_environment(&self) -> bool {
        self.category() == Category::Environment
    }
}

/// Dependency between two nodes: `target` waits on `source`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Pipeline-wide settings carried alongside the stages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineSettings {
    pub variables: BTreeMap<String, String>,
    pub notifications: Option<PipelineNotifications>,
    pub triggers: Option<BTreeMap<String, TriggerFlag>>,
}

/// Editable pipeline graph
///
/// Nodes and edges keep insertion order; conversion and environment
/// resolution rely on it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    pub settings: PipelineSettings,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from nodes whose ids are already known to be unique
    pub(crate) fn from_nodes(nodes: Vec<GraphNode>, settings: PipelineSettings) -> Self {
        Self {
            nodes,
            edges: Vec::new(),
            settings,
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    /// First node carrying this label
    pub fn node_by_label(&self, label: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.label == label)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Lowest `node-<n>` id, starting after the current node count, that is free
    pub fn next_node_id(&self) -> NodeId {
        let mut index = self.nodes.len();
        loop {
            let candidate = NodeId::positional(index);
            if !self.contains_node(&candidate) {
                return candidate;
            }
            index += 1;
        }
    }

    /// Add a node; its id must not already be in use
    pub fn add_node(&mut self, node: GraphNode) -> StagegraphResult<&NodeId> {
        if self.contains_node(&node.id) {
            return Err(StagegraphError::DuplicateNode {
                id: node.id.to_string(),
            });
        }

        self.nodes.push(node);
        let last = self.nodes.len() - 1;
        Ok(&self.nodes[last].id)
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, id: &NodeId) -> Option<GraphNode> {
        let index = self.nodes.iter().position(|n| &n.id == id)?;
        self.edges.retain(|e| &e.source != id && &e.target != id);
        Some(self.nodes.remove(index))
    }

    /// Record that `target` depends on `source`
    ///
    /// Connecting an already connected pair returns the existing edge id.
    pub fn connect(&mut self, source: &NodeId, target: &NodeId) -> StagegraphResult<EdgeId> {
        for id in [source, target] {
            if !self.contains_node(id) {
                return Err(StagegraphError::UnknownNode { id: id.to_string() });
            }
        }

        if source == target {
            return Err(StagegraphError::SelfDependency {
                id: source.to_string(),
            });
        }

        Ok(self.link(source, target))
    }

    /// Insert an edge between existing, distinct nodes; idempotent
    pub(crate) fn link(&mut self, source: &NodeId, target: &NodeId) -> EdgeId {
        let id = EdgeId::between(source, target);
        if !self.edges.iter().any(|e| e.id == id) {
            self.edges.push(GraphEdge {
                id: id.clone(),
                source: source.clone(),
                target: target.clone(),
            });
        }
        id
    }

    /// Remove the edge between two nodes, returning whether one existed
    pub fn disconnect(&mut self, source: &NodeId, target: &NodeId) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|e| !(&e.source == source && &e.target == target));
        self.edges.len() != before
    }

    /// Edges whose target is `id`, in insertion order
    pub fn incoming<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.target == id)
    }

    /// Edges whose source is `id`, in insertion order
    pub fn outgoing<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Nodes `id` directly depends on
    pub fn dependencies(&self, id: &NodeId) -> Vec<&GraphNode> {
        self.incoming(id)
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Nodes that directly depend on `id`
    pub fn dependents(&self, id: &NodeId) -> Vec<&GraphNode> {
        self.outgoing(id)
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// All environment container nodes
    pub fn environment_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_environment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_node_graph() -> StageGraph {
        let mut graph = StageGraph::new();
        for (i, (ty, label)) in [("node_qa", "qa"), ("plan_jira", "ticket"), ("release_docker", "image")]
            .into_iter()
            .enumerate()
        {
            graph
                .add_node(GraphNode::new(NodeId::positional(i), ty, label))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_positional_ids() {
        assert_eq!(NodeId::positional(0).as_str(), "node-1");
        assert_eq!(NodeId::positional(9).as_str(), "node-10");
        assert_eq!(
            EdgeId::between(&"node-1".into(), &"node-2".into()).as_str(),
            "edge-node-1-node-2"
        );
    }

    #[test]
    fn test_add_duplicate_node_fails() {
        let mut graph = three_node_graph();
        let result = graph.add_node(GraphNode::new("node-2".into(), "build_maven", "dup"));
        assert!(matches!(result, Err(StagegraphError::DuplicateNode { .. })));
        assert_eq!(graph.node_count(), 3);
    }

    #[test]
    fn test_next_node_id_skips_used_ids() {
        let mut graph = three_node_graph();
        assert_eq!(graph.next_node_id().as_str(), "node-4");

        graph.remove_node(&"node-1".into());
        // node-3 is still taken, so the next free id after the count is node-4
        assert_eq!(graph.next_node_id().as_str(), "node-4");
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut graph = three_node_graph();
        let first = graph.connect(&"node-1".into(), &"node-2".into()).unwrap();
        let second = graph.connect(&"node-1".into(), &"node-2".into()).unwrap();

        assert_eq!(first, second);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_connect_rejects_unknown_and_self() {
        let mut graph = three_node_graph();

        let unknown = graph.connect(&"node-1".into(), &"node-9".into());
        assert!(matches!(unknown, Err(StagegraphError::UnknownNode { id }) if id == "node-9"));

        let looped = graph.connect(&"node-2".into(), &"node-2".into());
        assert!(matches!(looped, Err(StagegraphError::SelfDependency { .. })));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_remove_node_drops_edges() {
        let mut graph = three_node_graph();
        graph.connect(&"node-1".into(), &"node-2".into()).unwrap();
        graph.connect(&"node-2".into(), &"node-3".into()).unwrap();

        let removed = graph.remove_node(&"node-2".into()).unwrap();
        assert_eq!(removed.label, "ticket");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_node(&"node-2".into()).is_none());
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let mut graph = three_node_graph();
        graph.connect(&"node-1".into(), &"node-3".into()).unwrap();
        graph.connect(&"node-2".into(), &"node-3".into()).unwrap();

        let deps: Vec<_> = graph
            .dependencies(&"node-3".into())
            .into_iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(deps, vec!["qa", "ticket"]);

        let dependents: Vec<_> = graph
            .dependents(&"node-1".into())
            .into_iter()
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(dependents, vec!["image"]);

        assert!(graph.disconnect(&"node-1".into(), &"node-3".into()));
        assert!(!graph.disconnect(&"node-1".into(), &"node-3".into()));
        assert_eq!(graph.dependencies(&"node-3".into()).len(), 1);
    }

    #[test]
    fn test_lookup_by_label_and_environment_nodes() {
        let graph = three_node_graph();
        assert_eq!(graph.node_by_label("image").unwrap().id.as_str(), "node-3");
        assert!(graph.node_by_label("missing").is_none());

        let envs: Vec<_> = graph.environment_nodes().map(|n| n.label.as_str()).collect();
        assert_eq!(envs, vec!["qa"]);
    }
}
