// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Dependency analysis
//!
//! Builds a petgraph view over a [`StageGraph`] for ordering, cycle
//! detection and rendering.

use petgraph::algo::{has_path_connecting, tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

use super::{NodeId, StageGraph};
use crate::errors::{StagegraphError, StagegraphResult};

/// Petgraph view of stage dependencies
pub struct DependencyGraph {
    graph: DiGraph<NodeId, ()>,
    id_to_index: HashMap<NodeId, NodeIndex>,
    labels: HashMap<NodeId, String>,
    types: HashMap<NodeId, String>,
}

impl DependencyGraph {
    /// Build from a stage graph; edges to missing nodes are ignored
    pub fn build(stage_graph: &StageGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut id_to_index = HashMap::new();
        let mut labels = HashMap::new();
        let mut types = HashMap::new();

        for node in stage_graph.nodes() {
            let index = graph.add_node(node.id.clone());
            id_to_index.insert(node.id.clone(), index);
            labels.insert(node.id.clone(), node.label.clone());
            types.insert(node.id.clone(), node.stage_type.clone());
        }

        for edge in stage_graph.edges() {
            if let (Some(&from), Some(&to)) =
                (id_to_index.get(&edge.source), id_to_index.get(&edge.target))
            {
                graph.add_edge(from, to, ());
            }
        }

        Self {
            graph,
            id_to_index,
            labels,
            types,
        }
    }

    fn label(&self, index: NodeIndex) -> &str {
        let id = &self.graph[index];
        self.labels.get(id).map(String::as_str).unwrap_or(id.as_str())
    }

    /// Whether the dependency relation has no cycle
    pub fn is_acyclic(&self) -> bool {
        toposort(&self.graph, None).is_ok()
    }

    /// Node ids in an order where every dependency precedes its dependents
    pub fn topological_order(&self) -> StagegraphResult<Vec<NodeId>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|cycle| StagegraphError::CircularDependency {
                stages: self.find_cycle_members(cycle.node_id()),
            })
    }

    /// Labels of the strongly connected component containing `start`,
    /// closed by repeating the first label
    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let component = tarjan_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.contains(&start))
            .unwrap_or_else(|| vec![start]);

        let mut members: Vec<String> = component
            .iter()
            .rev()
            .map(|&n| self.label(n).to_string())
            .collect();
        if let Some(first) = members.first().cloned() {
            members.push(first);
        }
        members
    }

    /// Check if `a` depends (directly or transitively) on `b`
    pub fn depends_on(&self, a: &NodeId, b: &NodeId) -> bool {
        let (Some(&node_a), Some(&node_b)) = (self.id_to_index.get(a), self.id_to_index.get(b))
        else {
            return false;
        };

        node_a != node_b && has_path_connecting(&self.graph, node_b, node_a, None)
    }

    /// Generate Mermaid diagram
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for index in self.graph.node_indices() {
            out.push_str(&format!(
                "    {}[\"{}\"]\n",
                mermaid_id(&self.graph[index]),
                self.label(index).replace('"', "'")
            ));
        }

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    {} --> {}\n",
                mermaid_id(&self.graph[edge.source()]),
                mermaid_id(&self.graph[edge.target()])
            ));
        }

        out
    }

    /// Generate DOT diagram
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for index in self.graph.node_indices() {
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\"];\n",
                self.graph[index],
                self.label(index).replace('"', "\\\"")
            ));
        }

        for edge in self.graph.raw_edges() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of the dependency order
    ///
    /// A cyclic graph has no such order, so stages are listed in descriptor
    /// order instead and every stage on a cycle is marked `[cycle]`.
    pub fn to_text(&self) -> String {
        let (order, cyclic) = match toposort(&self.graph, None) {
            Ok(order) => (order, HashSet::new()),
            Err(_) => (self.graph.node_indices().collect(), self.cycle_nodes()),
        };
        let mut out = String::new();

        for (i, &index) in order.iter().enumerate() {
            let deps: Vec<&str> = self
                .graph
                .neighbors_directed(index, petgraph::Direction::Incoming)
                .map(|n| self.label(n))
                .collect();

            let stage_type = self
                .types
                .get(&self.graph[index])
                .map(String::as_str)
                .unwrap_or("");
            out.push_str(&format!("{}. {} ({})", i + 1, self.label(index), stage_type));

            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }
            if cyclic.contains(&index) {
                out.push_str(" [cycle]");
            }

            out.push('\n');
        }

        out
    }

    /// Every node that lies on some cycle
    fn cycle_nodes(&self) -> HashSet<NodeIndex> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || scc.iter().any(|&n| self.graph.contains_edge(n, n)))
            .flatten()
            .collect()
    }
}

fn mermaid_id(id: &NodeId) -> String {
    id.as_str().replace('-', "_")
}
