//! The immutable graph model: nodes, edges, conditions, and the adjacency
//! indexes the dispatcher walks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::{GraphError, GraphResult};

/// A node's position in the tree-shaped workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Start,
    Intermediate,
    Leaf,
}

/// Per-node flags controlling what a node receives as input when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    pub include_prompt: bool,
    pub include_previous_output: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            include_prompt: true,
            include_previous_output: true,
        }
    }
}

/// A single node in the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub description: String,
    pub prompt: String,
    pub node_type: NodeType,
    pub input_config: InputConfig,
}

/// A directed dependency between two nodes, optionally gated by a [`Condition`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from_node: String,
    pub to_node: String,
    pub condition: Option<Condition>,
}

/// The validated, immutable workflow graph.
///
/// Construction is the only place invariants are checked; once built, every
/// query below is total.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: HashMap<String, Node>,
    outgoing: HashMap<String, Vec<Edge>>,
    /// Direct predecessors of each node, in first-seen edge order and
    /// deduplicated — input assembly depends on this order, not just set
    /// membership.
    predecessors: HashMap<String, Vec<String>>,
    start_nodes: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

impl Graph {
    /// Build a graph from nodes and edges, validating the invariants from the
    /// data model: at least one START node, every edge endpoint resolves to a
    /// known node, and the edge set is acyclic.
    pub fn build(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphResult<Self> {
        let nodes: HashMap<String, Node> = nodes.into_iter().map(|n| (n.id.clone(), n)).collect();

        let start_nodes: Vec<String> = nodes
            .values()
            .filter(|n| n.node_type == NodeType::Start)
            .map(|n| n.id.clone())
            .collect();
        if start_nodes.is_empty() {
            return Err(GraphError::NoStartNode);
        }

        for edge in &edges {
            if !nodes.contains_key(&edge.from_node) {
                return Err(GraphError::UnknownEndpoint(edge.from_node.clone()));
            }
            if !nodes.contains_key(&edge.to_node) {
                return Err(GraphError::UnknownEndpoint(edge.to_node.clone()));
            }
        }

        let mut outgoing: HashMap<String, Vec<Edge>> = HashMap::new();
        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
        for node_id in nodes.keys() {
            outgoing.entry(node_id.clone()).or_default();
            predecessors.entry(node_id.clone()).or_default();
        }
        for edge in edges {
            let preds = predecessors.entry(edge.to_node.clone()).or_default();
            if !preds.contains(&edge.from_node) {
                preds.push(edge.from_node.clone());
            }
            outgoing.entry(edge.from_node.clone()).or_default().push(edge);
        }

        Self::check_acyclic(&nodes, &outgoing)?;

        Ok(Self {
            nodes,
            outgoing,
            predecessors,
            start_nodes,
        })
    }

    /// Three-color depth-first cycle detection. A GRAY neighbor is a back-edge.
    fn check_acyclic(
        nodes: &HashMap<String, Node>,
        outgoing: &HashMap<String, Vec<Edge>>,
    ) -> GraphResult<()> {
        let mut color: HashMap<&str, Color> =
            nodes.keys().map(|id| (id.as_str(), Color::White)).collect();

        fn visit<'a>(
            node_id: &'a str,
            outgoing: &'a HashMap<String, Vec<Edge>>,
            color: &mut HashMap<&'a str, Color>,
        ) -> GraphResult<()> {
            color.insert(node_id, Color::Gray);
            if let Some(edges) = outgoing.get(node_id) {
                for edge in edges {
                    match color.get(edge.to_node.as_str()) {
                        Some(Color::Gray) => {
                            return Err(GraphError::CycleDetected(edge.to_node.clone()))
                        }
                        Some(Color::Black) => {}
                        _ => visit(&edge.to_node, outgoing, color)?,
                    }
                }
            }
            color.insert(node_id, Color::Black);
            Ok(())
        }

        let node_ids: Vec<&str> = nodes.keys().map(|s| s.as_str()).collect();
        for node_id in node_ids {
            if color.get(node_id) == Some(&Color::White) {
                visit(node_id, outgoing, &mut color)?;
            }
        }
        Ok(())
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn outgoing(&self, node_id: &str) -> &[Edge] {
        self.outgoing
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn predecessors(&self, node_id: &str) -> &[String] {
        self.predecessors
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The edge `from_node -> to_node`, if one exists. With duplicate edges
    /// sharing the same endpoints, the first one encountered during
    /// construction is returned.
    pub fn edge(&self, from_node: &str, to_node: &str) -> Option<&Edge> {
        self.outgoing(from_node)
            .iter()
            .find(|e| e.to_node == to_node)
    }

    pub fn start_nodes(&self) -> &[String] {
        &self.start_nodes
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, node_type: NodeType) -> Node {
        Node {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            prompt: String::new(),
            node_type,
            input_config: InputConfig::default(),
        }
    }

    fn edge(from: &str, to: &str) -> Edge {
        Edge {
            from_node: from.to_string(),
            to_node: to.to_string(),
            condition: None,
        }
    }

    #[test]
    fn build_requires_start_node() {
        let nodes = vec![node("a", NodeType::Intermediate)];
        let err = Graph::build(nodes, vec![]).unwrap_err();
        assert_eq!(err, GraphError::NoStartNode);
    }

    #[test]
    fn build_rejects_unknown_endpoint() {
        let nodes = vec![node("s", NodeType::Start)];
        let err = Graph::build(nodes, vec![edge("s", "ghost")]).unwrap_err();
        assert_eq!(err, GraphError::UnknownEndpoint("ghost".to_string()));
    }

    #[test]
    fn build_rejects_cycle() {
        let nodes = vec![
            node("s", NodeType::Start),
            node("a", NodeType::Intermediate),
            node("b", NodeType::Intermediate),
            node("c", NodeType::Intermediate),
        ];
        let edges = vec![edge("s", "a"), edge("a", "b"), edge("b", "c"), edge("c", "a")];
        let err = Graph::build(nodes, edges).unwrap_err();
        assert!(matches!(err, GraphError::CycleDetected(_)));
    }

    #[test]
    fn adjacency_queries_are_total() {
        let nodes = vec![node("s", NodeType::Start), node("l", NodeType::Leaf)];
        let graph = Graph::build(nodes, vec![edge("s", "l")]).unwrap();

        assert_eq!(graph.outgoing("s").len(), 1);
        assert!(graph.outgoing("unknown").is_empty());
        assert!(graph.predecessors("l").contains("s"));
        assert!(graph.predecessors("unknown").is_empty());
        assert_eq!(graph.start_nodes(), &["s".to_string()]);
    }
}
