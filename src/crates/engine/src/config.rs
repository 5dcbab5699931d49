//! Workflow configuration: the external, serializable shape the engine is
//! built from, and loading it from a file.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::graph::{Edge, Graph, Node};

/// Process-wide tuning for an [`crate::dispatcher::Engine`], distinct from a
/// single workflow's own configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Soft cap on node tasks running at once, enforced with a
    /// `tokio::sync::Semaphore`. `None` means unbounded.
    pub max_concurrent_nodes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_nodes: None,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_concurrent_nodes(mut self, max: usize) -> Self {
        self.max_concurrent_nodes = Some(max);
        self
    }
}

/// The full workflow configuration handed to the engine by a caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub workflow_id: String,
    pub workflow_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_type", rename = "type")]
    pub workflow_type: String,
    pub nodes: HashMap<String, Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_type() -> String {
    "tree".to_string()
}

impl WorkflowConfig {
    /// Build the validated [`Graph`] from this configuration.
    pub fn build_graph(&self) -> std::result::Result<Graph, crate::error::GraphError> {
        let nodes: Vec<Node> = self.nodes.values().cloned().collect();
        Graph::build(nodes, self.edges.clone())
    }
}

/// Load a [`WorkflowConfig`] from a YAML, JSON, or TOML file, selected by
/// extension — the same three formats the rest of this workspace loads
/// configuration from.
pub fn load_workflow_config<P: AsRef<Path>>(path: P) -> Result<WorkflowConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
        Some("json") => Ok(serde_json::from_str(&content)?),
        Some("toml") => Ok(toml::from_str(&content)?),
        other => Err(EngineError::UnsupportedConfigFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InputConfig, NodeType};

    #[test]
    fn engine_config_defaults_to_unbounded() {
        assert_eq!(EngineConfig::default().max_concurrent_nodes, None);
        let config = EngineConfig::new().with_max_concurrent_nodes(4);
        assert_eq!(config.max_concurrent_nodes, Some(4));
    }

    #[test]
    fn parse_yaml_round_trips_nodes_and_edges() {
        let yaml = r#"
workflow_id: wf-1
workflow_name: demo
nodes:
  s:
    id: s
    name: start
    description: ""
    prompt: ""
    node_type: START
    input_config:
      include_prompt: true
      include_previous_output: true
  l:
    id: l
    name: leaf
    description: ""
    prompt: "summarize"
    node_type: LEAF
    input_config:
      include_prompt: true
      include_previous_output: true
edges:
  - from_node: s
    to_node: l
    condition: null
"#;
        let config: WorkflowConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.edges.len(), 1);
        assert_eq!(config.nodes["s"].node_type, NodeType::Start);

        let graph = config.build_graph().unwrap();
        assert_eq!(graph.start_nodes(), &["s".to_string()]);
        let _ = InputConfig::default();
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = std::env::temp_dir().join("engine_config_test.ini");
        std::fs::write(&dir, "not a config").unwrap();
        let err = load_workflow_config(&dir).unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedConfigFormat(_)));
        let _ = std::fs::remove_file(&dir);
    }
}
