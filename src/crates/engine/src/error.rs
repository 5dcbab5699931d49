//! Error types for the workflow execution engine.

use thiserror::Error;

/// Errors raised while building a [`crate::graph::Graph`] from a workflow configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// No node in the configuration has `node_type = START`.
    #[error("workflow has no START node")]
    NoStartNode,

    /// An edge references a node id that does not exist.
    #[error("edge references unknown node: {0}")]
    UnknownEndpoint(String),

    /// Depth-first cycle detection found a back-edge reachable from `node_id`.
    #[error("cycle detected at node: {0}")]
    CycleDetected(String),
}

/// Result alias for graph construction.
pub type GraphResult<T> = std::result::Result<T, GraphError>;

/// Error raised by a [`crate::executor::NodeExecutor`] implementation.
///
/// Isolated to the node that produced it; the dispatcher never lets this abort
/// the rest of the graph.
#[derive(Debug, Error)]
#[error("node execution failed: {message}")]
pub struct NodeExecutionError {
    pub message: String,
}

impl NodeExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Top-level error for loading configuration and running an execution.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph construction failed: {0}")]
    Graph(#[from] GraphError),

    #[error("failed to read workflow configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse workflow configuration as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to parse workflow configuration as JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to parse workflow configuration as TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unsupported workflow configuration extension: {0}")]
    UnsupportedConfigFormat(String),

    #[error("execution was cancelled")]
    Cancelled,

    #[error("internal engine error: {0}")]
    Internal(String),
}

/// Result alias for engine-level operations.
pub type Result<T> = std::result::Result<T, EngineError>;
