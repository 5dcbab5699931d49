//! A concurrent, event-driven execution engine for tree-shaped LLM
//! workflows.
//!
//! A caller builds a [`graph::Graph`] from a [`config::WorkflowConfig`],
//! wraps a [`executor::NodeExecutor`] and an [`callbacks::ExecutionCallbacks`]
//! around it in a [`dispatcher::Engine`], and awaits
//! [`dispatcher::Engine::execute_workflow`]. The [`registry::TaskRegistry`]
//! lets a second caller cancel that run by execution id while it is still in
//! flight.

pub mod callbacks;
pub mod condition;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod graph;
pub mod output;
pub mod registry;
pub mod summary;

pub use callbacks::{ExecutionCallbacks, LoggingCallbacks, NoopCallbacks};
pub use condition::{Condition, MatchTarget, MatchType};
pub use config::{load_workflow_config, EngineConfig, WorkflowConfig};
pub use dispatcher::Engine;
pub use error::{EngineError, GraphError, NodeExecutionError, Result};
pub use executor::{LlmNodeExecutor, NodeExecutor, NodeInput, RetryPolicy};
pub use graph::{Edge, Graph, InputConfig, Node, NodeType};
pub use output::Output;
pub use registry::TaskRegistry;
pub use summary::ExecutionSummary;
