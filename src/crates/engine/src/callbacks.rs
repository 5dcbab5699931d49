//! Execution lifecycle callbacks.
//!
//! Implementors get notified as an execution progresses; all methods default
//! to no-ops so callers only implement the events they care about.

use async_trait::async_trait;

use crate::error::NodeExecutionError;
use crate::output::Output;
use crate::summary::ExecutionSummary;

/// Observer for a single workflow execution's lifecycle.
#[async_trait]
pub trait ExecutionCallbacks: Send + Sync {
    async fn on_execution_start(&self, _workflow_id: &str, _execution_id: i64) {}

    async fn on_node_completed(&self, _execution_id: i64, _node_id: &str, _result: &Output) {}

    async fn on_node_failed(
        &self,
        _execution_id: i64,
        _node_id: &str,
        _error: &NodeExecutionError,
    ) {
    }

    async fn on_execution_finished(&self, _execution_id: i64, _summary: &ExecutionSummary) {}
}

/// Does nothing. The default when a caller has no interest in lifecycle
/// events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCallbacks;

#[async_trait]
impl ExecutionCallbacks for NoopCallbacks {}

/// Logs every lifecycle event at the appropriate `tracing` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingCallbacks;

#[async_trait]
impl ExecutionCallbacks for LoggingCallbacks {
    async fn on_execution_start(&self, workflow_id: &str, execution_id: i64) {
        tracing::info!(execution_id, workflow_id, "execution started");
    }

    async fn on_node_completed(&self, execution_id: i64, node_id: &str, result: &Output) {
        tracing::debug!(
            execution_id,
            node_id,
            output = %result.as_condition_text(),
            "node completed"
        );
    }

    async fn on_node_failed(&self, execution_id: i64, node_id: &str, error: &NodeExecutionError) {
        tracing::warn!(execution_id, node_id, error = %error, "node failed");
    }

    async fn on_execution_finished(&self, execution_id: i64, summary: &ExecutionSummary) {
        tracing::info!(
            execution_id,
            is_complete = summary.is_complete(),
            completed = summary.completed_count,
            failed = summary.failed_count,
            skipped = summary.skipped_count,
            "execution finished"
        );
    }
}
