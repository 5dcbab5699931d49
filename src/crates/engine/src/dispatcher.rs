//! The execution dispatcher: the event-driven scheduler that walks a
//! [`Graph`], runs ready nodes concurrently, and reacts to completions.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::callbacks::ExecutionCallbacks;
use crate::condition;
use crate::config::EngineConfig;
use crate::error::NodeExecutionError;
use crate::executor::{NodeExecutor, NodeInput};
use crate::graph::Graph;
use crate::output::Output;
use crate::registry::TaskRegistry;
use crate::summary::ExecutionSummary;

/// Ties a validated [`Graph`] to the capabilities that drive it: a
/// [`NodeExecutor`] to run nodes, an [`ExecutionCallbacks`] to observe
/// progress, and a [`TaskRegistry`] so a caller elsewhere can cancel the run.
pub struct Engine {
    graph: Graph,
    executor: Arc<dyn NodeExecutor>,
    callbacks: Arc<dyn ExecutionCallbacks>,
    registry: Arc<TaskRegistry>,
    semaphore: Option<Arc<Semaphore>>,
}

type NodeTaskResult = (String, Result<Output, NodeExecutionError>);

impl Engine {
    pub fn new(
        graph: Graph,
        executor: Arc<dyn NodeExecutor>,
        callbacks: Arc<dyn ExecutionCallbacks>,
        registry: Arc<TaskRegistry>,
    ) -> Self {
        Self::with_config(graph, executor, callbacks, registry, EngineConfig::default())
    }

    /// As [`Engine::new`], but with explicit tuning such as a soft cap on
    /// concurrently-running node tasks.
    pub fn with_config(
        graph: Graph,
        executor: Arc<dyn NodeExecutor>,
        callbacks: Arc<dyn ExecutionCallbacks>,
        registry: Arc<TaskRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            graph,
            executor,
            callbacks,
            registry,
            semaphore: config.max_concurrent_nodes.map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Run the workflow to completion: every node reaches a terminal state,
    /// or the run is cancelled. Registers the execution's cancellation token
    /// with the task registry before any node runs, and deregisters it
    /// unconditionally on the way out.
    pub async fn execute_workflow(
        &self,
        workflow_id: &str,
        workflow_name: &str,
        execution_id: i64,
    ) -> ExecutionSummary {
        let span = tracing::info_span!("execution", execution_id, workflow_id);
        self.run(workflow_id, workflow_name, execution_id)
            .instrument(span)
            .await
    }

    /// Run `fut` to completion, catching a panic inside it rather than letting
    /// it unwind through the dispatch loop. `ExecutionCallbacks` methods
    /// return `()`, so a panic is the only way one can fail; it is logged and
    /// swallowed here rather than aborting the run it's observing.
    async fn run_callback<F>(&self, callback: &str, fut: F)
    where
        F: Future<Output = ()>,
    {
        if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::error!(callback, error = %message, "execution callback panicked; ignoring");
        }
    }

    async fn run(&self, workflow_id: &str, workflow_name: &str, execution_id: i64) -> ExecutionSummary {
        let cancel = self.registry.register(execution_id);
        tracing::info!("execution starting");
        self.run_callback(
            "on_execution_start",
            self.callbacks.on_execution_start(workflow_id, execution_id),
        )
        .await;

        let mut state = DispatchState::new(&self.graph);
        let mut running: JoinSet<NodeTaskResult> = JoinSet::new();

        for start_id in self.graph.start_nodes() {
            self.spawn_node(start_id, NodeInput::default(), &cancel, &mut running, &mut state);
        }

        let mut cancelled = false;
        while !running.is_empty() {
            tokio::select! {
                biased;
                _ = cancel.cancelled(), if !cancelled => {
                    cancelled = true;
                    running.abort_all();
                }
                joined = running.join_next() => {
                    match joined {
                        None => break,
                        Some(Ok((node_id, Ok(output)))) => {
                            state.running_ids.remove(&node_id);
                            state.node_results.insert(node_id.clone(), output.clone());
                            state.completed.insert(node_id.clone());
                            self.run_callback(
                                "on_node_completed",
                                self.callbacks.on_node_completed(execution_id, &node_id, &output),
                            )
                            .await;
                            self.try_trigger_successors(&node_id, &cancel, &mut running, &mut state);
                        }
                        Some(Ok((node_id, Err(err)))) => {
                            state.running_ids.remove(&node_id);
                            state.failed.insert(node_id.clone());
                            self.run_callback(
                                "on_node_failed",
                                self.callbacks.on_node_failed(execution_id, &node_id, &err),
                            )
                            .await;
                            self.try_trigger_successors(&node_id, &cancel, &mut running, &mut state);
                        }
                        Some(Err(join_err)) if join_err.is_cancelled() => {
                            // Our own abort_all() on cancellation; the node is
                            // accounted for separately via running_ids below.
                        }
                        Some(Err(join_err)) => {
                            tracing::error!(error = %join_err, "node task panicked");
                            state.internal_error = Some(format!("node task panicked: {join_err}"));
                            running.abort_all();
                        }
                    }
                }
            }
        }

        if cancelled || state.internal_error.is_some() {
            // Anything still running when the loop exited was aborted rather
            // than completed; count it as cancelled rather than skipped so
            // the distinction survives into the summary.
            for node_id in state.running_ids.drain().collect::<Vec<_>>() {
                state.cancelled.insert(node_id);
            }
        }

        self.registry.unregister(execution_id);

        let summary = self.build_summary(workflow_id, workflow_name, state, cancelled);
        tracing::info!(
            completed = summary.completed_count,
            failed = summary.failed_count,
            skipped = summary.skipped_count,
            "execution finished"
        );
        self.run_callback(
            "on_execution_finished",
            self.callbacks.on_execution_finished(execution_id, &summary),
        )
        .await;
        summary
    }

    fn spawn_node(
        &self,
        node_id: &str,
        input: NodeInput,
        cancel: &CancellationToken,
        running: &mut JoinSet<NodeTaskResult>,
        state: &mut DispatchState,
    ) {
        let node = match self.graph.node(node_id) {
            Some(n) => n.clone(),
            None => return,
        };
        state.running_ids.insert(node_id.to_string());
        tracing::debug!(node_id, "spawning node task");
        let executor = Arc::clone(&self.executor);
        let cancel = cancel.clone();
        let semaphore = self.semaphore.clone();
        let id = node_id.to_string();
        let span = tracing::debug_span!("node", node_id = %id);
        running.spawn(
            async move {
                let _permit = match semaphore {
                    Some(sem) => Some(sem.acquire_owned().await.expect("semaphore never closed")),
                    None => None,
                };
                let result = executor.execute(&node, input, cancel).await;
                (id, result)
            }
            .instrument(span),
        );
    }

    /// Build the input a node should receive, per the input-assembly rules:
    /// `prompt` from the node itself if configured; `previous_output` from
    /// all completed direct predecessors, in first-seen edge order,
    /// concatenated as `"[name]: out | [name]: out"` when there is more than
    /// one.
    fn assemble_input(&self, node_id: &str, state: &DispatchState) -> NodeInput {
        let node = match self.graph.node(node_id) {
            Some(n) => n,
            None => return NodeInput::default(),
        };

        let prompt = if node.input_config.include_prompt {
            Some(node.prompt.clone())
        } else {
            None
        };

        let previous_output = if node.input_config.include_previous_output {
            let completed_preds: Vec<(&str, String)> = self
                .graph
                .predecessors(node_id)
                .iter()
                .filter(|p| state.completed.contains(*p))
                .filter_map(|p| {
                    state
                        .node_results
                        .get(p)
                        .map(|out| (p.as_str(), out.as_condition_text()))
                })
                .collect();

            match completed_preds.as_slice() {
                [] => None,
                [(_, text)] => Some(text.clone()),
                many => Some(
                    many.iter()
                        .map(|(p, text)| {
                            let name = self.graph.node(p).map(|n| n.name.as_str()).unwrap_or(p);
                            format!("[{name}]: {text}")
                        })
                        .collect::<Vec<_>>()
                        .join(" | "),
                ),
            }
        } else {
            None
        };

        NodeInput {
            prompt,
            previous_output,
        }
    }

    /// Re-evaluate every outgoing edge of a just-terminated node, dispatching,
    /// skipping, or deferring each successor per the dispatch algorithm.
    fn try_trigger_successors(
        &self,
        from_node: &str,
        cancel: &CancellationToken,
        running: &mut JoinSet<NodeTaskResult>,
        state: &mut DispatchState,
    ) {
        let successors: Vec<String> = self
            .graph
            .outgoing(from_node)
            .iter()
            .map(|e| e.to_node.clone())
            .collect();

        for v in successors {
            self.evaluate_node(&v, cancel, running, state);
        }
    }

    fn evaluate_node(
        &self,
        node_id: &str,
        cancel: &CancellationToken,
        running: &mut JoinSet<NodeTaskResult>,
        state: &mut DispatchState,
    ) {
        if state.is_terminal_or_running(node_id) {
            return;
        }

        let preds = self.graph.predecessors(node_id).to_vec();
        let accounted_for = preds.iter().all(|p| state.is_accounted_for(p));
        if !accounted_for {
            return;
        }

        let all_completed = preds.iter().all(|p| state.completed.contains(p));
        if !all_completed {
            self.mark_skipped(node_id, cancel, running, state);
            return;
        }

        let should_dispatch = preds.iter().any(|p| {
            let condition = self.graph.edge(p, node_id).and_then(|e| e.condition.as_ref());
            let output = state.node_results.get(p);
            match output {
                Some(out) => condition::evaluate(condition, out),
                None => false,
            }
        });

        if should_dispatch {
            let input = self.assemble_input(node_id, state);
            self.spawn_node(node_id, input, cancel, running, state);
        } else {
            self.mark_skipped(node_id, cancel, running, state);
        }
    }

    fn mark_skipped(
        &self,
        node_id: &str,
        cancel: &CancellationToken,
        running: &mut JoinSet<NodeTaskResult>,
        state: &mut DispatchState,
    ) {
        tracing::warn!(node_id, "node skipped");
        state.skipped.insert(node_id.to_string());
        self.try_trigger_successors(node_id, cancel, running, state);
    }

    fn build_summary(
        &self,
        workflow_id: &str,
        workflow_name: &str,
        mut state: DispatchState,
        cancelled: bool,
    ) -> ExecutionSummary {
        // Anything left pending (unreachable, or starved by an aborted run)
        // is coerced to skipped so every node ends in exactly one state.
        for node_id in self.graph.node_ids() {
            if !state.is_terminal_or_running(node_id) {
                state.skipped.insert(node_id.to_string());
            }
        }

        let error_message = if cancelled {
            Some("cancelled".to_string())
        } else {
            state.internal_error.clone()
        };

        let mut cancelled_node_ids: Vec<String> = state.cancelled.iter().cloned().collect();
        cancelled_node_ids.sort();

        ExecutionSummary {
            workflow_id: workflow_id.to_string(),
            workflow_name: workflow_name.to_string(),
            completed_count: state.completed.len(),
            failed_count: state.failed.len(),
            skipped_count: state.skipped.len(),
            cancelled_count: state.cancelled.len(),
            total_count: self.graph.len(),
            results: state.node_results,
            error_message,
            cancelled_node_ids,
        }
    }
}

struct DispatchState {
    node_results: HashMap<String, Output>,
    completed: HashSet<String>,
    failed: HashSet<String>,
    skipped: HashSet<String>,
    cancelled: HashSet<String>,
    running_ids: HashSet<String>,
    internal_error: Option<String>,
}

impl DispatchState {
    fn new(_graph: &Graph) -> Self {
        Self {
            node_results: HashMap::new(),
            completed: HashSet::new(),
            failed: HashSet::new(),
            skipped: HashSet::new(),
            cancelled: HashSet::new(),
            running_ids: HashSet::new(),
            internal_error: None,
        }
    }

    fn is_accounted_for(&self, node_id: &str) -> bool {
        self.completed.contains(node_id) || self.failed.contains(node_id) || self.skipped.contains(node_id)
    }

    fn is_terminal_or_running(&self, node_id: &str) -> bool {
        self.completed.contains(node_id)
            || self.failed.contains(node_id)
            || self.skipped.contains(node_id)
            || self.cancelled.contains(node_id)
            || self.running_ids.contains(node_id)
    }
}
