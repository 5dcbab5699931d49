//! The pluggable node-execution capability and its default LLM-backed
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use llm::{ChatModel, ChatRequest, Message};

use crate::error::NodeExecutionError;
use crate::graph::{Node, NodeType};
use crate::output::Output;

/// Assembled input for a single node invocation, built by the dispatcher from
/// the node's `input_config` and its predecessors' outputs.
#[derive(Debug, Clone, Default)]
pub struct NodeInput {
    pub prompt: Option<String>,
    pub previous_output: Option<String>,
}

/// A capability that turns a node plus its assembled input into an [`Output`].
///
/// Isolated failures here never abort the rest of a running graph — the
/// dispatcher records them against the failing node and lets dependent edges
/// evaluate or skip accordingly. `cancel` is the execution's cancellation
/// token; long-running implementations should check it between I/O calls.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(
        &self,
        node: &Node,
        input: NodeInput,
        cancel: CancellationToken,
    ) -> Result<Output, NodeExecutionError>;
}

/// Retry policy for a single [`LlmNodeExecutor`] call: exponential backoff
/// with optional jitter, applied only to the LLM call itself — the
/// dispatcher never retries a node on the executor's behalf.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: usize) -> Duration {
        let base = self.initial_interval.as_secs_f64();
        let multiplier = self.backoff_factor.powi((attempt - 1) as i32);
        let capped = (base * multiplier).min(self.max_interval.as_secs_f64());

        let final_delay = if self.jitter {
            use rand::Rng;
            let jitter_factor = rand::thread_rng().gen_range(0.0..0.25);
            capped * (1.0 + jitter_factor)
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }
}

const START_MARKER: &str = "workflow started";

/// The default executor: calls a chat model with a prompt assembled from the
/// node and its predecessors, retrying transient failures with backoff, and
/// falling back to a deterministic textual summary if every attempt fails.
///
/// START nodes never reach the model at all: they short-circuit to a
/// constant marker, mirroring the role a START node plays as a pure seed for
/// downstream work rather than a unit of generation.
pub struct LlmNodeExecutor {
    model: Box<dyn ChatModel>,
    retry_policy: RetryPolicy,
}

impl LlmNodeExecutor {
    pub fn new(model: Box<dyn ChatModel>) -> Self {
        Self {
            model,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    fn build_prompt(&self, node: &Node, input: &NodeInput) -> String {
        let mut sections = Vec::new();
        if let Some(prompt) = &input.prompt {
            if !prompt.is_empty() {
                sections.push(prompt.clone());
            }
        }
        if let Some(previous) = &input.previous_output {
            if !previous.is_empty() {
                sections.push(format!("Previous output: {previous}"));
            }
        }
        if sections.is_empty() {
            node.description.clone()
        } else {
            sections.join("\n\n")
        }
    }

    async fn call_model(
        &self,
        node: &Node,
        input: &NodeInput,
        cancel: &CancellationToken,
    ) -> llm::Result<String> {
        let prompt = self.build_prompt(node, input);
        let messages = vec![
            Message::system(format!(
                "You are executing the node '{}' in a multi-step workflow.",
                node.name
            )),
            Message::human(prompt),
        ];

        let mut attempts = 0;
        let mut last_error = None;
        while attempts < self.retry_policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(llm::LlmError::Other("execution cancelled".to_string()));
            }
            attempts += 1;
            let call = self.model.chat(ChatRequest::new(messages.clone()));
            let result = tokio::select! {
                result = call => result,
                _ = cancel.cancelled() => {
                    return Err(llm::LlmError::Other("execution cancelled".to_string()));
                }
            };
            match result {
                Ok(response) => {
                    if attempts > 1 {
                        tracing::info!(node = %node.id, attempts, "node executor succeeded after retry");
                    }
                    return Ok(response.message.text().unwrap_or_default().to_string());
                }
                Err(err) => {
                    tracing::warn!(node = %node.id, attempt = attempts, error = %err, "chat model call failed");
                    last_error = Some(err);
                    if attempts < self.retry_policy.max_attempts {
                        tokio::select! {
                            _ = tokio::time::sleep(self.retry_policy.delay_for(attempts)) => {}
                            _ = cancel.cancelled() => {
                                return Err(llm::LlmError::Other("execution cancelled".to_string()));
                            }
                        }
                    }
                }
            }
        }
        Err(last_error.expect("at least one attempt was made"))
    }

    fn fallback_text(&self, node: &Node, input: &NodeInput) -> String {
        match node.node_type {
            NodeType::Start => format!("{START_MARKER} - {}", node.name),
            NodeType::Leaf => format!(
                "{}: {}",
                node.name,
                input
                    .previous_output
                    .clone()
                    .unwrap_or_else(|| node.description.clone())
            ),
            NodeType::Intermediate => format!(
                "{} processed: {}",
                node.name,
                input
                    .previous_output
                    .clone()
                    .unwrap_or_else(|| node.description.clone())
            ),
        }
    }
}

#[async_trait]
impl NodeExecutor for LlmNodeExecutor {
    async fn execute(
        &self,
        node: &Node,
        input: NodeInput,
        cancel: CancellationToken,
    ) -> Result<Output, NodeExecutionError> {
        if node.node_type == NodeType::Start {
            return Ok(Output::Text(format!("{START_MARKER} - {}", node.name)));
        }

        match self.call_model(node, &input, &cancel).await {
            Ok(text) => Ok(Output::Text(text)),
            Err(err) => {
                tracing::warn!(node = %node.id, error = %err, "falling back to deterministic summary");
                Ok(Output::Text(self.fallback_text(node, &input)))
            }
        }
    }
}
