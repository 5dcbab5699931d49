//! Process-wide registry of in-flight executions, keyed by execution id, so
//! any caller holding an id can cancel a run without holding a reference to
//! the dispatcher that started it.

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

/// Concurrent map from execution id to its [`CancellationToken`].
///
/// Cloning is cheap: the registry is an `Arc`-backed handle internally via
/// `DashMap`'s own sharding, and every clone shares the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    executions: DashMap<i64, CancellationToken>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            executions: DashMap::new(),
        }
    }

    /// Register a new execution and return the token its tasks should poll.
    /// Idempotent: a second registration under the same id logs and returns
    /// the existing token rather than starting a second one.
    pub fn register(&self, execution_id: i64) -> CancellationToken {
        if let Some(existing) = self.executions.get(&execution_id) {
            tracing::warn!(execution_id, "execution already registered");
            return existing.clone();
        }
        let token = CancellationToken::new();
        self.executions.insert(execution_id, token.clone());
        token
    }

    /// Request cancellation of a running execution. Returns `false` if no
    /// execution with that id is currently registered.
    pub fn cancel(&self, execution_id: i64) -> bool {
        match self.executions.get(&execution_id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether an execution id is currently tracked.
    pub fn is_running(&self, execution_id: i64) -> bool {
        self.executions.contains_key(&execution_id)
    }

    /// Remove an execution from the registry once it has finished, win or
    /// lose. Idempotent.
    pub fn unregister(&self, execution_id: i64) {
        self.executions.remove(&execution_id);
    }

    pub fn len(&self) -> usize {
        self.executions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}
