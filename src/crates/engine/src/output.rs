//! Node output values.
//!
//! The original engine treats node outputs as opaque dynamically-typed values.
//! Here they are a small tagged variant so the dispatcher can carry them
//! through `node_results` without losing structure, while the condition
//! evaluator still only ever sees a string.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use serde_json::Value;

/// The result of a single node invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Output {
    Text(String),
    Structured(Map<String, Value>),
}

impl Output {
    /// Canonical stringification used by the condition evaluator and by
    /// multi-predecessor input assembly. Structured values serialize through
    /// `serde_json` so the representation is stable regardless of key order.
    pub fn as_condition_text(&self) -> String {
        match self {
            Output::Text(s) => s.clone(),
            Output::Structured(map) => {
                serde_json::to_string(map).unwrap_or_else(|_| String::new())
            }
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_condition_text())
    }
}

impl From<String> for Output {
    fn from(value: String) -> Self {
        Output::Text(value)
    }
}

impl From<&str> for Output {
    fn from(value: &str) -> Self {
        Output::Text(value.to_string())
    }
}
