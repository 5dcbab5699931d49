//! Chat model types and the [`ChatModel`] trait.
//!
//! These are the provider-agnostic message and request/response shapes every
//! client in this crate speaks, independent of any one backend's wire format.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Who produced a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    System,
    Human,
    Assistant,
    Tool,
    Custom(String),
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<String>,
    pub role: MessageRole,
    pub content: String,
    pub name: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl Message {
    fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: text.into(),
            name: None,
            metadata: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageRole::System, text)
    }

    pub fn human(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Human, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, text)
    }

    /// The message's text.
    pub fn text(&self) -> Option<&str> {
        Some(self.content.as_str())
    }
}

/// Token accounting for a single completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub reasoning_tokens: Option<usize>,
}

impl UsageMetadata {
    pub fn new(prompt_tokens: usize, completion_tokens: usize) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            reasoning_tokens: None,
        }
    }

    pub fn with_reasoning(
        prompt_tokens: usize,
        completion_tokens: usize,
        reasoning_tokens: usize,
    ) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            reasoning_tokens: Some(reasoning_tokens),
        }
    }
}

/// Per-request sampling and decoding parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
}

/// A request to a [`ChatModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    #[serde(default)]
    pub config: ChatConfig,
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }
}

/// A completed chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: Message,
    pub usage: Option<UsageMetadata>,
    pub metadata: HashMap<String, serde_json::Value>,
}

/// A chat-completion backend. Implementors own their own HTTP client and
/// authentication; the trait only fixes the request/response shape so the
/// engine crate can depend on it without knowing which provider is behind it.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    fn clone_box(&self) -> Box<dyn ChatModel>;
}

impl Clone for Box<dyn ChatModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_text_roundtrips() {
        let msg = Message::human("hello");
        assert_eq!(msg.text(), Some("hello"));
    }

    #[test]
    fn chat_request_builder_sets_config() {
        let req = ChatRequest::new(vec![Message::human("hi")]).with_temperature(0.5);
        assert_eq!(req.config.temperature, Some(0.5));
    }
}
