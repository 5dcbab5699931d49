//! An offline [`ChatModel`] that never calls out to a network.
//!
//! Used as the node executor's fallback chat backend when no provider API
//! key is configured, so a workflow can still be exercised end to end
//! without live credentials.

use async_trait::async_trait;

use crate::chat::{ChatModel, ChatRequest, ChatResponse, Message};
use crate::error::Result;

/// Echoes back a deterministic acknowledgement of the last human message.
#[derive(Debug, Clone, Default)]
pub struct StubChatModel;

impl StubChatModel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChatModel for StubChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let last_prompt = request
            .messages
            .iter()
            .rev()
            .find_map(|m| m.text())
            .unwrap_or("");

        Ok(ChatResponse {
            message: Message::assistant(format!("[stub response to: {}]", last_prompt)),
            usage: None,
            metadata: Default::default(),
        })
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_last_human_message() {
        let model = StubChatModel::new();
        let req = ChatRequest::new(vec![Message::human("hello there")]);
        let resp = model.chat(req).await.unwrap();
        assert!(resp.message.text().unwrap().contains("hello there"));
    }
}
