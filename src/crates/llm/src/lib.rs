//! LLM provider implementations for the workflow execution engine.
//!
//! This crate defines a provider-agnostic [`ChatModel`] trait plus the
//! message and request/response types every client speaks, and ships one
//! concrete remote provider (OpenAI-compatible HTTP APIs) plus an offline
//! stub used when no API key is configured.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::OpenAiClient;
//! use llm::config::RemoteLlmConfig;
//! use llm::{ChatModel, ChatRequest, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RemoteLlmConfig::from_env(
//!         "OPENAI_API_KEY",
//!         "https://api.openai.com/v1",
//!         "gpt-4"
//!     )?;
//!     let client = OpenAiClient::new(config);
//!
//!     let request = ChatRequest::new(vec![
//!         Message::human("Explain quantum computing briefly")
//!     ]).with_temperature(0.7);
//!
//!     let response = client.chat(request).await?;
//!     println!("Response: {}", response.message.text().unwrap());
//!
//!     Ok(())
//! }
//! ```

pub mod chat;
pub mod config;
pub mod error;
pub mod remote;
pub mod stub;

pub use chat::{ChatConfig, ChatModel, ChatRequest, ChatResponse, Message, MessageRole, UsageMetadata};
pub use config::RemoteLlmConfig;
pub use error::{LlmError, Result};
pub use stub::StubChatModel;
