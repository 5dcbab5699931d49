//! Remote LLM provider implementations.
//!
//! Cloud-hosted chat APIs that require an API key. Today this is a single
//! OpenAI-compatible client; adding another provider means implementing
//! [`crate::ChatModel`] against its wire format the same way.

pub mod openai;

pub use openai::OpenAiClient;
