//! Generative-text provider.
//!
//! [`TextGenerator`] is the seam the ingestion pipeline talks to;
//! [`HttpGenerator`] implements it against an OpenAI-compatible endpoint,
//! streaming first and falling back to a single request after a soft deadline.

mod client;
mod types;

pub use client::*;
pub use types::*;

use async_trait::async_trait;

use crate::error::GeneratorResult;

/// Produces free text for a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Complete the conversation and return the model's text.
    async fn generate(&self, messages: Vec<Message>) -> GeneratorResult<String>;
}
