//! LLM provider abstraction and the OpenAI implementation

mod error;
mod openai;
mod retry;
mod types;

pub use error::LlmError;
pub use openai::OpenAiProvider;
pub use retry::RetryingProvider;
pub use types::*;

use crate::config::LlmConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Send a chat completion request (non-streaming)
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse>;
}

/// Create the OpenAI provider wrapped with the configured retry count
pub fn create_provider(
    api_key: &str,
    config: &LlmConfig,
    model: Option<&str>,
) -> Result<Arc<dyn LlmProvider>> {
    let mut provider = OpenAiProvider::new(api_key, config)?;
    if let Some(model) = model {
        provider = provider.with_model(model);
    }
    tracing::debug!(
        "Created openai provider (model: {}, retries: {})",
        provider.model(),
        config.max_retries
    );

    Ok(Arc::new(RetryingProvider::new(
        Arc::new(provider),
        config.max_retries,
    )))
}
