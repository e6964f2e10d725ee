//! Bounded retry around any provider

use super::{LlmError, LlmProvider, LlmResponse, Message, ToolDefinition};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Retries retryable [`LlmError`]s with exponential backoff
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries,
            base_delay: Duration::from_millis(500),
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1 << attempt.min(6))
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<LlmResponse> {
        let mut attempt = 0;
        loop {
            match self.inner.chat(messages, tools).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    let retryable = e
                        .downcast_ref::<LlmError>()
                        .is_some_and(LlmError::is_retryable);
                    if !retryable || attempt >= self.max_retries {
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        provider = self.inner.name(),
                        attempt,
                        max_retries = self.max_retries,
                        "LLM request failed ({}), retrying in {:?}",
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
