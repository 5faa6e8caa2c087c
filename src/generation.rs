use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use rig::providers::{anthropic, gemini, openai};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

mod client;
mod preamble;
mod rig_generator;

pub use client::{GenerationClient, Reply, RetryPolicy};
use rig_generator::RigGenerator;

#[cfg(test)]
pub(crate) use client::tests::{FlakyGenerator, fast_policy};

#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("generation service error: {0}")]
    Service(String),
    #[error("generation service did not answer within {0:?}")]
    Timeout(Duration),
    #[error("generation service returned an empty reply")]
    EmptyResponse,
}

impl GenerationError {
    /// Stable tag persisted in `chats.error_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Service(_) => "service",
            GenerationError::Timeout(_) => "timeout",
            GenerationError::EmptyResponse => "empty_response",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::Service(_) | GenerationError::Timeout(_)
        )
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

pub fn create_generator(config: &Config) -> Result<Arc<dyn Generator>> {
    match config.api_provider.as_str() {
        "openai" => {
            let mut builder = openai::CompletionsClient::builder().api_key(&config.api_key);
            if let Some(url) = config.api_url.as_deref() {
                builder = builder.base_url(url);
            }
            let client: openai::CompletionsClient = builder.build()?;
            Ok(Arc::new(RigGenerator::new(client, &config.model)))
        }
        "anthropic" => {
            let mut builder = anthropic::Client::builder().api_key(&config.api_key);
            if let Some(url) = config.api_url.as_deref() {
                builder = builder.base_url(url);
            }
            let client: anthropic::Client = builder.build()?;
            Ok(Arc::new(RigGenerator::new(client, &config.model)))
        }
        _ => {
            let client = gemini::Client::new(&config.api_key)?;
            Ok(Arc::new(RigGenerator::new(client, &config.model)))
        }
    }
}
