use super::{GenerationError, Generator};
use crate::config::Config;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Outcome of one generation request. Failures stay distinguishable from
/// replies all the way into the `chats` table.
#[derive(Debug, Clone)]
pub enum Reply {
    Generated(String),
    Failed(GenerationError),
}

impl Reply {
    /// Text shown to the user and stored in `chats.bot_reply`.
    pub fn text(&self) -> String {
        match self {
            Reply::Generated(text) => text.clone(),
            Reply::Failed(err) => format!("⚠️ Sorry, I couldn't get a reply right now ({})", err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            timeout: config.generation_timeout,
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }
}

/// Wraps a [`Generator`] with a per-attempt deadline and exponential-backoff
/// retry. `generate` never returns an error to the caller.
#[derive(Clone)]
pub struct GenerationClient {
    inner: Arc<dyn Generator>,
    policy: RetryPolicy,
}

impl GenerationClient {
    pub fn new(inner: Arc<dyn Generator>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub async fn generate(&self, prompt: &str) -> Reply {
        let strategy = ExponentialBuilder::default()
            .with_min_delay(self.policy.base_delay)
            .with_max_times(self.policy.max_retries);

        let result = (|| self.attempt(prompt))
            .retry(strategy)
            .when(GenerationError::is_retryable)
            .notify(|err, delay| {
                warn!(
                    "Generation attempt failed ({}), retrying in {:?}",
                    err, delay
                );
            })
            .await;

        match result {
            Ok(text) => Reply::Generated(text),
            Err(err) => {
                info!("Generation gave up: {}", err);
                Reply::Failed(err)
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<String, GenerationError> {
        let text = tokio::time::timeout(self.policy.timeout, self.inner.generate(prompt))
            .await
            .map_err(|_| GenerationError::Timeout(self.policy.timeout))??;

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}
