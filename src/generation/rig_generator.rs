use super::{GenerationError, Generator, preamble};
use async_trait::async_trait;
use rig::{client::CompletionClient, completion::Prompt};
use tracing::debug;

const MAX_REPLY_TOKENS: u64 = 1024;

pub struct RigGenerator<C: CompletionClient> {
    client: C,
    model: String,
}

impl<C: CompletionClient> RigGenerator<C> {
    pub fn new(client: C, model: &str) -> Self {
        Self {
            client,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl<C> Generator for RigGenerator<C>
where
    C: CompletionClient + Send + Sync,
    C::CompletionModel: 'static,
{
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let agent = self
            .client
            .agent(&self.model)
            .preamble(&preamble::build_preamble())
            .max_tokens(MAX_REPLY_TOKENS)
            .build();

        debug!("Sending prompt to {} ({} chars)", self.model, prompt.len());

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| GenerationError::Service(e.to_string()))?;

        Ok(response.to_string())
    }
}
