use crate::actors::messages::GatewayError;
use crate::models::Turn;
use async_trait::async_trait;

/// Defines the public interface for an LLM (Large Language Model) actor.
///
/// This trait abstracts the remote completion endpoint, so the pipeline can be
/// driven by a real HTTP client or by a mock in tests.
#[async_trait]
pub trait LlmActor: Send + Sync + 'static {
    /// Sends the system prompt, the prior turns and the new user message, and
    /// returns the completion text.
    async fn complete(
        &self,
        message: String,
        history: Vec<Turn>,
        system_prompt: String,
    ) -> Result<String, GatewayError>;
}
