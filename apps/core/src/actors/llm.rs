use crate::actors::messages::{GatewayError, LlmMessage};
use crate::actors::traits::LlmActor;
use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::models::{Role, Turn};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Extra time the handle waits on top of the HTTP bound before giving up on the actor.
const MAILBOX_GRACE: Duration = Duration::from_secs(5);

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    call_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task. Fails with
    /// `AppError::Config` when no API key is configured.
    pub fn new(config: GatewayConfig) -> Result<Self, AppError> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AppError::Config("DEEPSEEK_API_KEY is not set, the completion gateway is disabled".to_string())
        })?;
        let client = Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let call_timeout = config.timeout + MAILBOX_GRACE;
        let (sender, receiver) = mpsc::channel(32);
        let actor = LlmActorRunner::new(receiver, CompletionClient::new(client, config, api_key));
        tokio::spawn(async move { actor.run().await });
        Ok(Self {
            sender,
            call_timeout,
        })
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn complete(
        &self,
        message: String,
        history: Vec<Turn>,
        system_prompt: String,
    ) -> Result<String, GatewayError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Complete {
            message,
            history,
            system_prompt,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        timeout(self.call_timeout, recv)
            .await
            .map_err(|_| GatewayError::Timeout(self.call_timeout.as_secs()))?
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?
    }
}

// --- Wire format (OpenAI-compatible chat completions) ---

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Builds the role-tagged sequence: system prompt, prior turns, then the new message.
fn build_messages<'a>(
    system_prompt: &'a str,
    history: &'a [Turn],
    message: &'a str,
) -> Vec<WireMessage<'a>> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(WireMessage {
        role: Role::System,
        content: system_prompt,
    });
    messages.extend(history.iter().map(|turn| WireMessage {
        role: turn.role,
        content: &turn.content,
    }));
    messages.push(WireMessage {
        role: Role::User,
        content: message,
    });
    messages
}

/// Pulls the machine-readable `error.message` out of an upstream error body, if any.
fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|detail| detail.message)
}

// --- HTTP client ---
struct CompletionClient {
    client: Client,
    config: GatewayConfig,
    api_key: SecretString,
}

impl CompletionClient {
    fn new(client: Client, config: GatewayConfig, api_key: SecretString) -> Self {
        Self {
            client,
            config,
            api_key,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn complete(
        &self,
        message: &str,
        history: &[Turn],
        system_prompt: &str,
    ) -> Result<String, GatewayError> {
        let payload = ChatCompletionRequest {
            model: &self.config.model,
            messages: build_messages(system_prompt, history, message),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        timeout(self.config.timeout, self.send(&payload, history.len()))
            .await
            .map_err(|_| GatewayError::Timeout(self.config.timeout.as_secs()))?
    }

    /// One POST, including reading the body. The caller bounds it in time.
    async fn send(
        &self,
        payload: &ChatCompletionRequest<'_>,
        turns: usize,
    ) -> Result<String, GatewayError> {
        let url = self.endpoint();
        debug!(%url, turns, "Sending chat completion request");

        let res = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(payload)
            .send()
            .await?;

        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            let message = upstream_message(&body);
            warn!(status = status.as_u16(), ?message, "Completion request rejected upstream");
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body = res.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)
            .map_err(|e| GatewayError::InvalidResponse(format!("undecodable body: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                GatewayError::InvalidResponse("missing choices[0].message.content".to_string())
            })
    }
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    client: Arc<CompletionClient>,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, client: CompletionClient) -> Self {
        Self {
            receiver,
            client: Arc::new(client),
        }
    }

    async fn run(mut self) {
        info!(endpoint = %self.client.endpoint(), "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    /// Each completion runs in its own task so a slow upstream call does not
    /// hold up the mailbox.
    fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::Complete {
                message,
                history,
                system_prompt,
                responder,
            } => {
                let client = Arc::clone(&self.client);
                tokio::spawn(async move {
                    let result = client.complete(&message, &history, &system_prompt).await;
                    if let Err(e) = &result {
                        error!("Completion failed: {}", e);
                    }
                    let _ = responder.send(result);
                });
            }
        }
    }
}
