use serde::Serialize;
use tokio::sync::oneshot;

use crate::models::{AskRequest, AskResponse, Turn};

/// Defines errors that can occur within the actor system.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq, Eq)]
pub enum ActorError {
    /// The actor's mailbox is closed or the reply channel was dropped.
    #[error("Actor unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the remote completion gateway.
#[derive(Debug, thiserror::Error, Serialize, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The network call could not complete.
    #[error("transport error: {0}")]
    Transport(String),
    /// The endpoint answered with a non-success status.
    #[error("upstream returned status {status}{}", suffix(.message))]
    Upstream { status: u16, message: Option<String> },
    /// The success payload lacks the expected completion field.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The call did not finish within the configured bound.
    #[error("completion timed out after {0} s")]
    Timeout(u64),
    /// No actor is listening anymore.
    #[error("gateway actor unavailable: {0}")]
    Unavailable(String),
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Messages that can be sent to the `LlmActor`.
#[derive(Debug)]
pub enum LlmMessage {
    /// A request for one chat completion.
    Complete {
        message: String,
        history: Vec<Turn>,
        system_prompt: String,
        /// A channel to send the completion text back.
        responder: oneshot::Sender<Result<String, GatewayError>>,
    },
}

/// Messages that can be sent to the `SupervisorActor`.
#[derive(Debug)]
pub enum SupervisorMessage {
    /// A request to answer one question from the widget.
    Ask {
        request: AskRequest,
        /// A channel to send the final answer back.
        responder: oneshot::Sender<Result<AskResponse, crate::error::AppError>>,
    },
    /// A command to shut down the supervisor.
    Shutdown,
}
