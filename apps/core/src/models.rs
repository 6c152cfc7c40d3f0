use serde::{Deserialize, Serialize};
use std::fmt;

use crate::brain::jobs::JobBoard;
use crate::brain::responder::Reply;

/// Descriptive record of the community the widget is embedded in.
///
/// Read-only for the brain: values are only interpolated into templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityContext {
    /// Display name of the community.
    pub name: String,
    /// Subscriber count as shown to users.
    pub subscribers: Subscribers,
    /// Typical response time of the administrators (free text, e.g. "15 минут").
    pub response_time: String,
    /// Contact phone, if the community publishes one.
    pub phone: Option<String>,
    /// Home city of the community.
    pub city: Option<String>,
}

impl Default for CommunityContext {
    fn default() -> Self {
        Self {
            name: "Вахта".to_string(),
            subscribers: Subscribers::default(),
            response_time: "несколько минут".to_string(),
            phone: None,
            city: None,
        }
    }
}

/// Subscriber count: a number, or a preformatted label such as "12.5K".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Subscribers {
    Count(serde_json::Number),
    Label(String),
}

impl Default for Subscribers {
    fn default() -> Self {
        Subscribers::Count(0u64.into())
    }
}

impl From<u64> for Subscribers {
    fn from(count: u64) -> Self {
        Subscribers::Count(count.into())
    }
}

impl fmt::Display for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscribers::Count(count) => write!(f, "{}", count),
            Subscribers::Label(label) => f.write_str(label),
        }
    }
}

/// The role of a message sender in a chat-completion conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single (role, content) pair of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Inbound request from the widget.
///
/// `message` is accepted as an alias of `question`, since the standalone page sends it that way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default, alias = "message")]
    pub question: String,
    #[serde(default)]
    pub community: Option<CommunityContext>,
    #[serde(default)]
    pub jobs: Option<JobBoard>,
    #[serde(default)]
    pub history: Vec<Turn>,
}

impl AskRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }
}

/// Shape of the `answer` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerKind {
    Text,
    Jobs,
}

/// Which path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// A local intent matched.
    CommunityBot,
    /// The remote completion gateway answered.
    Deepseek,
    /// Generic local template after the gateway was unavailable.
    Fallback,
}

/// Outbound success body.
#[derive(Debug, Clone, Serialize)]
pub struct AskResponse {
    pub answer: Reply,
    #[serde(rename = "type")]
    pub kind: AnswerKind,
    pub question: String,
    /// RFC 3339, UTC, millisecond precision.
    pub timestamp: String,
    pub provider: Provider,
}

/// Outbound error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ErrorBody {
    pub fn new(error: &str, message: Option<String>) -> Self {
        Self {
            error: error.to_string(),
            message,
            allowed: None,
        }
    }
}
