use crate::actors::llm::LlmActorHandle;
use crate::actors::messages::{ActorError, SupervisorMessage};
use crate::actors::traits::LlmActor;
use crate::brain::{Reply, Responder, SystemClock, ThreadRngPicker};
use crate::config::{AppConfig, GatewayConfig};
use crate::error::{AppError, ValidationError};
use crate::models::{AskRequest, AskResponse, CommunityContext, Provider};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument, warn};

/// Questions are cut to this many characters before they reach the logs.
const LOG_PREVIEW_CHARS: usize = 100;

/// Time the handle allows on top of the gateway bound for local work.
const PIPELINE_GRACE: Duration = Duration::from_secs(10);

/// A handle to the `SupervisorActor`.
///
/// This is the primary entry point for all business logic. It runs the local
/// classifier first and only calls the completion gateway when no intent matched.
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMessage>,
    ask_timeout: Duration,
    gateway_configured: bool,
}

impl SupervisorHandle {
    /// Creates the production supervisor from the loaded configuration.
    ///
    /// The completion gateway is spawned only when an API key is present.
    pub fn new(config: &AppConfig) -> Self {
        let responder = Responder::new(
            config.job_result_cap,
            Arc::new(ThreadRngPicker),
            Arc::new(SystemClock::with_offset_hours(config.utc_offset_hours)),
        );
        let gateway = production_gateway(&config.gateway);
        Self::with_actors(config, gateway, responder)
    }

    /// Creates a supervisor around an explicit gateway and responder.
    ///
    /// # Arguments
    ///
    /// * `config` - Pipeline limits and the fallback policy.
    /// * `gateway` - The completion actor, or `None` when no credential is configured.
    /// * `responder` - The local classifier and template responder.
    pub fn with_actors<L: LlmActor>(
        config: &AppConfig,
        gateway: Option<Arc<L>>,
        responder: Responder,
    ) -> Self {
        let gateway_configured = gateway.is_some();
        let pipeline = AskPipeline {
            responder,
            gateway,
            system_prompt: config.gateway.system_prompt.clone(),
            max_question_chars: config.max_question_chars,
            fallback_enabled: config.fallback_enabled,
        };
        let (sender, receiver) = mpsc::channel(32);
        let actor = SupervisorRunner::new(receiver, pipeline);
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            ask_timeout: config.gateway.timeout + PIPELINE_GRACE,
            gateway_configured,
        }
    }

    /// Whether a completion gateway is attached.
    pub fn gateway_configured(&self) -> bool {
        self.gateway_configured
    }

    /// Answers one widget question.
    ///
    /// The pipeline is:
    /// 1. Validate the question (non-empty, bounded length).
    /// 2. Try the local intent classifier.
    /// 3. Call the completion gateway if one is configured.
    /// 4. Fall back to the generic contextual template.
    #[instrument(skip(self, request), fields(question = %preview(&request.question)))]
    pub async fn ask(&self, request: AskRequest) -> Result<AskResponse, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = SupervisorMessage::Ask {
            request,
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::Unavailable(e.to_string()))?;
        timeout(self.ask_timeout, recv)
            .await?
            .map_err(|e| ActorError::Unavailable(e.to_string()))?
    }

    /// Stops the supervisor. Requests already in flight still complete.
    pub async fn shutdown(&self) -> Result<(), AppError> {
        self.sender
            .send(SupervisorMessage::Shutdown)
            .await
            .map_err(|e| ActorError::Unavailable(e.to_string()).into())
    }
}

fn production_gateway(config: &GatewayConfig) -> Option<Arc<LlmActorHandle>> {
    if !config.is_configured() {
        info!("No API key configured, answering with local templates only");
        return None;
    }
    match LlmActorHandle::new(config.clone()) {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            error!("Completion gateway disabled: {}", e);
            None
        }
    }
}

/// First `LOG_PREVIEW_CHARS` characters of a question.
fn preview(question: &str) -> String {
    let mut chars = question.chars();
    let head: String = chars.by_ref().take(LOG_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}

/// Trims the question and checks it against the configured bounds.
pub fn validate_question(question: &str, max_chars: usize) -> Result<&str, ValidationError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }
    let actual = trimmed.chars().count();
    if actual > max_chars {
        return Err(ValidationError::TooLong {
            max: max_chars,
            actual,
        });
    }
    Ok(trimmed)
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// --- Pipeline ---
struct AskPipeline<L: LlmActor> {
    responder: Responder,
    gateway: Option<Arc<L>>,
    system_prompt: String,
    max_question_chars: usize,
    fallback_enabled: bool,
}

impl<L: LlmActor> AskPipeline<L> {
    async fn answer(&self, request: AskRequest) -> Result<AskResponse, AppError> {
        let question = validate_question(&request.question, self.max_question_chars)?;
        let community = request.community.unwrap_or_default();
        let jobs = request.jobs.unwrap_or_default();

        if let Some(classification) = self.responder.classify(question, &community, &jobs) {
            info!(intent = %classification.intent, "Answered locally");
            return Ok(respond(&request.question, classification.reply, Provider::CommunityBot));
        }

        let Some(gateway) = &self.gateway else {
            if !self.fallback_enabled {
                return Err(AppError::Config(
                    "no completion gateway is configured and fallback is disabled".to_string(),
                ));
            }
            return Ok(self.fallback(&request.question, question, &community));
        };

        match gateway
            .complete(question.to_string(), request.history, self.system_prompt.clone())
            .await
        {
            Ok(answer) => {
                info!("Answered by the completion gateway");
                Ok(respond(&request.question, Reply::Text(answer), Provider::Deepseek))
            }
            Err(e) if self.fallback_enabled => {
                warn!("Completion gateway failed, using fallback: {}", e);
                Ok(self.fallback(&request.question, question, &community))
            }
            Err(e) => Err(AppError::Upstream(e)),
        }
    }

    fn fallback(&self, asked: &str, question: &str, community: &CommunityContext) -> AskResponse {
        let text = self.responder.fallback(question, community);
        respond(asked, Reply::Text(text), Provider::Fallback)
    }
}

/// Builds the success body. `asked` is the question exactly as the caller sent it.
fn respond(asked: &str, answer: Reply, provider: Provider) -> AskResponse {
    AskResponse {
        kind: answer.kind(),
        answer,
        question: asked.to_string(),
        timestamp: now_timestamp(),
        provider,
    }
}

// --- Actor Runner ---
struct SupervisorRunner<L: LlmActor> {
    receiver: mpsc::Receiver<SupervisorMessage>,
    pipeline: Arc<AskPipeline<L>>,
}

impl<L: LlmActor> SupervisorRunner<L> {
    fn new(receiver: mpsc::Receiver<SupervisorMessage>, pipeline: AskPipeline<L>) -> Self {
        Self {
            receiver,
            pipeline: Arc::new(pipeline),
        }
    }

    async fn run(mut self) {
        info!("Supervisor started");
        while let Some(msg) = self.receiver.recv().await {
            if !self.handle_message(msg) {
                break;
            }
        }
        info!("Supervisor stopped");
    }

    /// Returns `false` once the supervisor should stop.
    fn handle_message(&self, msg: SupervisorMessage) -> bool {
        match msg {
            SupervisorMessage::Ask { request, responder } => {
                let pipeline = Arc::clone(&self.pipeline);
                tokio::spawn(async move {
                    let result = pipeline.answer(request).await;
                    if let Err(e) = &result {
                        error!("Error answering question: {}", e);
                    }
                    let _ = responder.send(result);
                });
                true
            }
            SupervisorMessage::Shutdown => {
                info!("Supervisor shutting down...");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_question_trims() {
        assert_eq!(validate_question("  Привет  ", 10).unwrap(), "Привет");
    }

    #[test]
    fn test_validate_question_rejects_whitespace() {
        assert_eq!(validate_question(" \n\t ", 10), Err(ValidationError::Empty));
    }

    #[test]
    fn test_validate_question_counts_characters_not_bytes() {
        // 6 Cyrillic characters, 12 bytes
        assert!(validate_question("вахта!", 6).is_ok());
        assert_eq!(
            validate_question("вахта!!", 6),
            Err(ValidationError::TooLong { max: 6, actual: 7 })
        );
    }

    #[test]
    fn test_preview_truncates_long_questions() {
        let long = "я".repeat(150);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), LOG_PREVIEW_CHARS + 1);
        assert!(shown.ends_with('…'));
        assert_eq!(preview("коротко"), "коротко");
    }

    #[test]
    fn test_timestamp_is_rfc3339_millis_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // 2024-01-01T00:00:00.000Z
        assert_eq!(ts.len(), 24);
    }
}
