//! Actor System Tests
//!
//! The completion gateway against a mock HTTP endpoint, plus the mock gateway
//! shared by the supervisor and server suites.

use crate::actors::llm::LlmActorHandle;
use crate::actors::messages::GatewayError;
use crate::actors::traits::LlmActor;
use crate::config::GatewayConfig;
use crate::models::{Role, Turn};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration};
use url::Url;

// ============================================================================
// Mock Actors for Testing
// ============================================================================

/// One recorded `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub message: String,
    pub history: Vec<Turn>,
    pub system_prompt: String,
}

/// Mock LLM Actor that returns a fixed outcome and records its inputs
pub struct MockLlmActor {
    pub outcome: Result<String, GatewayError>,
    pub delay_ms: u64,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockLlmActor {
    pub fn new(response: &str) -> Self {
        Self {
            outcome: Ok(response.to_string()),
            delay_ms: 0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self {
            outcome: Err(error),
            delay_ms: 0,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmActor for MockLlmActor {
    async fn complete(
        &self,
        message: String,
        history: Vec<Turn>,
        system_prompt: String,
    ) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall {
            message,
            history,
            system_prompt,
        });
        if self.delay_ms > 0 {
            sleep(Duration::from_millis(self.delay_ms)).await;
        }
        self.outcome.clone()
    }
}

// ============================================================================
// Gateway Tests (HTTP)
// ============================================================================

#[cfg(test)]
mod gateway_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn setup_test_actor(server_url: &str, timeout_ms: u64) -> LlmActorHandle {
        let config = GatewayConfig {
            base_url: Url::parse(server_url).unwrap(),
            api_key: Some(SecretString::from("sk-test")),
            model: "deepseek-chat".to_string(),
            max_tokens: 256,
            temperature: 0.5,
            timeout: Duration::from_millis(timeout_ms),
            ..Default::default()
        };
        LlmActorHandle::new(config).expect("gateway with a key must start")
    }

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_request_carries_prompt_history_and_message_in_order() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_json(json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "system", "content": "Ты помощник"},
                    {"role": "user", "content": "Привет"},
                    {"role": "assistant", "content": "Здравствуйте!"},
                    {"role": "user", "content": "Что такое вахта?"}
                ],
                "max_tokens": 256,
                "temperature": 0.5,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("Вахта - это...")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 5_000);
        let history = vec![
            Turn::new(Role::User, "Привет"),
            Turn::new(Role::Assistant, "Здравствуйте!"),
        ];
        let answer = handle
            .complete(
                "Что такое вахта?".to_string(),
                history,
                "Ты помощник".to_string(),
            )
            .await
            .unwrap();

        assert_eq!(answer, "Вахта - это...");
    }

    #[tokio::test]
    async fn test_base_url_with_path_prefix_and_trailing_slash() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("ok")))
            .expect(1)
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&format!("{}/v1/", mock_server.uri()), 5_000);
        let answer = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await;

        assert_eq!(answer.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_auth_failure_reports_status_and_upstream_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {
                    "message": "Authentication Fails (no such user)",
                    "type": "authentication_error"
                }
            })))
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 5_000);
        let err = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream {
                status: 401,
                message: Some("Authentication Fails (no such user)".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_non_json_error_body_has_no_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 5_000);
        let err = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Upstream {
                status: 503,
                message: None
            }
        );
    }

    #[tokio::test]
    async fn test_success_without_content_is_invalid_response() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant"}}]
            })))
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 5_000);
        let err = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("too late"))
                    .set_delay(Duration::from_millis(1_500)),
            )
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 200);
        let err = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, GatewayError::Timeout(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) is not expected to accept HTTP connections.
        let handle = setup_test_actor("http://127.0.0.1:9", 2_000);
        let err = handle
            .complete("hi".to_string(), vec![], "sys".to_string())
            .await
            .unwrap_err();

        assert!(
            matches!(err, GatewayError::Transport(_) | GatewayError::Timeout(_)),
            "got {:?}",
            err
        );
    }

    #[tokio::test]
    async fn test_concurrent_completions_are_not_serialized() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion("ok"))
                    .set_delay(Duration::from_millis(300)),
            )
            .expect(4)
            .mount(&mock_server)
            .await;

        let handle = setup_test_actor(&mock_server.uri(), 5_000);
        let started = std::time::Instant::now();
        let mut tasks = Vec::new();
        for i in 0..4 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle
                    .complete(format!("q{}", i), vec![], "sys".to_string())
                    .await
            }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "ok");
        }

        // Four sequential calls would take at least 1.2 s.
        assert!(started.elapsed() < Duration::from_millis(1_100));
    }
}

// ============================================================================
// Mock Actor Tests
// ============================================================================

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_llm_records_inputs() {
        let mock = MockLlmActor::new("answer");
        let result = mock
            .complete(
                "q".to_string(),
                vec![Turn::new(Role::User, "earlier")],
                "sys".to_string(),
            )
            .await;

        assert_eq!(result.unwrap(), "answer");
        let calls = mock.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].message, "q");
        assert_eq!(calls[0].history.len(), 1);
        assert_eq!(calls[0].system_prompt, "sys");
    }

    #[tokio::test]
    async fn test_mock_llm_failure() {
        let mock = MockLlmActor::failing(GatewayError::Transport("down".to_string()));
        let result = mock.complete("q".to_string(), vec![], "sys".to_string()).await;
        assert_eq!(result, Err(GatewayError::Transport("down".to_string())));
        assert_eq!(mock.call_count(), 1);
    }
}
