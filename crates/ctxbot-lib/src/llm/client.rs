use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::LLM_RETRY_BACKOFF_MS;
use crate::error::GenerationError;
use crate::settings::LlmSettings;

use super::{GenerationRequest, Generator};

/// How many times a transient failure is retried, and how long to wait.
///
/// The wait grows linearly: `backoff * attempt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::from_millis(LLM_RETRY_BACKOFF_MS),
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for any `/chat/completions` endpoint (Groq, OpenAI, vLLM, Ollama).
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OpenAiCompatClient {
    pub fn new(settings: &LlmSettings) -> Result<Self, GenerationError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(GenerationError::MissingApiKey)?;
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| GenerationError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout: settings.timeout,
            retry: RetryPolicy {
                max_retries: settings.max_retries,
                ..RetryPolicy::default()
            },
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(url = %url, model = %request.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(&e))?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }
        parse_response(&body)
    }

    fn map_transport_error(&self, e: &reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout {
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            GenerationError::Transport {
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.backoff * attempt;
                    warn!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "Generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Extract `choices[0].message.content` from a completion response body.
pub fn parse_response(body: &str) -> Result<String, GenerationError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| GenerationError::MalformedResponse {
            message: format!("invalid JSON: {e}"),
        })?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::MalformedResponse {
            message: "no choices in response".into(),
        })?;
    choice
        .message
        .content
        .ok_or_else(|| GenerationError::MalformedResponse {
            message: "choice has no content".into(),
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;

    use super::*;
    use crate::llm::ChatMessage;

    /// Serve a fixed completion response on `/v1/chat/completions` after
    /// `delay`. Returns the base URL and a counter of requests received.
    async fn completion_server(
        status: StatusCode,
        body: &'static str,
        delay: Duration,
    ) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    (status, body)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{addr}/v1"), hits)
    }

    fn fast_retries(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    fn settings(base_url: &str, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            model: "test-model".into(),
            temperature: 0.7,
            max_tokens: 750,
            timeout: Duration::from_secs(2),
            max_retries: 0,
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            model: "test-model".into(),
            messages: vec![ChatMessage::user("hello")],
            temperature: 0.7,
            max_tokens: 750,
        }
    }

    #[test]
    fn parse_text_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Hi!"}}]}"#;
        assert_eq!(parse_response(body).unwrap(), "Hi!");
    }

    #[test]
    fn parse_response_no_choices() {
        let err = parse_response(r#"{"choices":[]}"#).unwrap_err();
        assert_eq!(err.to_string(), "malformed response: no choices in response");
        assert!(parse_response(r#"{"error":"oops"}"#).is_err());
    }

    #[test]
    fn parse_response_null_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            parse_response(body),
            Err(GenerationError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn parse_response_invalid_json() {
        assert!(parse_response("<html>").is_err());
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(matches!(
            OpenAiCompatClient::new(&settings("http://localhost", None)),
            Err(GenerationError::MissingApiKey)
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let client = OpenAiCompatClient::new(&settings("http://127.0.0.1:1/v1", Some("k"))).unwrap();
        let err = client.generate(&request()).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::Transport { .. }),
            "unexpected error: {err:?}"
        );
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let client = OpenAiCompatClient::new(&settings("http://127.0.0.1:1/v1", Some("k")))
            .unwrap()
            .with_retry(RetryPolicy {
                max_retries: 2,
                backoff: Duration::from_millis(1),
            });
        assert!(client.generate(&request()).await.is_err());
    }

    #[tokio::test]
    async fn success_returns_content() {
        let (url, hits) = completion_server(
            StatusCode::OK,
            r#"{"choices":[{"message":{"content":"hey"}}]}"#,
            Duration::ZERO,
        )
        .await;
        let client = OpenAiCompatClient::new(&settings(&url, Some("k")))
            .unwrap()
            .with_retry(fast_retries(2));

        assert_eq!(client.generate(&request()).await.unwrap(), "hey");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_errors_are_retried_up_to_the_limit() {
        let (url, hits) =
            completion_server(StatusCode::SERVICE_UNAVAILABLE, "overloaded", Duration::ZERO).await;
        let client = OpenAiCompatClient::new(&settings(&url, Some("k")))
            .unwrap()
            .with_retry(fast_retries(2));

        let err = client.generate(&request()).await.unwrap_err();
        assert!(
            matches!(&err, GenerationError::Status { status: 503, body } if body == "overloaded"),
            "unexpected error: {err:?}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (url, hits) =
            completion_server(StatusCode::BAD_REQUEST, "bad model", Duration::ZERO).await;
        let client = OpenAiCompatClient::new(&settings(&url, Some("k")))
            .unwrap()
            .with_retry(fast_retries(2));

        let err = client.generate(&request()).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::Status { status: 400, .. }),
            "unexpected error: {err:?}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_server_times_out_with_sub_second_timeout() {
        let (url, hits) = completion_server(
            StatusCode::OK,
            r#"{"choices":[{"message":{"content":"late"}}]}"#,
            Duration::from_secs(5),
        )
        .await;
        let client = OpenAiCompatClient::new(&LlmSettings {
            timeout: Duration::from_millis(200),
            ..settings(&url, Some("k"))
        })
        .unwrap();

        let err = client.generate(&request()).await.unwrap_err();
        assert!(
            matches!(err, GenerationError::Timeout { timeout_ms: 200 }),
            "unexpected error: {err:?}"
        );
        assert_eq!(err.to_string(), "request timed out after 200ms");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
