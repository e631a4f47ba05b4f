use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::TELEGRAM_API_BASE;
use crate::error::TelegramError;

use super::types::{ApiResponse, Update};

/// Extra time allowed on top of the long-poll timeout before the HTTP
/// request itself is abandoned.
const POLL_GRACE_SECS: u64 = 10;

/// Timeout for every call other than `getUpdates`.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// The subset of the Bot API the bot uses.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Long-poll for updates with `update_id >= offset`.
    async fn get_updates(&self, offset: i64, timeout_secs: u64)
    -> Result<Vec<Update>, TelegramError>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError>;

    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError>;

    async fn delete_webhook(&self) -> Result<(), TelegramError>;
}

#[derive(Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct SetWebhook<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_token: Option<&'a str>,
}

/// Bot API client over HTTPS.
pub struct HttpTelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTelegramApi {
    pub fn new(token: &str) -> Self {
        Self::with_base(TELEGRAM_API_BASE, token)
    }

    /// Client for a non-default API server (a local Bot API server, or a
    /// test double).
    pub fn with_base(api_base: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/bot{token}", api_base.trim_end_matches('/')),
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B, timeout: Duration) -> Result<T, TelegramError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(method, "Calling Telegram API");
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TelegramError::Transport {
                // reqwest errors include the URL, which carries the token.
                message: e.without_url().to_string(),
            })?;

        let text = response.text().await.map_err(|e| TelegramError::Transport {
            message: e.without_url().to_string(),
        })?;
        decode_response(&text)
    }
}

fn decode_response<T: DeserializeOwned>(text: &str) -> Result<T, TelegramError> {
    let envelope: ApiResponse<T> =
        serde_json::from_str(text).map_err(|e| TelegramError::MalformedResponse {
            message: e.to_string(),
        })?;
    if !envelope.ok {
        return Err(TelegramError::Api {
            description: envelope
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }
    envelope
        .result
        .ok_or_else(|| TelegramError::MalformedResponse {
            message: "ok response without result".into(),
        })
}

#[async_trait]
impl TelegramApi for HttpTelegramApi {
    async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdates {
                offset,
                timeout: timeout_secs,
                allowed_updates: ["message"],
            },
            Duration::from_secs(timeout_secs + POLL_GRACE_SECS),
        )
        .await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let _sent: serde_json::Value = self
            .call(
                "sendMessage",
                &SendMessage { chat_id, text },
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }

    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError> {
        let _accepted: bool = self
            .call(
                "setWebhook",
                &SetWebhook {
                    url,
                    secret_token: secret,
                },
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), TelegramError> {
        let _accepted: bool = self
            .call(
                "deleteWebhook",
                &serde_json::json!({}),
                Duration::from_secs(REQUEST_TIMEOUT_SECS),
            )
            .await?;
        Ok(())
    }
}
