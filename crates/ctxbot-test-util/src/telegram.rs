use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use ctxbot_lib::error::TelegramError;
use ctxbot_lib::telegram::{Chat, Message, TelegramApi, Update, User};

/// Telegram API double: serves queued update batches and records outgoing
/// calls.
#[derive(Default)]
pub struct RecordingTelegram {
    batches: Mutex<VecDeque<Result<Vec<Update>, TelegramError>>>,
    offsets: Mutex<Vec<i64>>,
    sent: Mutex<Vec<(i64, String)>>,
    webhooks: Mutex<Vec<(String, Option<String>)>>,
    deleted_webhooks: Mutex<usize>,
}

impl RecordingTelegram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch returned by the next `get_updates` call.
    pub fn push_updates(&self, updates: Vec<Update>) {
        self.batches.lock().unwrap().push_back(Ok(updates));
    }

    /// Queue a failing `get_updates` call.
    pub fn push_error(&self, description: &str) {
        self.batches.lock().unwrap().push_back(Err(TelegramError::Api {
            description: description.to_string(),
        }));
    }

    /// Every `(chat_id, text)` passed to `send_message`, in order.
    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts sent to `chat_id`, in order.
    pub fn sent_to(&self, chat_id: i64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == chat_id)
            .map(|(_, text)| text)
            .collect()
    }

    /// Offsets passed to `get_updates`, in order.
    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }

    pub fn webhooks(&self) -> Vec<(String, Option<String>)> {
        self.webhooks.lock().unwrap().clone()
    }

    pub fn deleted_webhooks(&self) -> usize {
        *self.deleted_webhooks.lock().unwrap()
    }

    /// Wait until at least `count` messages were sent, or `timeout` passes.
    pub async fn wait_for_sent(&self, count: usize, timeout: Duration) -> Vec<(i64, String)> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

#[async_trait]
impl TelegramApi for RecordingTelegram {
    async fn get_updates(
        &self,
        offset: i64,
        _timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        if let Some(batch) = next {
            return batch;
        }
        // Stand in for an idle long poll.
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(Vec::new())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn set_webhook(&self, url: &str, secret: Option<&str>) -> Result<(), TelegramError> {
        self.webhooks
            .lock()
            .unwrap()
            .push((url.to_string(), secret.map(str::to_string)));
        Ok(())
    }

    async fn delete_webhook(&self) -> Result<(), TelegramError> {
        *self.deleted_webhooks.lock().unwrap() += 1;
        Ok(())
    }
}

/// A text message update from user 1 in `chat_id`.
pub fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    Update {
        update_id,
        message: Some(Message {
            message_id: update_id,
            chat: Chat { id: chat_id },
            from: Some(User {
                id: 1,
                first_name: "Tester".into(),
                username: None,
            }),
            text: Some(text.to_string()),
        }),
    }
}
