//! The Telegram bot: per-update dispatch plus the two delivery modes.

pub mod handlers;
pub mod polling;
pub mod replies;
pub mod webhook;

use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ctxbot_lib::config::TELEGRAM_MESSAGE_LIMIT;
use ctxbot_lib::error::TelegramError;
use ctxbot_lib::pipeline::{Responder, Retriever};
use ctxbot_lib::runtime::Runtime;
use ctxbot_lib::search::WebSearch;
use ctxbot_lib::telegram::{TelegramApi, Update, split_message};

/// Which integrations this bot instance has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub knowledge: bool,
    pub generation: bool,
    pub search: bool,
    pub chat: bool,
}

impl fmt::Display for Features {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool| if on { "on" } else { "off" };
        write!(
            f,
            "knowledge={} generation={} search={} chat={}",
            flag(self.knowledge),
            flag(self.generation),
            flag(self.search),
            flag(self.chat)
        )
    }
}

/// Everything a handler needs. Read-only once built.
pub struct BotContext {
    pub telegram: Arc<dyn TelegramApi>,
    pub retriever: Option<Retriever>,
    pub responder: Option<Responder>,
    pub search: Option<Arc<dyn WebSearch>>,
    pub top_k: usize,
    pub summary_language: String,
    pub chat_enabled: bool,
}

impl BotContext {
    /// Build the context from settings.
    ///
    /// When the knowledge base is enabled it is loaded here, and a load
    /// failure is fatal: the bot must not start serving without it.
    pub fn from_runtime(runtime: &Runtime) -> anyhow::Result<Self> {
        let settings = &runtime.settings;
        let telegram = runtime.services.telegram(settings)?;

        let retriever = if settings.knowledge_enabled {
            Some(
                runtime
                    .retriever()
                    .context("Knowledge base unavailable; set CTXBOT_KNOWLEDGE=false to run without it")?,
            )
        } else {
            None
        };

        let responder = runtime.responder()?;
        if responder.is_none() {
            warn!("No LLM API key configured; generation commands are disabled");
        }
        let search = runtime.services.web_search(settings)?;

        Ok(Self {
            telegram,
            retriever,
            responder,
            search,
            top_k: settings.top_k,
            summary_language: settings.summary_language.clone(),
            chat_enabled: settings.chat_enabled,
        })
    }

    pub fn features(&self) -> Features {
        Features {
            knowledge: self.retriever.is_some(),
            generation: self.responder.is_some(),
            search: self.search.is_some(),
            chat: self.chat_enabled && self.responder.is_some(),
        }
    }
}

/// Cheap handle to the shared bot context.
#[derive(Clone)]
pub struct Bot {
    ctx: Arc<BotContext>,
}

impl Bot {
    pub fn new(ctx: BotContext) -> Self {
        Self { ctx: Arc::new(ctx) }
    }

    pub fn from_runtime(runtime: &Runtime) -> anyhow::Result<Self> {
        let bot = Self::new(BotContext::from_runtime(runtime)?);
        info!(features = %bot.ctx.features(), "Bot initialized");
        Ok(bot)
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    pub fn telegram(&self) -> &Arc<dyn TelegramApi> {
        &self.ctx.telegram
    }

    /// Handle `update` on its own task. Handlers never block each other.
    pub fn dispatch(&self, update: Update) -> JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move { handlers::handle_update(&ctx, update).await })
    }
}

/// Sends replies to one chat, splitting long texts into several messages.
pub struct ChatReplier<'a> {
    api: &'a dyn TelegramApi,
    chat_id: i64,
}

impl<'a> ChatReplier<'a> {
    pub fn new(api: &'a dyn TelegramApi, chat_id: i64) -> Self {
        Self { api, chat_id }
    }

    pub async fn send(&self, text: &str) -> Result<(), TelegramError> {
        let text = if text.trim().is_empty() {
            replies::EMPTY_REPLY
        } else {
            text
        };
        // Telegram rejects blank messages, and a split can leave a blank tail.
        for segment in split_message(text, TELEGRAM_MESSAGE_LIMIT) {
            if segment.trim().is_empty() {
                continue;
            }
            self.api.send_message(self.chat_id, &segment).await?;
        }
        Ok(())
    }
}
