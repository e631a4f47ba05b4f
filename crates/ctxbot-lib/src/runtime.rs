//! Wiring from [`Settings`] to live service clients.
//!
//! Commands never construct clients directly; they ask the [`Runtime`], whose
//! [`Services`] implementation decides what backs each integration. Tests
//! substitute fakes through the same trait.

use std::sync::Arc;

use anyhow::Context;

use crate::embedding::{Embedder, QueryEncoder};
use crate::index::{KnowledgeBase, KnowledgeHandle};
use crate::llm::{Generator, OpenAiCompatClient};
use crate::pipeline::{Responder, Retriever, SamplingParams};
use crate::search::{TavilyClient, WebSearch};
use crate::settings::Settings;
use crate::telegram::{HttpTelegramApi, TelegramApi};

/// Factory for every external integration.
pub trait Services: Send + Sync {
    fn encoder(&self, settings: &Settings) -> anyhow::Result<Arc<dyn QueryEncoder>>;

    /// `None` when no generation API key is configured.
    fn generator(&self, settings: &Settings) -> anyhow::Result<Option<Arc<dyn Generator>>>;

    /// `None` when no search API key is configured.
    fn web_search(&self, settings: &Settings) -> anyhow::Result<Option<Arc<dyn WebSearch>>>;

    fn telegram(&self, settings: &Settings) -> anyhow::Result<Arc<dyn TelegramApi>>;
}

/// Real network clients and the on-disk embedding model.
pub struct LiveServices;

impl Services for LiveServices {
    fn encoder(&self, settings: &Settings) -> anyhow::Result<Arc<dyn QueryEncoder>> {
        let embedder: Arc<dyn QueryEncoder> = Arc::new(Embedder::new(&settings.model_dir)?);
        Ok(embedder)
    }

    fn generator(&self, settings: &Settings) -> anyhow::Result<Option<Arc<dyn Generator>>> {
        if settings.llm.api_key.is_none() {
            return Ok(None);
        }
        let client = OpenAiCompatClient::new(&settings.llm)
            .context("Failed to create the generation client")?;
        let generator: Arc<dyn Generator> = Arc::new(client);
        Ok(Some(generator))
    }

    fn web_search(&self, settings: &Settings) -> anyhow::Result<Option<Arc<dyn WebSearch>>> {
        let Some(key) = settings.tavily_api_key.as_deref() else {
            return Ok(None);
        };
        let client = TavilyClient::new(key).context("Failed to create the search client")?;
        let search: Arc<dyn WebSearch> = Arc::new(client);
        Ok(Some(search))
    }

    fn telegram(&self, settings: &Settings) -> anyhow::Result<Arc<dyn TelegramApi>> {
        let token = settings.require_telegram_token()?;
        let api: Arc<dyn TelegramApi> = Arc::new(HttpTelegramApi::new(token));
        Ok(api)
    }
}

/// Settings plus the service factory, passed to every command.
pub struct Runtime {
    pub settings: Settings,
    pub services: Arc<dyn Services>,
}

impl Runtime {
    pub fn new(settings: Settings, services: Arc<dyn Services>) -> Self {
        Self { settings, services }
    }

    pub fn live(settings: Settings) -> Self {
        Self::new(settings, Arc::new(LiveServices))
    }

    /// Load the index and chunk files and check them against `encoder`.
    pub fn load_knowledge(&self, encoder: &dyn QueryEncoder) -> anyhow::Result<KnowledgeBase> {
        let kb = KnowledgeBase::load(&self.settings.index_path, &self.settings.chunks_path)
            .with_context(|| {
                format!(
                    "Failed to load the knowledge base from {} and {}",
                    self.settings.index_path.display(),
                    self.settings.chunks_path.display()
                )
            })?;
        kb.check_dimension(encoder.dimension())
            .context("Index does not match the embedding model")?;
        Ok(kb)
    }

    /// A retriever over a freshly loaded knowledge base.
    pub fn retriever(&self) -> anyhow::Result<Retriever> {
        let encoder = self.services.encoder(&self.settings)?;
        let kb = self.load_knowledge(encoder.as_ref())?;
        Ok(Retriever::new(encoder, Arc::new(KnowledgeHandle::loaded(kb))))
    }

    /// A responder, or `None` when generation is not configured.
    pub fn responder(&self) -> anyhow::Result<Option<Responder>> {
        Ok(self
            .services
            .generator(&self.settings)?
            .map(|generator| Responder::new(generator, SamplingParams::from(&self.settings.llm))))
    }

    /// A responder, or an error naming the missing API key.
    pub fn require_responder(&self) -> anyhow::Result<Responder> {
        self.responder()?
            .context("Generation is not configured: set LLM_API_KEY or GROQ_API_KEY")
    }
}
