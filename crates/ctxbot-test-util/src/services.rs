use std::sync::Arc;

use ctxbot_lib::embedding::QueryEncoder;
use ctxbot_lib::llm::Generator;
use ctxbot_lib::runtime::{Runtime, Services};
use ctxbot_lib::search::WebSearch;
use ctxbot_lib::settings::Settings;
use ctxbot_lib::telegram::TelegramApi;

use crate::encoder::KeywordEncoder;
use crate::telegram::RecordingTelegram;

/// [`Services`] backed by in-process fakes. Integrations left unset behave as
/// if their API key were missing.
pub struct FakeServices {
    pub encoder: Arc<dyn QueryEncoder>,
    pub generator: Option<Arc<dyn Generator>>,
    pub search: Option<Arc<dyn WebSearch>>,
    pub telegram: Arc<RecordingTelegram>,
}

impl FakeServices {
    /// A keyword encoder of `dimension` and nothing else.
    pub fn new(dimension: usize) -> Self {
        Self {
            encoder: Arc::new(KeywordEncoder::new(dimension)),
            generator: None,
            search: None,
            telegram: Arc::new(RecordingTelegram::new()),
        }
    }

    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn QueryEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Arc<dyn WebSearch>) -> Self {
        self.search = Some(search);
        self
    }

    /// Wrap into a [`Runtime`] using `settings`.
    pub fn into_runtime(self, settings: Settings) -> Runtime {
        Runtime::new(settings, Arc::new(self))
    }
}

impl Services for FakeServices {
    fn encoder(&self, _settings: &Settings) -> anyhow::Result<Arc<dyn QueryEncoder>> {
        Ok(Arc::clone(&self.encoder))
    }

    fn generator(&self, _settings: &Settings) -> anyhow::Result<Option<Arc<dyn Generator>>> {
        Ok(self.generator.clone())
    }

    fn web_search(&self, _settings: &Settings) -> anyhow::Result<Option<Arc<dyn WebSearch>>> {
        Ok(self.search.clone())
    }

    fn telegram(&self, _settings: &Settings) -> anyhow::Result<Arc<dyn TelegramApi>> {
        let api: Arc<dyn TelegramApi> = self.telegram.clone();
        Ok(api)
    }
}
