use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::error::RagError;
use crate::index::RetrievedChunk;
use crate::llm::{ChatMessage, GenerationRequest, Generator};
use crate::search::SearchHit;
use crate::settings::LlmSettings;

/// Fixed sampling parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmSettings> for SamplingParams {
    fn from(settings: &LlmSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
        }
    }
}

/// Chunk contents in retrieval order, separated by a blank line.
pub fn assemble_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|c| c.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question using only the context below. \
         If the context does not contain enough information to answer, say so.\n\n\
         Context:\n{context}\n\n\
         Question: {query}"
    )
}

pub fn summary_prompt(context: &str, query: &str) -> String {
    format!("Summarize the following context, related to the query: {query}\n\nContext:\n{context}")
}

/// Prompt asking for a summary of web search results in `language`.
pub fn news_summary_prompt(hits: &[SearchHit], language: &str) -> String {
    let mut prompt = format!("Summarize the following news results in {language}:\n\n");
    for hit in hits {
        let _ = write!(
            prompt,
            "Title: {}\nContent: {}\n\n",
            hit.title.as_deref().unwrap_or("No title"),
            hit.content.as_deref().unwrap_or("No content"),
        );
    }
    prompt
}

/// Turns prompts into generated text with one generation call each.
#[derive(Clone)]
pub struct Responder {
    generator: Arc<dyn Generator>,
    params: SamplingParams,
}

impl Responder {
    pub fn new(generator: Arc<dyn Generator>, params: SamplingParams) -> Self {
        Self { generator, params }
    }

    pub fn params(&self) -> &SamplingParams {
        &self.params
    }

    /// Answer `query` from the retrieved chunks.
    ///
    /// An empty chunk list still calls the generator, with an empty context;
    /// the prompt tells the model to say when the context is insufficient.
    pub async fn answer(&self, query: &str, chunks: &[RetrievedChunk]) -> Result<String, RagError> {
        let context = assemble_context(chunks);
        debug!(
            chunks = chunks.len(),
            context_chars = context.len(),
            "Answering from context"
        );
        self.complete(&answer_prompt(&context, query)).await
    }

    /// Summarize the retrieved chunks with respect to `query`.
    pub async fn summarize(
        &self,
        query: &str,
        chunks: &[RetrievedChunk],
    ) -> Result<String, RagError> {
        let context = chunks
            .iter()
            .map(|c| c.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        self.complete(&summary_prompt(&context, query)).await
    }

    /// Send `prompt` as a single user message and return the raw output.
    pub async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let request = GenerationRequest {
            model: self.params.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        Ok(self.generator.generate(&request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::Chunk;

    fn retrieved(contents: &[&str]) -> Vec<RetrievedChunk> {
        contents
            .iter()
            .zip(0u64..)
            .map(|(content, id)| RetrievedChunk {
                chunk: Arc::new(Chunk {
                    id,
                    content: (*content).to_string(),
                    metadata: None,
                }),
                position: usize::try_from(id).unwrap(),
                distance: 0.0,
            })
            .collect()
    }

    #[test]
    fn context_keeps_order_with_blank_lines() {
        assert_eq!(
            assemble_context(&retrieved(&["first", "second", "third"])),
            "first\n\nsecond\n\nthird"
        );
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn answer_prompt_contains_context_and_question() {
        let prompt = answer_prompt("X is a protocol.", "What is X?");
        assert!(prompt.contains("Context:\nX is a protocol."));
        assert!(prompt.ends_with("Question: What is X?"));
        assert!(prompt.contains("say so"));
    }

    #[test]
    fn summary_prompt_names_the_query() {
        assert_eq!(
            summary_prompt("a\nb", "safety"),
            "Summarize the following context, related to the query: safety\n\nContext:\na\nb"
        );
    }

    #[test]
    fn news_prompt_uses_placeholders() {
        let hits = vec![
            SearchHit {
                title: Some("Launch".into()),
                url: None,
                content: Some("New model released.".into()),
            },
            SearchHit::default(),
        ];
        let prompt = news_summary_prompt(&hits, "Russian");
        assert!(prompt.starts_with("Summarize the following news results in Russian:\n\n"));
        assert!(prompt.contains("Title: Launch\nContent: New model released.\n\n"));
        assert!(prompt.contains("Title: No title\nContent: No content\n\n"));
    }

    #[test]
    fn sampling_params_from_settings() {
        let settings = LlmSettings {
            api_key: None,
            base_url: String::new(),
            model: "m".into(),
            temperature: 0.9,
            max_tokens: 100,
            timeout: std::time::Duration::from_secs(1),
            max_retries: 0,
        };
        let params = SamplingParams::from(&settings);
        assert_eq!(params.model, "m");
        assert_eq!(params.max_tokens, 100);
    }
}
