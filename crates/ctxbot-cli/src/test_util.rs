use std::sync::Arc;

use ctxbot_lib::embedding::QueryEncoder;
use ctxbot_lib::index::{ChunkStore, FlatIndex, KnowledgeBase, KnowledgeHandle, Metric};
use ctxbot_lib::pipeline::{Responder, Retriever, SamplingParams};
use ctxbot_test_util::encoder::KeywordEncoder;
use ctxbot_test_util::generator::ScriptedGenerator;
use ctxbot_test_util::telegram::RecordingTelegram;

use crate::bot::BotContext;

// Re-export shared helpers from ctxbot-test-util.
pub use ctxbot_test_util::model::model_dir;

/// Dimension of the keyword encoder behind [`keyword_retriever`]. Large
/// enough that hash collisions between test words are unlikely.
pub const KEYWORD_DIMENSION: usize = 256;

/// A [`BotContext`] sending through `telegram` with every integration off
/// and chatting enabled. Tests switch integrations on with struct update
/// syntax.
pub fn bot_context(telegram: &Arc<RecordingTelegram>) -> BotContext {
    BotContext {
        telegram: telegram.clone(),
        retriever: None,
        responder: None,
        search: None,
        top_k: 3,
        summary_language: "Russian".to_string(),
        chat_enabled: true,
    }
}

/// An in-memory retriever over `texts`, embedded with a keyword encoder.
pub fn keyword_retriever(texts: &[&str]) -> Retriever {
    let encoder = KeywordEncoder::new(KEYWORD_DIMENSION);
    let mut index = FlatIndex::new(KEYWORD_DIMENSION, Metric::L2);
    for vector in encoder.encode_batch(texts).unwrap() {
        index.add(&vector).unwrap();
    }
    let kb = KnowledgeBase::new(ChunkStore::from_texts(texts.iter().copied()), index).unwrap();
    Retriever::new(Arc::new(encoder), Arc::new(KnowledgeHandle::loaded(kb)))
}

pub fn params() -> SamplingParams {
    SamplingParams {
        model: "test-model".to_string(),
        temperature: 0.7,
        max_tokens: 750,
    }
}

pub fn responder(generator: &Arc<ScriptedGenerator>) -> Responder {
    Responder::new(generator.clone(), params())
}

/// Strip margin markers from a multi-line string.
///
/// Each line is scanned for the first `|` after optional leading whitespace;
/// that prefix is removed. Lines without a leading `|` are dropped. Use `\|`
/// for a literal `|`.
///
/// Prefer the [`trim_margin!`] macro, which wraps `format!`.
pub fn _trim_margin(s: &str) -> String {
    s.lines()
        .filter_map(|line| {
            line.trim_start()
                .strip_prefix('|')
                .map(|rest| rest.replace("\\|", "|"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build a margin-trimmed string with `format!`-style interpolation.
///
/// ```ignore
/// let query = "caching";
/// let s = trim_margin!(
///     "|Relevant chunks for '{query}':
///      |
///      |Chunk 1:"
/// );
/// assert_eq!(s, "Relevant chunks for 'caching':\n\nChunk 1:");
/// ```
macro_rules! trim_margin {
    ($fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::test_util::_trim_margin(&format!($fmt $(, $arg)*))
    };
}
pub(crate) use trim_margin;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_margin_strips_prefixes() {
        let result = _trim_margin(
            "|line one
             |  line two
             |",
        );
        assert_eq!(result, "line one\n  line two\n");
    }

    #[test]
    fn trim_margin_escapes_and_skips() {
        let result = _trim_margin(
            "no pipe here
             |a \\| b",
        );
        assert_eq!(result, "a | b");
    }

    #[test]
    fn trim_margin_formats() {
        let n = 3;
        assert_eq!(trim_margin!("|Chunk {n}:\n|done"), "Chunk 3:\ndone");
    }

    #[test]
    fn keyword_retriever_finds_shared_words() {
        let retriever = keyword_retriever(&["red apples", "blue sky", "green grass"]);
        let hits = retriever.retrieve("blue", 1).unwrap();
        assert_eq!(hits[0].chunk.content, "blue sky");
    }
}
