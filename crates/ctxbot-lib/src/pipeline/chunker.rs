use text_splitter::{ChunkConfig, MarkdownSplitter};
use tokenizers::Tokenizer;

use crate::config::{
    CHUNK_OVERLAP_CHARS, CHUNK_OVERLAP_TOKENS, CHUNK_TARGET_CHARS, CHUNK_TARGET_TOKENS,
};

/// Split a markdown document into retrieval chunks.
///
/// With a tokenizer, chunks target [`CHUNK_TARGET_TOKENS`] tokens and each
/// chunk after the first is prefixed with the last [`CHUNK_OVERLAP_TOKENS`]
/// tokens of its predecessor. Without one, the same scheme runs on characters.
pub fn split_document(text: &str, tokenizer: Option<&Tokenizer>) -> Vec<String> {
    match tokenizer {
        Some(tokenizer) => {
            let splitter = MarkdownSplitter::new(
                ChunkConfig::new(CHUNK_TARGET_TOKENS).with_sizer(tokenizer),
            );
            let raw: Vec<&str> = splitter.chunks(text).collect();
            with_overlap(&raw, |prev| {
                extract_tail_tokens(prev, tokenizer, CHUNK_OVERLAP_TOKENS)
            })
        }
        None => {
            let splitter = MarkdownSplitter::new(ChunkConfig::new(CHUNK_TARGET_CHARS));
            let raw: Vec<&str> = splitter.chunks(text).collect();
            with_overlap(&raw, |prev| extract_tail_chars(prev, CHUNK_OVERLAP_CHARS))
        }
    }
}

fn with_overlap<F>(raw: &[&str], tail_of: F) -> Vec<String>
where
    F: Fn(&str) -> String,
{
    let mut chunks = Vec::with_capacity(raw.len());
    for (i, &chunk_text) in raw.iter().enumerate() {
        let overlap = if i == 0 {
            String::new()
        } else {
            tail_of(raw[i - 1])
        };
        let overlap = overlap.trim();
        if overlap.is_empty() {
            chunks.push(chunk_text.to_string());
        } else {
            chunks.push(format!("{overlap}\n\n{chunk_text}"));
        }
    }
    chunks
}

/// Extract the last `n_tokens` worth of text from the end of `text`.
fn extract_tail_tokens(text: &str, tokenizer: &Tokenizer, n_tokens: usize) -> String {
    let Ok(encoding) = tokenizer.encode(text, false) else {
        return String::new();
    };

    let tokens = encoding.get_ids();
    if tokens.is_empty() {
        return String::new();
    }

    let start = tokens.len().saturating_sub(n_tokens);
    tokenizer.decode(&tokens[start..], true).unwrap_or_default()
}

/// The last `n_chars` characters of `text`, widened to the start of a word.
fn extract_tail_chars(text: &str, n_chars: usize) -> String {
    let total = text.chars().count();
    if total <= n_chars {
        return text.to_string();
    }
    let tail: String = text.chars().skip(total - n_chars).collect();
    match tail.find(char::is_whitespace) {
        Some(pos) => tail[pos..].trim_start().to_string(),
        None => tail,
    }
}
