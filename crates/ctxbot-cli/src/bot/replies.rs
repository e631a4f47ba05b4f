//! User-facing reply texts.

use std::fmt::Write as _;

use ctxbot_lib::index::RetrievedChunk;
use ctxbot_lib::search::SearchHit;

use super::Features;

pub const APOLOGY: &str = "Sorry, something went wrong while processing your request.";
pub const NOT_AVAILABLE: &str = "This command is not available.";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send /start to see what I can do.";
pub const EMPTY_REPLY: &str = "The model returned an empty answer.";
pub const NO_TEXT: &str = "Please send a message with some text.";
pub const SEARCHING: &str = "Searching...";
pub const FINDING_ANSWER: &str = "Looking for an answer to your question...";
pub const SUMMARIZING: &str = "Collecting and summarizing news...";

/// Usage hint for a command sent without arguments.
pub fn usage(command: &str) -> String {
    match command {
        "ctx" => "Please add a query after /ctx, e.g. /ctx constitutional AI".to_string(),
        "ctxsum" => "Please add a query after /ctxsum, e.g. /ctxsum model safety".to_string(),
        "rag" => "Please ask a question after /rag, e.g. /rag What is Claude?".to_string(),
        "search" => "Please add a search query after /search".to_string(),
        "ask" => "Please ask a question after /ask".to_string(),
        "summary" => "Please add a topic after /summary".to_string(),
        other => format!("Please add text after /{other}"),
    }
}

fn command_lines(features: Features) -> Vec<&'static str> {
    let mut lines = Vec::new();
    if features.knowledge {
        lines.push("/ctx <query> - show the most relevant knowledge base chunks");
        if features.generation {
            lines.push("/ctxsum <query> - summarize the relevant chunks");
            lines.push("/rag <question> - answer from the knowledge base");
        }
    }
    if features.search {
        lines.push("/search <query> - web search, top 5 links");
        lines.push("/ask <question> - quick answer from the web");
        if features.generation {
            lines.push("/summary <topic> - news summary");
        }
    }
    lines
}

/// Reply to `/start`, listing what this instance can do.
pub fn greeting(features: Features) -> String {
    let mut text = String::from("Hello! I am a context assistant bot.\n");
    let lines = command_lines(features);
    if !lines.is_empty() {
        text.push_str("\nCommands:\n");
        for line in lines {
            let _ = writeln!(text, "{line}");
        }
    }
    if features.chat {
        text.push_str("\nAny other message is answered by the language model.");
    }
    text.trim_end().to_string()
}

/// Reply to plain text when chatting is off.
pub fn chat_disabled_hint(features: Features) -> String {
    let lines = command_lines(features);
    if lines.is_empty() {
        return "I only respond to /start.".to_string();
    }
    format!("Please use one of the commands:\n{}", lines.join("\n"))
}

pub fn format_chunks(query: &str, hits: &[RetrievedChunk]) -> String {
    if hits.is_empty() {
        return format!("No relevant chunks found for '{query}'.");
    }
    let mut text = format!("Relevant chunks for '{query}':\n\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(text, "Chunk {}:\n{}\n\n", i + 1, hit.chunk.content);
    }
    text.trim_end().to_string()
}

pub fn format_context_summary(query: &str, summary: &str) -> String {
    format!("Summary of the context for '{query}':\n\n{summary}")
}

pub fn format_search_results(query: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return format!("No results found for '{query}'.");
    }
    let mut text = format!("Search results for '{query}':\n\n");
    for (i, hit) in hits.iter().enumerate() {
        let _ = write!(
            text,
            "{}. {}\n🔗 {}\n\n",
            i + 1,
            hit.title.as_deref().unwrap_or("Untitled"),
            hit.url.as_deref().unwrap_or("No link"),
        );
    }
    text.trim_end().to_string()
}

pub fn format_qna(answer: &str) -> String {
    format!("Answer to your question:\n\n{answer}")
}

pub fn format_news_summary(query: &str, summary: &str) -> String {
    format!("News summary for '{query}':\n\n{summary}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: Features = Features {
        knowledge: true,
        generation: true,
        search: true,
        chat: true,
    };

    const NOTHING: Features = Features {
        knowledge: false,
        generation: false,
        search: false,
        chat: false,
    };

    #[test]
    fn greeting_lists_enabled_commands() {
        let text = greeting(ALL);
        for cmd in ["/ctx ", "/ctxsum ", "/rag ", "/search ", "/ask ", "/summary "] {
            assert!(text.contains(cmd), "missing {cmd} in {text}");
        }
        assert!(text.ends_with("answered by the language model."));
    }

    #[test]
    fn greeting_hides_generation_commands_without_llm() {
        let text = greeting(Features {
            generation: false,
            chat: false,
            ..ALL
        });
        assert!(text.contains("/ctx "));
        assert!(!text.contains("/rag"));
        assert!(!text.contains("/summary"));
    }

    #[test]
    fn greeting_with_nothing_enabled() {
        assert_eq!(greeting(NOTHING), "Hello! I am a context assistant bot.");
        assert_eq!(chat_disabled_hint(NOTHING), "I only respond to /start.");
    }

    #[test]
    fn search_results_use_placeholders() {
        let hits = vec![
            SearchHit {
                title: Some("Claude 4".into()),
                url: Some("https://example.com/a".into()),
                content: None,
            },
            SearchHit::default(),
        ];
        assert_eq!(
            format_search_results("claude", &hits),
            "Search results for 'claude':\n\n\
             1. Claude 4\n🔗 https://example.com/a\n\n\
             2. Untitled\n🔗 No link"
        );
    }

    #[test]
    fn empty_results_have_their_own_message() {
        assert_eq!(format_search_results("q", &[]), "No results found for 'q'.");
        assert_eq!(format_chunks("q", &[]), "No relevant chunks found for 'q'.");
    }

    #[test]
    fn usage_names_the_command() {
        assert!(usage("rag").starts_with("Please ask a question after /rag"));
        assert_eq!(usage("other"), "Please add text after /other");
    }
}
