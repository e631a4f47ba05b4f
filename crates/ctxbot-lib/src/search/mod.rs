//! Web search used by the `/search`, `/ask` and `/summary` commands.

pub mod tavily;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

pub use tavily::TavilyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

/// One search result. Every field may be missing in the upstream payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Ranked results for `query`, at most `max_results` of them.
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError>;

    /// A short direct answer to `query`.
    async fn qna(&self, query: &str) -> Result<String, SearchError>;
}
