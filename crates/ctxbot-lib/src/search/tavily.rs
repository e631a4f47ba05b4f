use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{TAVILY_SEARCH_URL, WEB_SEARCH_MAX_RESULTS, WEB_SEARCH_TIMEOUT_SECS};
use crate::error::SearchError;

use super::{SearchDepth, SearchHit, WebSearch};

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
    search_depth: SearchDepth,
    max_results: usize,
    include_answer: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Client for the Tavily search API.
pub struct TavilyClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Self::with_endpoint(api_key, TAVILY_SEARCH_URL)
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEB_SEARCH_TIMEOUT_SECS))
            .build()
            .map_err(|e| SearchError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        })
    }

    async fn post(&self, body: &SearchBody<'_>) -> Result<SearchResponse, SearchError> {
        debug!(query = body.query, depth = ?body.search_depth, "Sending web search request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SearchError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| SearchError::Transport {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_response(&text)
    }
}

fn parse_response(text: &str) -> Result<SearchResponse, SearchError> {
    serde_json::from_str(text).map_err(|e| SearchError::MalformedResponse {
        message: e.to_string(),
    })
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let mut response = self
            .post(&SearchBody {
                query,
                search_depth: depth,
                max_results,
                include_answer: false,
            })
            .await?;
        response.results.truncate(max_results);
        Ok(response.results)
    }

    async fn qna(&self, query: &str) -> Result<String, SearchError> {
        let response = self
            .post(&SearchBody {
                query,
                search_depth: SearchDepth::Advanced,
                max_results: WEB_SEARCH_MAX_RESULTS,
                include_answer: true,
            })
            .await?;
        response
            .answer
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| SearchError::MalformedResponse {
                message: "response has no answer".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_uses_lowercase_depth() {
        let body = SearchBody {
            query: "rust",
            search_depth: SearchDepth::Advanced,
            max_results: 5,
            include_answer: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "query": "rust",
                "search_depth": "advanced",
                "max_results": 5,
                "include_answer": true
            })
        );
    }

    #[test]
    fn results_tolerate_missing_fields() {
        let parsed = parse_response(
            r#"{"answer": null, "results": [
                {"title": "A", "url": "https://a.example", "content": "alpha", "score": 0.9},
                {"url": "https://b.example"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(parsed.answer, None);
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].title.as_deref(), Some("A"));
        assert_eq!(parsed.results[1].title, None);
    }

    #[test]
    fn non_json_is_malformed() {
        assert!(matches!(
            parse_response("nope"),
            Err(SearchError::MalformedResponse { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let client = TavilyClient::with_endpoint("k", "http://127.0.0.1:1/search").unwrap();
        assert!(matches!(
            client.search("q", SearchDepth::Basic, 5).await,
            Err(SearchError::Transport { .. })
        ));
    }
}
