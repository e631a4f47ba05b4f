use std::sync::Mutex;

use async_trait::async_trait;
use ctxbot_lib::error::SearchError;
use ctxbot_lib::search::{SearchDepth, SearchHit, WebSearch};

/// Web search returning canned hits and a canned answer.
pub struct StaticSearch {
    hits: Vec<SearchHit>,
    answer: String,
    fail: bool,
    calls: Mutex<Vec<(String, Option<SearchDepth>)>>,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>, answer: impl Into<String>) -> Self {
        Self {
            hits,
            answer: answer.into(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new(), "")
        }
    }

    /// `(query, depth)` for every call; `qna` calls have no depth.
    pub fn calls(&self) -> Vec<(String, Option<SearchDepth>)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, query: &str, depth: Option<SearchDepth>) -> Result<(), SearchError> {
        self.calls.lock().unwrap().push((query.to_string(), depth));
        if self.fail {
            return Err(SearchError::Status {
                status: 500,
                body: "upstream down".into(),
            });
        }
        Ok(())
    }
}

/// A hit with every field present.
pub fn hit(title: &str, url: &str, content: &str) -> SearchHit {
    SearchHit {
        title: Some(title.to_string()),
        url: Some(url.to_string()),
        content: Some(content.to_string()),
    }
}

#[async_trait]
impl WebSearch for StaticSearch {
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
        max_results: usize,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.record(query, Some(depth))?;
        Ok(self.hits.iter().take(max_results).cloned().collect())
    }

    async fn qna(&self, query: &str) -> Result<String, SearchError> {
        self.record(query, None)?;
        Ok(self.answer.clone())
    }
}
