use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::embedding::QueryEncoder;
use crate::error::{EncodingError, IndexError, RagError};
use crate::index::{KnowledgeBase, KnowledgeHandle, RetrievedChunk};

/// Maps a query to its nearest chunks in the loaded knowledge base.
#[derive(Clone)]
pub struct Retriever {
    encoder: Arc<dyn QueryEncoder>,
    knowledge: Arc<KnowledgeHandle>,
}

impl Retriever {
    pub fn new(encoder: Arc<dyn QueryEncoder>, knowledge: Arc<KnowledgeHandle>) -> Self {
        Self { encoder, knowledge }
    }

    /// Load the index and chunk files again and swap them in together.
    ///
    /// The new pair must match the encoder's dimension; on any error the
    /// current knowledge base stays in place. Returns the new chunk count.
    pub fn reload(&self, index_path: &Path, chunks_path: &Path) -> Result<usize, IndexError> {
        let kb = KnowledgeBase::load(index_path, chunks_path)?;
        kb.check_dimension(self.encoder.dimension())?;
        let len = kb.len();
        self.knowledge.replace(kb);
        info!(chunks = len, "Knowledge base reloaded");
        Ok(len)
    }

    /// Return the `min(k, N)` chunks nearest to `query`, nearest first.
    ///
    /// The query must already be non-empty. The knowledge base snapshot is
    /// taken once, so a concurrent reload never mixes two generations.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>, RagError> {
        let kb = self.knowledge.snapshot().ok_or(RagError::IndexUnavailable)?;

        let vector = self.encoder.encode(query)?;
        if vector.len() != kb.dimension() {
            return Err(EncodingError::Dimension {
                expected: kb.dimension(),
                actual: vector.len(),
            }
            .into());
        }

        let hits = kb.search(&vector, k).map_err(|e| match e {
            IndexError::DimensionMismatch { expected, actual } => {
                RagError::from(EncodingError::Dimension { expected, actual })
            }
            other => RagError::from(EncodingError::Model {
                message: other.to_string(),
            }),
        })?;

        debug!(
            k,
            returned = hits.len(),
            nearest = hits.first().map(|h| h.position),
            "Retrieved chunks"
        );
        Ok(hits)
    }

    /// [`retrieve`](Self::retrieve) on the blocking pool, so encoding does
    /// not stall the async runtime.
    pub async fn retrieve_async(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, RagError> {
        let this = self.clone();
        let query = query.to_string();
        tokio::task::spawn_blocking(move || this.retrieve(&query, k))
            .await
            .map_err(|e| {
                RagError::from(EncodingError::Task {
                    message: e.to_string(),
                })
            })?
    }
}
