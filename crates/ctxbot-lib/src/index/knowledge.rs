use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::info;

use crate::error::IndexError;

use super::chunks::{Chunk, ChunkStore};
use super::flat::FlatIndex;

/// A chunk returned by a search, with its index position and distance.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub chunk: Arc<Chunk>,
    pub position: usize,
    pub distance: f32,
}

/// Chunk store and vector index, loaded together and validated as a pair.
#[derive(Debug)]
pub struct KnowledgeBase {
    chunks: ChunkStore,
    index: FlatIndex,
}

impl KnowledgeBase {
    /// Pair an index with its chunks. Fails when the counts differ.
    pub fn new(chunks: ChunkStore, index: FlatIndex) -> Result<Self, IndexError> {
        if chunks.len() != index.len() {
            return Err(IndexError::CountMismatch {
                vectors: index.len(),
                chunks: chunks.len(),
            });
        }
        Ok(Self { chunks, index })
    }

    /// Load both files from disk.
    pub fn load(index_path: &Path, chunks_path: &Path) -> Result<Self, IndexError> {
        let index = FlatIndex::load(index_path)?;
        let chunks = ChunkStore::load(chunks_path)?;
        let kb = Self::new(chunks, index)?;
        info!(
            index = %index_path.display(),
            chunks = kb.len(),
            dimension = kb.dimension(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    /// Fail unless vectors have the given dimension (the encoder's output).
    pub fn check_dimension(&self, expected: usize) -> Result<(), IndexError> {
        if self.index.dimension() == expected {
            Ok(())
        } else {
            Err(IndexError::DimensionMismatch {
                expected,
                actual: self.index.dimension(),
            })
        }
    }

    /// Nearest `min(k, len())` chunks to `query`, nearest first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<RetrievedChunk>, IndexError> {
        let neighbors = self.index.search(query, k)?;
        neighbors
            .into_iter()
            .map(|n| {
                let chunk = self.chunks.get(n.position).ok_or_else(|| IndexError::Corrupt {
                    message: format!("index position {} has no chunk", n.position),
                })?;
                Ok(RetrievedChunk {
                    chunk: Arc::clone(chunk),
                    position: n.position,
                    distance: n.distance,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }
}

/// Shared slot holding the current knowledge base.
///
/// Readers take a snapshot (`Arc` clone) and release the lock immediately.
/// A reload replaces the whole pair at once, so no reader ever sees chunks
/// from one load with vectors from another.
#[derive(Debug, Default)]
pub struct KnowledgeHandle {
    current: RwLock<Option<Arc<KnowledgeBase>>>,
}

impl KnowledgeHandle {
    /// A handle with nothing loaded. Searches through it report the index as
    /// unavailable.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loaded(kb: KnowledgeBase) -> Self {
        Self {
            current: RwLock::new(Some(Arc::new(kb))),
        }
    }

    pub fn snapshot(&self) -> Option<Arc<KnowledgeBase>> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.clone()
    }

    /// Swap in a new knowledge base, returning the previous one.
    pub fn replace(&self, kb: KnowledgeBase) -> Option<Arc<KnowledgeBase>> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.replace(Arc::new(kb))
    }
}
