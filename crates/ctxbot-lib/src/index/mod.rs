//! The read-only retrieval corpus: chunk texts plus the vector index over them.
//!
//! Position `i` in the index always corresponds to chunk `i` in the chunk
//! file. [`KnowledgeBase`] checks that pairing when both are loaded.

pub mod chunks;
pub mod flat;
pub mod knowledge;

pub use chunks::{Chunk, ChunkStore};
pub use flat::{FlatIndex, Metric, Neighbor};
pub use knowledge::{KnowledgeBase, KnowledgeHandle, RetrievedChunk};
