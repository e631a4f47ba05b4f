use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// An immutable unit of source text in the retrieval corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: u64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One element of the chunk file: either a bare string or a full record.
#[derive(Deserialize)]
#[serde(untagged)]
enum ChunkRecord {
    Text(String),
    Record {
        id: Option<u64>,
        content: String,
        #[serde(default)]
        metadata: Option<serde_json::Value>,
    },
}

/// Ordered chunk collection. Position `i` pairs with index vector `i`.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    chunks: Vec<Arc<Chunk>>,
}

impl ChunkStore {
    /// Load a chunk file from disk.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| IndexError::ChunkParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a JSON array of strings or `{id?, content, metadata?}` objects.
    /// Records without an id take their position as id.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let records: Vec<ChunkRecord> = serde_json::from_str(text)?;
        let chunks = records
            .into_iter()
            .zip(0u64..)
            .map(|(record, position)| match record {
                ChunkRecord::Text(content) => Chunk {
                    id: position,
                    content,
                    metadata: None,
                },
                ChunkRecord::Record {
                    id,
                    content,
                    metadata,
                } => Chunk {
                    id: id.unwrap_or(position),
                    content,
                    metadata,
                },
            })
            .map(Arc::new)
            .collect();
        Ok(Self { chunks })
    }

    /// Build a store from plain texts, numbering them from zero.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = texts
            .into_iter()
            .zip(0u64..)
            .map(|(content, id)| {
                Arc::new(Chunk {
                    id,
                    content: content.into(),
                    metadata: None,
                })
            })
            .collect();
        Self { chunks }
    }

    /// Write the store as a JSON array of records.
    pub fn save(&self, path: &Path) -> Result<(), IndexError> {
        let records: Vec<&Chunk> = self.chunks.iter().map(AsRef::as_ref).collect();
        let json = serde_json::to_string_pretty(&records).map_err(|source| {
            IndexError::ChunkParse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        std::fs::write(path, json).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, position: usize) -> Option<&Arc<Chunk>> {
        self.chunks.get(position)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.chunks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_strings_are_numbered_by_position() {
        let store = ChunkStore::from_json(r#"["alpha", "beta"]"#).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).unwrap().id, 0);
        assert_eq!(store.get(1).unwrap().content, "beta");
        assert_eq!(store.get(1).unwrap().metadata, None);
    }

    #[test]
    fn records_keep_their_ids_and_metadata() {
        let store = ChunkStore::from_json(
            r#"[
                {"id": 10, "content": "first", "metadata": {"source": "docs"}},
                {"content": "second"}
            ]"#,
        )
        .unwrap();
        let first = store.get(0).unwrap();
        assert_eq!(first.id, 10);
        assert_eq!(
            first.metadata.as_ref().unwrap()["source"],
            serde_json::json!("docs")
        );
        // Missing id falls back to position.
        assert_eq!(store.get(1).unwrap().id, 1);
    }

    #[test]
    fn mixed_strings_and_records_are_accepted() {
        let store = ChunkStore::from_json(r#"["a", {"content": "b"}]"#).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(ChunkStore::from_json(r#"{"content": "x"}"#).is_err());
        assert!(ChunkStore::from_json(r#"[42]"#).is_err());
    }

    #[test]
    fn save_then_load_preserves_records() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.json");
        let store = ChunkStore::from_texts(["one", "two", "three"]);
        store.save(&path).unwrap();

        let loaded = ChunkStore::load(&path).unwrap();
        let contents: Vec<&str> = loaded.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        assert_eq!(loaded.get(2).unwrap().id, 2);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let err = ChunkStore::load(Path::new("/nonexistent/chunks.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/chunks.json"));
    }
}
