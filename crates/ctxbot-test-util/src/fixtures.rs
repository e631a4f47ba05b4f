use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ctxbot_lib::embedding::QueryEncoder;
use ctxbot_lib::index::{ChunkStore, FlatIndex, Metric};
use ctxbot_lib::settings::Settings;

/// Paths of a knowledge base written by [`write_knowledge`].
pub struct KnowledgeFiles {
    pub index_path: PathBuf,
    pub chunks_path: PathBuf,
}

/// Embed `texts` with `encoder` and write `kb.index` plus `chunks.json`
/// into `dir`.
pub fn write_knowledge(dir: &Path, texts: &[&str], encoder: &dyn QueryEncoder) -> KnowledgeFiles {
    let vectors = encoder.encode_batch(texts).unwrap();
    let rows: Vec<&[f32]> = vectors.iter().map(Vec::as_slice).collect();
    write_knowledge_vectors(dir, texts, &rows)
}

/// Write explicit vectors (one per text) as an L2 index plus chunk file.
pub fn write_knowledge_vectors(dir: &Path, texts: &[&str], vectors: &[&[f32]]) -> KnowledgeFiles {
    assert_eq!(texts.len(), vectors.len(), "one vector per text");
    let dimension = vectors.first().map_or(1, |v| v.len());
    let mut index = FlatIndex::new(dimension, Metric::L2);
    for vector in vectors {
        index.add(vector).unwrap();
    }

    let files = KnowledgeFiles {
        index_path: dir.join("kb.index"),
        chunks_path: dir.join("chunks.json"),
    };
    index.save(&files.index_path).unwrap();
    ChunkStore::from_texts(texts.iter().copied())
        .save(&files.chunks_path)
        .unwrap();
    files
}

/// Settings pointing at `files`, with extra variables from `pairs`.
pub fn settings_with(files: Option<&KnowledgeFiles>, pairs: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    if let Some(files) = files {
        vars.insert(
            "CTXBOT_INDEX_PATH".into(),
            files.index_path.display().to_string(),
        );
        vars.insert(
            "CTXBOT_CHUNKS_PATH".into(),
            files.chunks_path.display().to_string(),
        );
    }
    Settings::from_lookup(|key| vars.get(key).cloned()).unwrap()
}
