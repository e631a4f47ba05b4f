use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use fastembed::{
    InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles, UserDefinedEmbeddingModel,
};
use tokenizers::Tokenizer;

use crate::config::EMBEDDING_DIMENSION;
use crate::error::EncodingError;

/// Subdirectory name under the model cache dir for all-MiniLM-L6-v2 files.
pub const MODEL_SUBDIR: &str = "all-MiniLM-L6-v2";

/// Hugging Face repository the model files are downloaded from.
pub const HF_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// `(remote path, local file name)` pairs that make up the model on disk.
pub const MODEL_FILES: &[(&str, &str)] = &[
    ("onnx/model.onnx", "model.onnx"),
    ("tokenizer.json", "tokenizer.json"),
    ("config.json", "config.json"),
    ("special_tokens_map.json", "special_tokens_map.json"),
    ("tokenizer_config.json", "tokenizer_config.json"),
];

/// Turns text into fixed-length vectors.
///
/// Implementations must be deterministic: the same text always encodes to the
/// same vector for the lifetime of the process.
pub trait QueryEncoder: Send + Sync {
    /// Length of every vector this encoder produces.
    fn dimension(&self) -> usize;

    /// Encode a batch of texts, one vector per input, in input order.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodingError>;

    /// Encode a single text.
    fn encode(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        self.encode_batch(&[text])?
            .pop()
            .ok_or_else(|| EncodingError::Model {
                message: "model returned no embedding".into(),
            })
    }

    /// Tokenizer matching the model, when there is one. Used to size chunks
    /// in tokens rather than characters.
    fn tokenizer(&self) -> Option<&Tokenizer> {
        None
    }
}

/// Wrapper around fastembed's `TextEmbedding` model.
/// Uses all-MiniLM-L6-v2 loaded from disk with mean pooling.
pub struct Embedder {
    model: Mutex<TextEmbedding>,
    tokenizer: Tokenizer,
}

impl Embedder {
    /// Create a new embedder by loading all-MiniLM-L6-v2 from disk.
    ///
    /// Expected files in `model_cache_dir/all-MiniLM-L6-v2/`: see [`MODEL_FILES`].
    ///
    /// If the model files are not found, returns an error instructing the user
    /// to run `ctxbot model download`.
    pub fn new(model_cache_dir: &Path) -> anyhow::Result<Self> {
        let base = model_cache_dir.join(MODEL_SUBDIR);

        let onnx_bytes = fs::read(base.join("model.onnx")).with_context(|| {
            format!(
                "Model not found at {}. Run 'ctxbot model download' first.",
                base.display()
            )
        })?;

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: fs::read(base.join("tokenizer.json"))
                .context("Missing tokenizer.json")?,
            config_file: fs::read(base.join("config.json")).context("Missing config.json")?,
            special_tokens_map_file: fs::read(base.join("special_tokens_map.json"))
                .context("Missing special_tokens_map.json")?,
            tokenizer_config_file: fs::read(base.join("tokenizer_config.json"))
                .context("Missing tokenizer_config.json")?,
        };

        let user_model =
            UserDefinedEmbeddingModel::new(onnx_bytes, tokenizer_files).with_pooling(Pooling::Mean);

        let model =
            TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
                .context("Failed to initialize all-MiniLM-L6-v2 model")?;
        let tokenizer = model.tokenizer.clone();

        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
        })
    }
}

impl QueryEncoder for Embedder {
    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EncodingError> {
        let owned: Vec<String> = texts.iter().map(|s| (*s).to_string()).collect();
        let mut model = self.model.lock().map_err(|_| EncodingError::Model {
            message: "embedding model lock poisoned".into(),
        })?;
        let embeddings = model.embed(owned, None).map_err(|e| EncodingError::Model {
            message: format!("{e:#}"),
        })?;

        if let Some(bad) = embeddings.iter().find(|v| v.len() != EMBEDDING_DIMENSION) {
            return Err(EncodingError::Dimension {
                expected: EMBEDDING_DIMENSION,
                actual: bad.len(),
            });
        }
        Ok(embeddings)
    }

    fn tokenizer(&self) -> Option<&Tokenizer> {
        Some(&self.tokenizer)
    }
}
