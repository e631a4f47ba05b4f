pub mod embedder;

pub use embedder::{Embedder, QueryEncoder};
