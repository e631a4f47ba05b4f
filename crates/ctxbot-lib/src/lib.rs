pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod runtime;
pub mod search;
pub mod settings;
pub mod telegram;
