//! Query-to-answer pipeline: validate the query, retrieve chunks, assemble
//! the context, and generate a reply.

pub mod answer;
pub mod chunker;
pub mod query;
pub mod retrieve;

pub use answer::{Responder, SamplingParams, assemble_context};
pub use query::{QueryClass, classify_query};
pub use retrieve::Retriever;
