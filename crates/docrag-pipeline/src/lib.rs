//! docrag-pipeline
//!
//! Query-time coordination: chunked ingest and ranked retrieval
//! ([`Retriever`]), grounded answer generation with an extractive fallback
//! ([`AnswerGenerator`]), the per-query event stream ([`StreamingSession`])
//! and context enrichment for outside chat conversations ([`context`]).

pub mod context;
pub mod fragments;
pub mod generator;
pub mod retriever;
pub mod session;

pub use context::{enrich_messages, ChatMessage};
pub use generator::{Answer, AnswerGenerator};
pub use retriever::Retriever;
pub use session::StreamingSession;
