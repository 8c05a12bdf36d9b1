//! Domain types shared by the store, the retrieval pipeline and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type ChunkId = String;
pub type Meta = HashMap<String, String>;

/// Source label used when a record carries no `source` metadata.
pub const DEFAULT_SOURCE: &str = "Documentation";

/// Short, stable identifier derived from text content (BLAKE3, 16 hex chars).
pub fn content_id(text: &str) -> String {
    let hex = blake3::hash(text.as_bytes()).to_hex();
    hex.as_str()[..16].to_string()
}

/// A bounded-size contiguous piece of a source document.
///
/// - `id`: `"{source_document_id}:{sequence_index}"`
/// - `source_document_id`: stable document identity (caller-provided or content hash)
/// - `sequence_index`: position within the parent document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source_document_id: String,
    pub sequence_index: usize,
}

/// A document handed to the pipeline by a document source.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: Meta,
}

/// One embedded chunk as owned by the vector store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: ChunkId,
    pub text: String,
    pub vector: Vec<f32>,
    pub metadata: Meta,
}

/// A ranked search hit. `similarity` is cosine similarity in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: ChunkId,
    pub text: String,
    pub metadata: Meta,
    pub similarity: f32,
}

impl QueryResult {
    pub fn source(&self) -> &str {
        self.metadata.get("source").map(String::as_str).unwrap_or(DEFAULT_SOURCE)
    }
}

/// Discriminant of a [`StreamEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Start,
    Thinking,
    Document,
    Sources,
    Generating,
    Content,
    End,
    Error,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Thinking => "thinking",
            EventKind::Document => "document",
            EventKind::Sources => "sources",
            EventKind::Generating => "generating",
            EventKind::Content => "content",
            EventKind::End => "end",
            EventKind::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventKind::End | EventKind::Error)
    }
}

/// A typed progress/result event of a streaming session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    Start { query: String },
    Thinking { message: String },
    Document { index: usize, text: String, similarity: f32, source: String },
    Sources { sources: Vec<String> },
    Generating { message: String },
    Content { chunk: String },
    End { complete: bool },
    Error { message: String },
}

impl StreamEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StreamEvent::Start { .. } => EventKind::Start,
            StreamEvent::Thinking { .. } => EventKind::Thinking,
            StreamEvent::Document { .. } => EventKind::Document,
            StreamEvent::Sources { .. } => EventKind::Sources,
            StreamEvent::Generating { .. } => EventKind::Generating,
            StreamEvent::Content { .. } => EventKind::Content,
            StreamEvent::End { .. } => EventKind::End,
            StreamEvent::Error { .. } => EventKind::Error,
        }
    }

    /// The payload alone, as sent in the `data:` line of an SSE frame.
    pub fn payload(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => map.remove("data").unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        }
    }

    /// Render as a Server-Sent Events frame: `event: <kind>\ndata: <json>\n\n`.
    pub fn to_sse_frame(&self) -> String {
        format!("event: {}\ndata: {}\n\n", self.kind().as_str(), self.payload())
    }
}
