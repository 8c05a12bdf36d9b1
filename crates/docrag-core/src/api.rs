//! Request/response shapes at the transport boundary.
//!
//! Transports (HTTP handlers, the CLI) deserialize loosely-typed input into
//! [`QueryRequest`], validate it once, and hand typed values to the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::QueryResult;

/// Incoming query. `request_type` values `search`, `inform` and `user_query`
/// all map to the same retrieval + generation path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub request_type: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: Some(query.into()), ..Self::default() }
    }

    /// The trimmed query text, or `InvalidQuery` when missing or blank.
    pub fn validated_query(&self) -> Result<&str> {
        match self.query.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err(Error::InvalidQuery("query parameter is required".to_string())),
        }
    }

    pub fn validated_top_k(&self, default_top_k: usize) -> Result<usize> {
        match self.top_k {
            Some(0) => Err(Error::InvalidQuery("top_k must be at least 1".to_string())),
            Some(k) => Ok(k),
            None => Ok(default_top_k),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub result_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self { Self { error: e.to_string() } }
}
