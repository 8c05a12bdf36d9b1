//! Retrieved context for an outside chat conversation.
//!
//! A chat client that runs its own model can still ground it in the store:
//! the documentation relevant to the latest user turn is inserted as a
//! `system` message directly before that turn.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use docrag_core::types::QueryResult;

use crate::retriever::Retriever;

pub const CONTEXT_HEADER: &str = "Here is relevant information from the documentation:\n\n";

/// Results below this similarity are left out of enrichment context.
pub const MIN_CONTEXT_SIMILARITY: f32 = 0.7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self { role: role.into(), content: content.into() }
    }

    pub fn system(content: impl Into<String>) -> Self { Self::new("system", content) }

    pub fn user(content: impl Into<String>) -> Self { Self::new("user", content) }
}

/// Header plus one `[From <source>]: <text>` block per result at or above
/// `min_similarity`, in ranked order. `None` when no result qualifies.
pub fn relevant_context(results: &[QueryResult], min_similarity: f32) -> Option<String> {
    let mut context = String::from(CONTEXT_HEADER);
    let mut included = 0usize;
    for r in results.iter().filter(|r| r.similarity >= min_similarity) {
        let _ = write!(context, "[From {}]: {}\n\n", r.source(), r.text);
        included += 1;
    }
    (included > 0).then_some(context)
}

/// Index of the last `user` message, if any.
pub fn last_user_turn(messages: &[ChatMessage]) -> Option<usize> {
    messages.iter().rposition(|m| m.role == "user")
}

/// Copy of `messages` with a context `system` message inserted right before
/// the last user turn. Unchanged when there is no user turn or no result
/// clears [`MIN_CONTEXT_SIMILARITY`].
pub fn enrich_messages(messages: &[ChatMessage], results: &[QueryResult]) -> Vec<ChatMessage> {
    let mut enriched = messages.to_vec();
    let Some(at) = last_user_turn(messages) else { return enriched };
    if let Some(context) = relevant_context(results, MIN_CONTEXT_SIMILARITY) {
        enriched.insert(at, ChatMessage::system(context));
    }
    enriched
}

/// Query the store with the last user turn and enrich the conversation.
/// Retrieval failures leave the conversation unchanged.
pub async fn enrich_from_store(retriever: &Retriever, messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let Some(at) = last_user_turn(messages) else { return messages.to_vec() };
    match retriever.query_default(&messages[at].content).await {
        Ok(results) => enrich_messages(messages, &results),
        Err(e) => {
            tracing::warn!(error = %e, "context lookup failed; conversation left as is");
            messages.to_vec()
        }
    }
}
