//! Per-query streaming state machine.
//!
//! Event grammar: `start, [thinking], document*, sources, generating,
//! content*, end` on success, `start, [thinking], error` when retrieval fails.

use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;

use docrag_core::config::SessionSettings;
use docrag_core::types::StreamEvent;

use crate::fragments::split_fragments;
use crate::generator::{build_prompt, fallback_answer, source_summary, AnswerGenerator, NO_RESULTS_ANSWER};
use crate::retriever::Retriever;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Init,
    Retrieving,
    Generating,
    Done,
}

/// One query's event stream. Consumed by [`StreamingSession::into_stream`],
/// so a session runs at most once; dropping the stream stops it.
pub struct StreamingSession {
    query: String,
    top_k: usize,
    retriever: Arc<Retriever>,
    generator: Arc<AnswerGenerator>,
    settings: SessionSettings,
}

impl StreamingSession {
    pub fn new(query: impl Into<String>, retriever: Arc<Retriever>, generator: Arc<AnswerGenerator>) -> Self {
        let top_k = retriever.top_k();
        Self { query: query.into(), top_k, retriever, generator, settings: SessionSettings::default() }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn into_stream(self) -> BoxStream<'static, StreamEvent> {
        let StreamingSession { query, top_k, retriever, generator, settings } = self;
        let stream = async_stream::stream! {
            let mut state = SessionState::Init;
            yield StreamEvent::Start { query: query.clone() };
            if settings.progress_notices {
                yield StreamEvent::Thinking { message: settings.thinking_message.clone() };
            }

            advance(&mut state, SessionState::Retrieving);
            let results = match retriever.query(&query, top_k).await {
                Ok(results) => results,
                Err(e) => {
                    if e.is_retrieval_failure() {
                        tracing::warn!(error = %e, "retrieval failed");
                    } else {
                        tracing::debug!(error = %e, "query rejected");
                    }
                    advance(&mut state, SessionState::Done);
                    yield StreamEvent::Error { message: e.to_string() };
                    return;
                }
            };
            for (index, r) in results.iter().enumerate() {
                yield StreamEvent::Document {
                    index,
                    text: r.text.clone(),
                    similarity: r.similarity,
                    source: r.source().to_string(),
                };
            }
            yield StreamEvent::Sources { sources: source_summary(&results) };

            advance(&mut state, SessionState::Generating);
            yield StreamEvent::Generating { message: settings.generating_message.clone() };

            if results.is_empty() {
                yield StreamEvent::Content { chunk: NO_RESULTS_ANSWER.to_string() };
            } else if generator.completer().supports_streaming() {
                let completer = generator.completer().clone();
                let deadline = tokio::time::Instant::now() + generator.timeout();
                let prompt = build_prompt(&query, &results);
                let mut emitted = 0usize;
                let mut failure: Option<String> = None;
                // Leading whitespace-only fragments wait for real text.
                let mut held: Vec<String> = Vec::new();

                match tokio::time::timeout_at(deadline, completer.complete_streaming(&prompt)).await {
                    Ok(Ok(mut fragments)) => loop {
                        match tokio::time::timeout_at(deadline, fragments.next()).await {
                            Ok(Some(Ok(chunk))) => {
                                if chunk.is_empty() { continue; }
                                if emitted == 0 && chunk.trim().is_empty() {
                                    held.push(chunk);
                                    continue;
                                }
                                for pending in std::mem::take(&mut held) {
                                    yield StreamEvent::Content { chunk: pending };
                                }
                                emitted += 1;
                                yield StreamEvent::Content { chunk };
                            }
                            Ok(Some(Err(e))) => { failure = Some(e.to_string()); break; }
                            Ok(None) => break,
                            Err(_) => { failure = Some("completion timed out".to_string()); break; }
                        }
                    },
                    Ok(Err(e)) => failure = Some(e.to_string()),
                    Err(_) => failure = Some("completion timed out".to_string()),
                }
                if emitted == 0 {
                    let reason = failure.unwrap_or_else(|| "empty completion".to_string());
                    tracing::warn!(%reason, "streaming fallback answer");
                    for piece in split_fragments(&fallback_answer(&results)) {
                        yield StreamEvent::Content { chunk: piece.to_string() };
                    }
                } else if let Some(reason) = failure {
                    tracing::warn!(%reason, fragments = emitted, "completion stopped mid-stream; keeping partial answer");
                }
            } else {
                let answer = generator.generate(&query, &results).await;
                for piece in split_fragments(&answer.text) {
                    yield StreamEvent::Content { chunk: piece.to_string() };
                }
            }

            advance(&mut state, SessionState::Done);
            yield StreamEvent::End { complete: true };
        };
        Box::pin(stream)
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    tracing::debug!(from = ?*state, to = ?next, "session transition");
    *state = next;
}
