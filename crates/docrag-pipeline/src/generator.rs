use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use docrag_core::traits::Completer;
use docrag_core::types::QueryResult;

pub const NO_RESULTS_ANSWER: &str = "I couldn't find any information related to your query in the documentation.";
pub const FALLBACK_PREFIX: &str = "Based on the available documentation: ";

const BEST_EXCERPT_CHARS: usize = 500;
const EXTRA_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
    pub used_fallback: bool,
}

/// Produces an answer grounded in ranked results. Never fails: completion
/// errors, timeouts and empty output all fall back to [`fallback_answer`].
pub struct AnswerGenerator {
    completer: Arc<dyn Completer>,
    timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(completer: Arc<dyn Completer>, timeout: Duration) -> Self { Self { completer, timeout } }

    pub fn completer(&self) -> &Arc<dyn Completer> { &self.completer }

    pub fn timeout(&self) -> Duration { self.timeout }

    pub async fn generate(&self, query: &str, results: &[QueryResult]) -> Answer {
        let sources = source_summary(results);
        if results.is_empty() {
            return Answer { text: NO_RESULTS_ANSWER.to_string(), sources, used_fallback: false };
        }
        let prompt = build_prompt(query, results);
        let reason = match tokio::time::timeout(self.timeout, self.completer.complete(&prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => {
                return Answer { text, sources, used_fallback: false };
            }
            Ok(Ok(_)) => "empty completion".to_string(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("completion timed out after {}s", self.timeout.as_secs()),
        };
        tracing::warn!(model = self.completer.model_id(), %reason, "using fallback answer");
        Answer { text: fallback_answer(results), sources, used_fallback: true }
    }
}

/// `"<source> (<pct>% relevance)"` per result, percent truncated toward zero.
pub fn source_summary(results: &[QueryResult]) -> Vec<String> {
    results.iter().map(|r| format!("{} ({}% relevance)", r.source(), relevance_pct(r.similarity))).collect()
}

fn relevance_pct(similarity: f32) -> i32 { (similarity * 100.0).trunc() as i32 }

pub fn build_prompt(query: &str, results: &[QueryResult]) -> String {
    let mut prompt = String::from(
        "Answer the question using only the documentation excerpts below. \
         If they do not contain the answer, say so.\n\n",
    );
    for (i, r) in results.iter().enumerate() {
        let _ = write!(prompt, "[{}] From {} ({}% relevance):\n{}\n\n", i + 1, r.source(), relevance_pct(r.similarity), r.text.trim());
    }
    let _ = write!(prompt, "Question: {}\nAnswer:", query.trim());
    prompt
}

/// Deterministic extractive answer built from the ranked results alone.
pub fn fallback_answer(results: &[QueryResult]) -> String {
    let Some((best, rest)) = results.split_first() else {
        return NO_RESULTS_ANSWER.to_string();
    };
    let mut text = format!("{}{}", FALLBACK_PREFIX, excerpt(&best.text, BEST_EXCERPT_CHARS));
    for r in rest {
        let _ = write!(text, "\n\nAlso from {}: {}", r.source(), excerpt(&r.text, EXTRA_EXCERPT_CHARS));
    }
    text
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars { return text.to_string(); }
    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => &cut[..pos],
        _ => cut.as_str(),
    };
    format!("{}...", cut.trim_end())
}
