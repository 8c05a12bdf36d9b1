//! docrag-complete
//!
//! Completion capability implementations. `openai` talks to any
//! OpenAI-compatible chat endpoint; [`Unavailable`] stands in when no
//! provider is configured so callers fall through to extractive answers.

use async_trait::async_trait;

use docrag_core::config::CompletionSettings;
use docrag_core::error::{Error, Result};
use docrag_core::traits::Completer;

pub mod openai;
pub mod sse;

pub use openai::OpenAiCompleter;

/// A completer that always fails with `CompletionUnavailable`.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self { Self { reason: reason.into() } }
}

#[async_trait]
impl Completer for Unavailable {
    fn model_id(&self) -> &str { "none" }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::CompletionUnavailable(self.reason.clone()))
    }
}

/// Build the completer selected by `completion.provider` (`openai` | `none`).
///
/// A missing API key is not fatal: the answer generator falls back to
/// extractive answers, so we log and hand back [`Unavailable`].
pub fn get_default_completer(settings: &CompletionSettings) -> Result<Box<dyn Completer>> {
    match settings.provider.as_str() {
        "none" => Ok(Box::new(Unavailable::new("completion disabled (provider = none)"))),
        "openai" => match settings.resolve_api_key() {
            Some(key) => Ok(Box::new(OpenAiCompleter::new(settings, key)?)),
            None => {
                tracing::warn!(env = %settings.api_key_env, "no completion API key; answers will use the extractive fallback");
                Ok(Box::new(Unavailable::new(format!("no API key (set {})", settings.api_key_env))))
            }
        },
        other => Err(Error::InvalidConfig(format!("unknown completion provider '{}'", other))),
    }
}
