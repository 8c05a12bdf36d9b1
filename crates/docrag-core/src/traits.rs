use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;

/// Lazy sequence of answer fragments in production order.
pub type FragmentStream = BoxStream<'static, Result<String>>;

/// Embedding capability: text in, fixed-length vector out.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Stable identifier for the provider/model (e.g. `openai:text-embedding-3-small:d1536`).
    fn embedder_id(&self) -> &str;
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Fails with `EmbeddingUnavailable` on network, auth or rate-limit errors.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Completion capability: prompt in, answer text out.
#[async_trait]
pub trait Completer: Send + Sync {
    fn model_id(&self) -> &str;

    /// Fails with `CompletionUnavailable`.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Whether `complete_streaming` yields fragments as they are produced.
    fn supports_streaming(&self) -> bool { false }

    /// Incremental output. Providers without native streaming yield the
    /// complete answer as a single fragment.
    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream> {
        let text = self.complete(prompt).await?;
        Ok(Box::pin(futures::stream::once(async move { Ok(text) })))
    }
}
