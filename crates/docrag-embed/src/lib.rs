//! docrag-embed
//!
//! Embedding capability implementations: an OpenAI-compatible HTTP client
//! (`api`) and a deterministic hashing embedder for tests and offline runs.

use async_trait::async_trait;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use docrag_core::config::EmbeddingSettings;
use docrag_core::error::{Error, Result};
use docrag_core::traits::Embedder;

pub mod api;

pub use api::ApiEmbedder;

/// Deterministic bag-of-trigrams embedder. Texts sharing word stems land
/// close together, which is enough for ranking tests without a model.
pub struct FakeEmbedder { dim: usize, id: String }

impl FakeEmbedder {
    pub const DEFAULT_DIM: usize = 384;

    pub fn new(dim: usize) -> Self { Self { dim, id: format!("fake:trigram:d{}", dim) } }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        if self.dim == 0 { return v; }
        let lower = text.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let chars: Vec<char> = word.chars().collect();
            if chars.len() < 3 { v[self.bucket(word)] += 1.0; continue; }
            for window in chars.windows(3) { let gram: String = window.iter().collect(); v[self.bucket(&gram)] += 1.0; }
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6); for x in &mut v { *x /= norm; }
        v
    }

    fn bucket(&self, feature: &str) -> usize {
        let mut hasher = XxHash64::with_seed(0); feature.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Default for FakeEmbedder {
    fn default() -> Self { Self::new(Self::DEFAULT_DIM) }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }
    async fn embed(&self, text: &str) -> Result<Vec<f32>> { Ok(self.embed_sync(text)) }
}

fn fake_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Build the embedder selected by `embedding.provider` (`openai` | `fake`).
/// `APP_USE_FAKE_EMBEDDINGS=1` forces the fake embedder.
pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    embedder_for(settings, fake_requested())
}

/// Provider selection with the fake override passed in explicitly.
pub fn embedder_for(settings: &EmbeddingSettings, force_fake: bool) -> Result<Box<dyn Embedder>> {
    if force_fake || settings.provider == "fake" {
        tracing::info!(dim = settings.dimension, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.dimension)));
    }
    match settings.provider.as_str() {
        "openai" => Ok(Box::new(ApiEmbedder::from_settings(settings)?)),
        other => Err(Error::InvalidConfig(format!("unknown embedding provider '{}'", other))),
    }
}
