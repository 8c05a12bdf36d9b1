//! OpenAI-compatible `/v1/embeddings` client.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use docrag_core::config::EmbeddingSettings;
use docrag_core::error::{Error, Result};
use docrag_core::traits::Embedder;

pub struct ApiEmbedder {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    dim: usize,
    id: String,
}

impl ApiEmbedder {
    pub fn new(endpoint: String, model: String, api_key: String, dim: usize, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        let id = format!("openai:{}:d{}", model, dim);
        Ok(Self { client, endpoint, model, api_key, dim, id })
    }

    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let api_key = settings.resolve_api_key().ok_or_else(|| {
            Error::InvalidConfig(format!("no embedding API key: set embedding.api_key or {}", settings.api_key_env))
        })?;
        Self::new(settings.endpoint.clone(), settings.model.clone(), api_key, settings.dimension, Duration::from_secs(settings.timeout_secs))
    }
}

#[async_trait]
impl Embedder for ApiEmbedder {
    fn embedder_id(&self) -> &str { &self.id }
    fn dim(&self) -> usize { self.dim }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({ "input": text, "model": self.model });
        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!("API returned {}: {}", status, detail)));
        }
        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::EmbeddingUnavailable(format!("failed to parse response: {}", e)))?;
        parse_embedding_response(&json)
    }
}

/// Extract the first embedding from `{"data": [{"embedding": [...]}]}`.
pub fn parse_embedding_response(json: &Value) -> Result<Vec<f32>> {
    let values = json
        .get("data")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|obj| obj.get("embedding"))
        .and_then(Value::as_array)
        .ok_or_else(|| Error::EmbeddingUnavailable("unexpected embeddings response shape".to_string()))?;
    values
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32).ok_or_else(|| Error::EmbeddingUnavailable("non-numeric embedding value".to_string())))
        .collect()
}
