//! OpenAI-compatible `/v1/chat/completions` client.

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;

use docrag_core::config::CompletionSettings;
use docrag_core::error::{Error, Result};
use docrag_core::traits::{Completer, FragmentStream};

use crate::sse::{SseDecoder, SseItem};

const SYSTEM_PROMPT: &str = "You are a helpful documentation assistant. Answer using only the provided context.";

pub struct OpenAiCompleter {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    streaming: bool,
}

impl OpenAiCompleter {
    pub fn new(settings: &CompletionSettings, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            streaming: settings.streaming,
        })
    }

    fn request_body(&self, prompt: &str, stream: bool) -> Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "stream": stream,
        })
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let response = self.client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::CompletionUnavailable(format!("request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::CompletionUnavailable(format!("API returned {}: {}", status, detail)));
        }
        Ok(response)
    }
}

#[async_trait]
impl Completer for OpenAiCompleter {
    fn model_id(&self) -> &str { &self.model }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self.send(&self.request_body(prompt, false)).await?;
        let json: Value = response
            .json()
            .await
            .map_err(|e| Error::CompletionUnavailable(format!("failed to parse response: {}", e)))?;
        parse_completion_response(&json)
    }

    fn supports_streaming(&self) -> bool { self.streaming }

    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream> {
        let response = self.send(&self.request_body(prompt, true)).await?;
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut bytes = Box::pin(response.bytes_stream());
            while let Some(chunk) = bytes.next().await {
                match chunk {
                    Ok(chunk) => {
                        for item in decoder.push(&chunk) {
                            match item {
                                SseItem::Delta(text) => yield Ok(text),
                                SseItem::Done => return,
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(Error::CompletionUnavailable(format!("stream interrupted: {}", e)));
                        return;
                    }
                }
            }
        };
        Ok(Box::pin(stream))
    }
}

/// Extract `choices[0].message.content` from a chat completion response.
pub fn parse_completion_response(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::CompletionUnavailable("unexpected completion response shape".to_string()))
}
