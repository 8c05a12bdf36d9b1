//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` +
//! `config.<env>.toml` + `APP_*` env vars (`__` separates nested keys).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::DEFAULT_MAX_CHUNK_SIZE;
use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding applications).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Typed view of the whole configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub embedding: EmbeddingSettings,
    pub completion: CompletionSettings,
    pub session: SessionSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chunk_size == 0 { return Err(Error::InvalidConfig("chunking.max_chunk_size must be > 0".into())); }
        if self.retrieval.top_k == 0 { return Err(Error::InvalidConfig("retrieval.top_k must be > 0".into())); }
        if self.embedding.timeout_secs == 0 { return Err(Error::InvalidConfig("embedding.timeout_secs must be > 0".into())); }
        if self.completion.timeout_secs == 0 { return Err(Error::InvalidConfig("completion.timeout_secs must be > 0".into())); }
        if self.embedding.dimension == 0 { return Err(Error::InvalidConfig("embedding.dimension must be > 0".into())); }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_chunk_size: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { max_chunk_size: DEFAULT_MAX_CHUNK_SIZE } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub cache_path: String,
}

impl Default for StoreSettings {
    fn default() -> Self { Self { cache_path: "embeddings_cache.json".to_string() } }
}

impl StoreSettings {
    pub fn cache_path(&self) -> PathBuf { expand_path(&self.cache_path) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 3 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `openai` or `fake`.
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "text-embedding-3-small".to_string(),
            endpoint: "https://api.openai.com/v1/embeddings".to_string(),
            dimension: 1536,
            timeout_secs: 30,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl EmbeddingSettings {
    pub fn resolve_api_key(&self) -> Option<String> { resolve_key(self.api_key.as_deref(), &self.api_key_env) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// `openai` or `none`.
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub streaming: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            timeout_secs: 60,
            max_tokens: 500,
            temperature: 0.2,
            streaming: true,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl CompletionSettings {
    pub fn resolve_api_key(&self) -> Option<String> { resolve_key(self.api_key.as_deref(), &self.api_key_env) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Emit a `thinking` event right after `start`.
    pub progress_notices: bool,
    pub thinking_message: String,
    pub generating_message: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            progress_notices: false,
            thinking_message: "Searching for relevant information...".to_string(),
            generating_message: "Generating AI response...".to_string(),
        }
    }
}

fn resolve_key(explicit: Option<&str>, env_name: &str) -> Option<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .map(str::to_string)
        .or_else(|| env::var(env_name).ok().filter(|k| !k.trim().is_empty()))
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
