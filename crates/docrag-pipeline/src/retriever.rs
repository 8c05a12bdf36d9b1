use std::sync::Arc;

use docrag_core::chunker::chunk_document;
use docrag_core::config::Settings;
use docrag_core::error::Result;
use docrag_core::types::{content_id, ChunkId, Meta, QueryResult};
use docrag_vector::VectorStore;

/// Turns documents into stored chunks and queries into ranked results.
pub struct Retriever {
    store: Arc<VectorStore>,
    max_chunk_size: usize,
    top_k: usize,
}

impl Retriever {
    pub fn new(store: Arc<VectorStore>, max_chunk_size: usize, top_k: usize) -> Self {
        Self { store, max_chunk_size, top_k }
    }

    pub fn from_settings(store: Arc<VectorStore>, settings: &Settings) -> Self {
        Self::new(store, settings.chunking.max_chunk_size, settings.retrieval.top_k)
    }

    pub fn store(&self) -> &Arc<VectorStore> { &self.store }

    pub fn top_k(&self) -> usize { self.top_k }

    /// Chunk and ingest one document. Every chunk shares `metadata`; the
    /// document id is `metadata["doc_id"]` when given, else a content hash.
    /// Nothing is stored if any chunk fails to embed.
    pub async fn add_document(&self, text: &str, metadata: Meta) -> Result<Vec<ChunkId>> {
        let doc_id = metadata.get("doc_id").cloned().unwrap_or_else(|| content_id(text));
        let chunks = chunk_document(text, &doc_id, self.max_chunk_size);
        if chunks.is_empty() { return Ok(Vec::new()); }
        let ids = self.store.add_chunks(&chunks, &metadata).await?;
        tracing::debug!(%doc_id, chunks = ids.len(), "ingested document");
        Ok(ids)
    }

    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<QueryResult>> {
        self.store.search(text, top_k).await
    }

    pub async fn query_default(&self, text: &str) -> Result<Vec<QueryResult>> {
        self.query(text, self.top_k).await
    }
}
