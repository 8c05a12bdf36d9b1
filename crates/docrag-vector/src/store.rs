use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use docrag_core::error::{Error, Result};
use docrag_core::traits::Embedder;
use docrag_core::types::{content_id, Chunk, ChunkId, EmbeddingRecord, Meta, QueryResult, DEFAULT_SOURCE};

use crate::similarity::rank_top_k;
use crate::snapshot::{read_snapshot, write_snapshot};

#[derive(Default)]
struct Inner {
    records: Vec<EmbeddingRecord>,
    positions: HashMap<ChunkId, usize>,
}

impl Inner {
    /// Replace in place when the id exists, append otherwise.
    fn upsert(&mut self, record: EmbeddingRecord) {
        match self.positions.get(&record.id) {
            Some(&pos) => self.records[pos] = record,
            None => {
                self.positions.insert(record.id.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    fn clear(&mut self) {
        self.records.clear();
        self.positions.clear();
    }

    /// Replace everything with `records` in file order. Later duplicates of
    /// an id overwrite the earlier record in place; returns how many collapsed.
    fn restore(&mut self, records: Vec<EmbeddingRecord>) -> usize {
        self.clear();
        let total = records.len();
        for record in records { self.upsert(record); }
        total - self.records.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub count: usize,
    pub dim: usize,
    pub embedder_id: String,
    pub per_source: BTreeMap<String, usize>,
}

/// In-memory embedding store with exact cosine search.
///
/// Embedding calls never run under the lock: vectors are computed first and
/// committed under one short write lock, so searches proceed in parallel with
/// ingest and a failed ingest leaves the store untouched.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    embed_timeout: Duration,
    inner: RwLock<Inner>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn Embedder>, embed_timeout: Duration) -> Self {
        Self { embedder, embed_timeout, inner: RwLock::new(Inner::default()) }
    }

    pub fn embedder_id(&self) -> &str { self.embedder.embedder_id() }

    pub fn dim(&self) -> usize { self.embedder.dim() }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = tokio::time::timeout(self.embed_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| Error::Timeout { operation: "embedding", secs: self.embed_timeout.as_secs() })??;
        if vector.len() != self.dim() {
            return Err(Error::DimensionMismatch { expected: self.dim(), actual: vector.len() });
        }
        Ok(vector)
    }

    /// Embed and store one record keyed by the content hash of `text`.
    pub async fn add_document(&self, text: &str, metadata: Meta) -> Result<ChunkId> {
        let vector = self.embed(text).await?;
        let id = content_id(text);
        self.inner.write().upsert(EmbeddingRecord { id: id.clone(), text: text.to_string(), vector, metadata });
        tracing::debug!(%id, "stored document");
        Ok(id)
    }

    /// Embed every chunk, then commit them together. The first embedding
    /// failure aborts before anything is stored.
    pub async fn add_chunks(&self, chunks: &[Chunk], metadata: &Meta) -> Result<Vec<ChunkId>> {
        let total = chunks.len();
        let mut pending = Vec::with_capacity(total);
        for chunk in chunks {
            let vector = self.embed(&chunk.text).await?;
            let mut meta = metadata.clone();
            meta.insert("doc_id".to_string(), chunk.source_document_id.clone());
            meta.insert("chunk_index".to_string(), chunk.sequence_index.to_string());
            meta.insert("total_chunks".to_string(), total.to_string());
            pending.push(EmbeddingRecord { id: chunk.id.clone(), text: chunk.text.clone(), vector, metadata: meta });
        }
        let ids: Vec<ChunkId> = pending.iter().map(|r| r.id.clone()).collect();
        let mut inner = self.inner.write();
        for record in pending { inner.upsert(record); }
        tracing::debug!(chunks = total, stored = inner.records.len(), "committed chunks");
        Ok(ids)
    }

    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<QueryResult>> {
        if query.trim().is_empty() { return Err(Error::InvalidQuery("query must not be empty".to_string())); }
        if top_k == 0 { return Err(Error::InvalidQuery("top_k must be at least 1".to_string())); }
        if self.is_empty() { return Ok(Vec::new()); }

        let q = self.embed(query).await?;
        let inner = self.inner.read();
        let ranked = rank_top_k(&q, inner.records.iter().map(|r| r.vector.as_slice()), top_k);
        let results: Vec<QueryResult> = ranked
            .into_iter()
            .map(|(pos, similarity)| {
                let r = &inner.records[pos];
                QueryResult { id: r.id.clone(), text: r.text.clone(), metadata: r.metadata.clone(), similarity }
            })
            .collect();
        tracing::debug!(top_k, scanned = inner.records.len(), returned = results.len(), "search");
        Ok(results)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let records = self.records();
        write_snapshot(path, &records)?;
        tracing::info!(path = %path.display(), records = records.len(), "saved embeddings cache");
        Ok(())
    }

    /// Replace the contents with the snapshot at `path` and return the record
    /// count. A missing file leaves the store empty. On a corrupt or
    /// wrong-dimension snapshot the store is reset to empty and the error returned.
    pub fn load(&self, path: &Path) -> Result<usize> {
        let loaded = match read_snapshot(path) {
            Ok(Some(records)) => records,
            Ok(None) => {
                self.clear();
                tracing::info!(path = %path.display(), "no embeddings cache found");
                return Ok(0);
            }
            Err(e) => {
                self.clear();
                tracing::warn!(path = %path.display(), error = %e, "discarding embeddings cache");
                return Err(e);
            }
        };
        if let Some(bad) = loaded.iter().find(|r| r.vector.len() != self.dim()) {
            let err = Error::DimensionMismatch { expected: self.dim(), actual: bad.vector.len() };
            self.clear();
            tracing::warn!(path = %path.display(), error = %err, "embeddings cache built with another embedder");
            return Err(err);
        }
        let mut inner = self.inner.write();
        let collapsed = inner.restore(loaded);
        if collapsed > 0 {
            tracing::warn!(path = %path.display(), collapsed, "embeddings cache repeats ids; kept the last record for each");
        }
        tracing::info!(path = %path.display(), records = inner.records.len(), "loaded embeddings cache");
        Ok(inner.records.len())
    }

    pub fn len(&self) -> usize { self.inner.read().records.len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Cloned copy of every record in insertion order.
    pub fn records(&self) -> Vec<EmbeddingRecord> { self.inner.read().records.clone() }

    pub fn clear(&self) { self.inner.write().clear(); }

    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read();
        let mut per_source = BTreeMap::new();
        for r in &inner.records {
            let source = r.metadata.get("source").cloned().unwrap_or_else(|| DEFAULT_SOURCE.to_string());
            *per_source.entry(source).or_insert(0) += 1;
        }
        StoreStats { count: inner.records.len(), dim: self.dim(), embedder_id: self.embedder_id().to_string(), per_source }
    }
}
