//! Flat-file JSON snapshot of the store.
//!
//! Format: a JSON array of `{id, text, vector, metadata}`. Older caches that
//! name the vector `embedding`, omit `id`, or carry non-string metadata
//! values are still accepted on read.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use docrag_core::error::{Error, Result};
use docrag_core::types::{content_id, EmbeddingRecord, Meta};

#[derive(Serialize)]
struct RecordOut<'a> {
    id: &'a str,
    text: &'a str,
    vector: &'a [f32],
    metadata: &'a Meta,
}

#[derive(Deserialize)]
struct RecordIn {
    #[serde(default)]
    id: Option<String>,
    text: String,
    #[serde(alias = "embedding")]
    vector: Vec<f32>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

impl From<RecordIn> for EmbeddingRecord {
    fn from(r: RecordIn) -> Self {
        let id = r.id.filter(|s| !s.is_empty()).unwrap_or_else(|| content_id(&r.text));
        let metadata = r
            .metadata
            .into_iter()
            .map(|(k, v)| {
                let v = match v { serde_json::Value::String(s) => s, other => other.to_string() };
                (k, v)
            })
            .collect();
        EmbeddingRecord { id, text: r.text, vector: r.vector, metadata }
    }
}

/// Write atomically: temp file in the destination directory, then rename.
pub fn write_snapshot(path: &Path, records: &[EmbeddingRecord]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let out: Vec<RecordOut<'_>> = records
            .iter()
            .map(|r| RecordOut { id: &r.id, text: &r.text, vector: &r.vector, metadata: &r.metadata })
            .collect();
        let mut writer = BufWriter::new(tmp.as_file_mut());
        serde_json::to_writer(&mut writer, &out).map_err(|e| Error::Io(io::Error::new(io::ErrorKind::Other, e)))?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// `Ok(None)` when the file does not exist; `CacheCorrupt` when it does not parse.
pub fn read_snapshot(path: &Path) -> Result<Option<Vec<EmbeddingRecord>>> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let records: Vec<RecordIn> = serde_json::from_slice(&bytes)
        .map_err(|e| Error::CacheCorrupt { path: path.to_path_buf(), reason: e.to_string() })?;
    Ok(Some(records.into_iter().map(EmbeddingRecord::from).collect()))
}
