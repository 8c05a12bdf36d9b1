use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::types::{Meta, SourceDocument};

/// Directory-backed document source: every `.txt` file becomes one document.
#[derive(Debug, Clone, Default)]
pub struct DataProcessor {
    limit: Option<usize>,
}

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    /// Only read the first `limit` files (in sorted order).
    pub fn with_limit(limit: usize) -> Self { Self { limit: Some(limit) } }

    pub fn load_directory(&self, data_dir: &Path) -> Result<Vec<SourceDocument>> {
        let mut files = self.list_txt_files(data_dir);
        if files.is_empty() {
            tracing::warn!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        if let Some(limit) = self.limit {
            if files.len() > limit { files.truncate(limit); tracing::info!(limit, "limited document source"); }
        }
        let mut documents = Vec::with_capacity(files.len());
        for (file_index, file_path) in files.iter().enumerate() {
            tracing::debug!(file = %file_path.display(), "reading {}/{}", file_index + 1, files.len());
            let text = self.read_file_content(file_path)?;
            if text.trim().is_empty() { continue; }
            documents.push(SourceDocument { text, metadata: self.metadata_for(file_path, data_dir) });
        }
        Ok(documents)
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    fn metadata_for(&self, file_path: &Path, data_dir: &Path) -> Meta {
        let mut meta = Meta::new();
        let source = file_path.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_else(|| "unknown".to_string());
        meta.insert("source".to_string(), source);
        meta.insert("path".to_string(), file_path.to_string_lossy().to_string());
        meta.insert("category".to_string(), self.category_from_path(file_path, data_dir));
        meta
    }

    fn category_from_path(&self, file_path: &Path, data_dir: &Path) -> String {
        let relative_path = file_path.strip_prefix(data_dir).unwrap_or(file_path);
        match relative_path.parent().and_then(|p| p.to_str()) {
            Some(parent) if !parent.is_empty() => parent.to_string(),
            _ => "misc".to_string(),
        }
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path(); if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort(); txt_files
    }
}
