//! Turns a directory of `.txt` files into content-addressed documents split
//! into overlapping word windows.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One source file ready for embedding and storage.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub title: String,
    pub source_url: String,
    /// blake3 of the full extracted text.
    pub content_hash: String,
    /// Passage texts in ordinal order.
    pub chunks: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    pub window_words: usize,
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { window_words: 300, overlap_words: 50 }
    }
}

#[derive(Default)]
pub struct DataProcessor {
    chunking_config: ChunkingConfig,
}

pub fn content_hash(text: &str) -> String { blake3::hash(text.as_bytes()).to_hex().to_string() }

impl DataProcessor {
    pub fn new() -> Self { Self::default() }

    pub fn with_chunking(chunking_config: ChunkingConfig) -> Self { Self { chunking_config } }

    pub fn process_directory(&self, data_dir: &Path) -> Result<Vec<SourceDocument>> {
        let files = self.list_txt_files(data_dir);
        if files.is_empty() {
            info!(dir = %data_dir.display(), "no .txt files found");
            return Ok(vec![]);
        }
        let mut documents = Vec::new();
        for (file_index, file_path) in files.iter().enumerate() {
            debug!(file = %file_path.display(), n = file_index + 1, total = files.len(), "processing");
            if let Some(doc) = self.process_file(file_path)? {
                documents.push(doc);
            }
        }
        let chunk_total: usize = documents.iter().map(|d| d.chunks.len()).sum();
        info!(files = files.len(), documents = documents.len(), chunks = chunk_total, "processed directory");
        Ok(documents)
    }

    /// `None` when the file holds no text.
    pub fn process_file(&self, file_path: &Path) -> Result<Option<SourceDocument>> {
        let content = self.read_file_content(file_path)?;
        let text = content.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            debug!(file = %file_path.display(), "empty file skipped");
            return Ok(None);
        }
        let title = file_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_path.to_string_lossy().to_string());
        Ok(Some(SourceDocument {
            title,
            source_url: file_path.to_string_lossy().to_string(),
            content_hash: content_hash(&text),
            chunks: self.split_words(&text),
        }))
    }

    fn read_file_content(&self, file_path: &Path) -> Result<String> {
        match fs::read_to_string(file_path) {
            Ok(content) => Ok(content),
            Err(_) => Ok(String::from_utf8_lossy(&fs::read(file_path)?).to_string()),
        }
    }

    /// Windows of `window_words` words, each starting `window_words - overlap_words`
    /// after the previous one; the last window ends at the final word.
    pub fn split_words(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let window = self.chunking_config.window_words.max(1);
        let step = window.saturating_sub(self.chunking_config.overlap_words).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;
        while start < words.len() {
            let end = (start + window).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end >= words.len() { break; }
            start += step;
        }
        chunks
    }

    fn list_txt_files(&self, root: &Path) -> Vec<PathBuf> {
        let mut txt_files = Vec::new();
        for entry in walkdir::WalkDir::new(root).into_iter().filter_map(|e| e.ok()).filter(|e| e.file_type().is_file()) {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("txt") { txt_files.push(path.to_path_buf()); }
        }
        txt_files.sort();
        txt_files
    }
}
