use anyhow::{anyhow, Result};
use serde::Serialize;
use tracing::{info, warn};

use atlas_core::data_processor::SourceDocument;
use atlas_core::traits::Embedder;

use crate::store::LanceChunkStore;

/// Embeddings are requested in batches of this many passages.
const EMBED_BATCH: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents_written: usize,
    pub documents_skipped: usize,
    pub chunks_written: usize,
}

/// Embeds and stores each document. A document whose content hash is already
/// in the table is skipped, so re-running over the same files is a no-op.
pub fn ingest_documents(store: &LanceChunkStore, embedder: &dyn Embedder, docs: &[SourceDocument]) -> Result<IngestReport> {
    if embedder.dim() != store.dim() {
        return Err(anyhow!("embedder dimension {} does not match table dimension {}", embedder.dim(), store.dim()));
    }
    let mut report = IngestReport::default();
    for doc in docs {
        if store.contains_document(&doc.content_hash)? {
            info!(title = %doc.title, hash = %doc.content_hash, "already ingested, skipping");
            report.documents_skipped += 1;
            continue;
        }
        if doc.chunks.is_empty() {
            warn!(title = %doc.title, "document has no passages");
            report.documents_skipped += 1;
            continue;
        }
        let mut embeddings = Vec::with_capacity(doc.chunks.len());
        for batch in doc.chunks.chunks(EMBED_BATCH) {
            embeddings.extend(embedder.embed_batch(batch)?);
        }
        report.chunks_written += store.write_document(doc, &embeddings)?;
        report.documents_written += 1;
    }
    info!(
        written = report.documents_written,
        skipped = report.documents_skipped,
        chunks = report.chunks_written,
        "ingestion finished"
    );
    Ok(report)
}
