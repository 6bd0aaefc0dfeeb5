//! Collaborator seams. Every store, model and graph backend is handed to the
//! ranking core as one of these traits; the caller owns their lifecycle.

use std::collections::HashMap;

use crate::error::Result;
use crate::types::{ChunkHit, ChunkId, ChunkKey, ChunkNeighborhood, DocumentId, DocumentMetadata, Entity, KeywordHit};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Nearest-neighbor passage lookup.
pub trait NeighborSource: Send + Sync {
    /// Up to `pool` hits ordered ascending by distance.
    fn nearest(&self, query_vec: &[f32], pool: usize) -> Result<Vec<ChunkHit>>;
}

/// Full-text passage lookup.
pub trait KeywordSource: Send + Sync {
    /// Up to `k` hits ordered by descending BM25 score.
    fn keyword_search(&self, query: &str, k: usize) -> Result<Vec<KeywordHit>>;
}

/// Passage to entity linkage.
pub trait EntityLinker: Send + Sync {
    /// Chunks without links may be absent from the returned map.
    fn entities_for(&self, chunk_ids: &[ChunkId]) -> Result<HashMap<ChunkId, Vec<Entity>>>;
}

/// Document metadata lookup.
pub trait MetadataSource: Send + Sync {
    fn documents(&self, ids: &[DocumentId]) -> Result<HashMap<DocumentId, DocumentMetadata>>;
}

/// Graph traversal around passage coordinates.
pub trait GraphSource: Send + Sync {
    /// One neighborhood per key that exists in the graph, with at most
    /// `max_entities_per_chunk` distinct entities each. A failure tied to a
    /// single key is reported as `Error::KeyFailure`.
    fn neighborhoods(&self, keys: &[ChunkKey], max_entities_per_chunk: usize) -> Result<Vec<ChunkNeighborhood>>;
}
