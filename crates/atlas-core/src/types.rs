//! Request-scoped domain types shared by ranking, enrichment and graph assembly.

use serde::{Deserialize, Serialize};

use crate::score::{Distance, Score};

pub type ChunkId = String;
pub type DocumentId = String;

/// Storage id of a document, derived from its content hash so re-ingesting
/// identical text reuses it.
pub fn document_id_for(content_hash: &str) -> DocumentId {
    let short: String = content_hash.chars().take(16).collect();
    format!("doc-{short}")
}

pub fn chunk_id_for(document_id: &str, ordinal: u32) -> ChunkId { format!("{document_id}:{ordinal}") }

/// One nearest-neighbor passage hit.
///
/// - `chunk_id`: storage identifier of the passage
/// - `document_id`: owning document
/// - `ordinal`: position of the passage within its document
/// - `distance`: query distance reported by the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub ordinal: u32,
    pub text: String,
    pub distance: Distance,
}

/// Hits of one document narrowed to its best passages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAggregate {
    pub document_id: DocumentId,
    /// Ascending by distance, never empty.
    pub selected_chunks: Vec<ChunkHit>,
    /// Mean distance over `selected_chunks` only.
    pub avg_distance: Distance,
}

/// Document-level metadata supplied by the relational store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub content_hash: Option<String>,
}

/// A named entity linked to a passage. Identity is the `(name, kind)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entity {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self { name: name.into(), kind: kind.into() }
    }
}

/// A ranked document with metadata and its deduplicated entities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentResult {
    pub document_id: DocumentId,
    pub title: Option<String>,
    pub source_url: Option<String>,
    pub content_hash: Option<String>,
    pub avg_distance: Distance,
    pub chunks: Vec<ChunkHit>,
    /// First-seen order, unique by `(name, type)`.
    pub entities: Vec<Entity>,
}

/// One entry of a flat, score-ordered hit list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedHit {
    pub text: String,
    pub score: Score,
    pub content_hash: Option<String>,
    pub ordinal: u32,
    pub chunk_id: ChunkId,
    pub title: Option<String>,
    pub document_id: DocumentId,
}

/// One keyword match, scored by BM25 (higher is better).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub content_hash: String,
    pub ordinal: u32,
    pub text: String,
    pub bm25_score: f32,
}

/// Natural coordinate of a passage: owning document hash plus ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub content_hash: String,
    pub ordinal: u32,
}

impl ChunkKey {
    pub fn new(content_hash: impl Into<String>, ordinal: u32) -> Self {
        Self { content_hash: content_hash.into(), ordinal }
    }
}

/// Document record returned by a graph traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub content_hash: String,
    pub title: Option<String>,
    pub source_url: Option<String>,
}

/// Passage record returned by a graph traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphChunk {
    pub content_hash: String,
    pub ordinal: u32,
    pub text: String,
}

/// Entity record returned by a graph traversal, `id` is the store's native id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntity {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Everything a traversal found around one [`ChunkKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkNeighborhood {
    pub document: GraphDocument,
    pub chunk: GraphChunk,
    pub entities: Vec<GraphEntity>,
}
