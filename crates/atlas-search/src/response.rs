use serde::Serialize;

use atlas_core::types::{ChunkId, DocumentId, DocumentResult, Entity, KeywordHit, RankedHit};
use atlas_core::Distance;
use atlas_graph::Graph;

/// Either a ranked payload or the distinct "nothing matched" outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome<T> {
    Ranked(T),
    NoMatches { query: String },
}

impl<T> SearchOutcome<T> {
    pub fn ranked(self) -> Option<T> {
        match self {
            SearchOutcome::Ranked(t) => Some(t),
            SearchOutcome::NoMatches { .. } => None,
        }
    }

    pub fn is_no_matches(&self) -> bool { matches!(self, SearchOutcome::NoMatches { .. }) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSearchResponse {
    pub query: String,
    pub top_docs: usize,
    pub results: Vec<DocumentResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedResponse {
    pub hits: Vec<RankedHit>,
    pub graph: Graph,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkResult {
    pub chunk_id: ChunkId,
    pub document_id: DocumentId,
    pub text: String,
    pub distance: Distance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<Entity>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkSearchResponse {
    pub query: String,
    pub top_k: usize,
    pub results: Vec<ChunkResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordSearchResponse {
    pub query: String,
    pub k: usize,
    pub results: Vec<KeywordHit>,
}
