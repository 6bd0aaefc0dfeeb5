//! In-memory graph store loaded from a JSON snapshot.
//!
//! The snapshot is what an external NER/graph pipeline exports: documents by
//! content hash, passages by `(content_hash, ordinal)`, entities by native id
//! and the passage→entity mentions between them.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use atlas_core::traits::{EntityLinker, GraphSource};
use atlas_core::types::{ChunkId, ChunkKey, ChunkNeighborhood, Entity, GraphChunk, GraphDocument, GraphEntity};
use atlas_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotChunk {
    /// Storage id of the passage in the vector store, used for entity linkage.
    pub chunk_id: Option<ChunkId>,
    pub content_hash: String,
    pub ordinal: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub content_hash: String,
    pub ordinal: u32,
    pub entity_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSnapshot {
    pub documents: Vec<GraphDocument>,
    pub chunks: Vec<SnapshotChunk>,
    pub entities: Vec<GraphEntity>,
    pub mentions: Vec<Mention>,
}

#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    documents: HashMap<String, GraphDocument>,
    chunks: HashMap<ChunkKey, SnapshotChunk>,
    chunk_keys: HashMap<ChunkId, ChunkKey>,
    entities: HashMap<String, GraphEntity>,
    /// Entity ids per chunk, in mention order.
    mentions: HashMap<ChunkKey, Vec<String>>,
}

impl MemoryGraphStore {
    pub fn new() -> Self { Self::default() }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Storage(format!("reading graph snapshot {}: {}", path.display(), e)))?;
        let snapshot: GraphSnapshot = serde_json::from_str(&raw)
            .map_err(|e| Error::Storage(format!("parsing graph snapshot {}: {}", path.display(), e)))?;
        let store = Self::from_snapshot(snapshot)?;
        tracing::info!(
            path = %path.display(),
            documents = store.documents.len(),
            chunks = store.chunks.len(),
            entities = store.entities.len(),
            "loaded graph snapshot"
        );
        Ok(store)
    }

    /// Rejects mentions of unknown entities.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Result<Self> {
        let mut store = Self::new();
        for d in snapshot.documents { store.add_document(d); }
        for c in snapshot.chunks { store.add_chunk(c); }
        for e in snapshot.entities { store.add_entity(e); }
        for m in snapshot.mentions { store.add_mention(ChunkKey::new(m.content_hash, m.ordinal), &m.entity_id)?; }
        Ok(store)
    }

    pub fn add_document(&mut self, doc: GraphDocument) { self.documents.insert(doc.content_hash.clone(), doc); }

    pub fn add_chunk(&mut self, chunk: SnapshotChunk) {
        let key = ChunkKey::new(chunk.content_hash.clone(), chunk.ordinal);
        if let Some(id) = &chunk.chunk_id { self.chunk_keys.insert(id.clone(), key.clone()); }
        self.chunks.insert(key, chunk);
    }

    pub fn add_entity(&mut self, entity: GraphEntity) { self.entities.insert(entity.id.clone(), entity); }

    /// Repeated mentions of the same entity by the same chunk are kept once.
    pub fn add_mention(&mut self, key: ChunkKey, entity_id: &str) -> Result<()> {
        if !self.entities.contains_key(entity_id) {
            return Err(Error::Storage(format!("mention of unknown entity '{entity_id}'")));
        }
        let ids = self.mentions.entry(key).or_default();
        if !ids.iter().any(|e| e == entity_id) { ids.push(entity_id.to_string()); }
        Ok(())
    }

    fn mentioned(&self, key: &ChunkKey) -> impl Iterator<Item = &GraphEntity> {
        self.mentions
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|id| self.entities.get(id))
    }
}

impl GraphSource for MemoryGraphStore {
    /// Keys with no stored chunk are skipped. A chunk whose document is not
    /// stored is a per-key failure.
    fn neighborhoods(&self, keys: &[ChunkKey], max_entities_per_chunk: usize) -> Result<Vec<ChunkNeighborhood>> {
        let mut out = Vec::new();
        for key in keys {
            let Some(chunk) = self.chunks.get(key) else { continue };
            let document = self.documents.get(&key.content_hash).ok_or_else(|| Error::KeyFailure {
                key: format!("{}:{}", key.content_hash, key.ordinal),
                reason: "chunk has no owning document".into(),
            })?;
            out.push(ChunkNeighborhood {
                document: document.clone(),
                chunk: GraphChunk { content_hash: chunk.content_hash.clone(), ordinal: chunk.ordinal, text: chunk.text.clone() },
                entities: self.mentioned(key).take(max_entities_per_chunk).cloned().collect(),
            });
        }
        Ok(out)
    }
}

impl EntityLinker for MemoryGraphStore {
    fn entities_for(&self, chunk_ids: &[ChunkId]) -> Result<HashMap<ChunkId, Vec<Entity>>> {
        let mut out = HashMap::new();
        for id in chunk_ids {
            let Some(key) = self.chunk_keys.get(id) else { continue };
            let ents: Vec<Entity> = self.mentioned(key).map(|e| Entity::new(e.name.clone(), e.kind.clone())).collect();
            if !ents.is_empty() { out.insert(id.clone(), ents); }
        }
        Ok(out)
    }
}
