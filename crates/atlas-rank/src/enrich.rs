use std::collections::{HashMap, HashSet};

use atlas_core::traits::EntityLinker;
use atlas_core::types::{ChunkHit, ChunkId, DocumentAggregate, DocumentId, DocumentMetadata, DocumentResult, Entity};

pub type EntityLinks = HashMap<ChunkId, Vec<Entity>>;

/// Entities of `chunks` in rank order, unique by `(name, type)`, first
/// appearance wins.
pub fn collect_entities(chunks: &[ChunkHit], links: &EntityLinks) -> Vec<Entity> {
    let mut seen: HashSet<&Entity> = HashSet::new();
    let mut out = Vec::new();
    for c in chunks {
        let Some(ents) = links.get(&c.chunk_id) else { continue };
        for e in ents {
            if seen.insert(e) { out.push(e.clone()); }
        }
    }
    out
}

/// Merge ranked documents with their metadata and entities.
///
/// `links == None` means linkage was unavailable: every document gets an
/// empty entity list. Documents missing from `metadata` keep empty metadata.
pub fn enrich(
    docs: Vec<DocumentAggregate>,
    metadata: &HashMap<DocumentId, DocumentMetadata>,
    links: Option<&EntityLinks>,
) -> Vec<DocumentResult> {
    docs.into_iter()
        .map(|d| {
            let entities = links.map(|l| collect_entities(&d.selected_chunks, l)).unwrap_or_default();
            let meta = metadata.get(&d.document_id).cloned().unwrap_or_default();
            DocumentResult {
                document_id: d.document_id,
                title: meta.title,
                source_url: meta.source_url,
                content_hash: meta.content_hash,
                avg_distance: d.avg_distance,
                chunks: d.selected_chunks,
                entities,
            }
        })
        .collect()
}

/// Ask `linker` for the entities of every selected chunk.
///
/// Failures are absorbed: the caller gets `None` and a warning is logged.
pub fn lookup_links(linker: &dyn EntityLinker, docs: &[DocumentAggregate]) -> Option<EntityLinks> {
    let ids: Vec<ChunkId> = docs.iter().flat_map(|d| d.selected_chunks.iter().map(|c| c.chunk_id.clone())).collect();
    if ids.is_empty() { return Some(EntityLinks::new()); }
    match linker.entities_for(&ids) {
        Ok(links) => Some(links),
        Err(e) => {
            tracing::warn!(error = %e, chunks = ids.len(), "entity linkage failed, returning documents without entities");
            None
        }
    }
}
