use atlas_core::types::{ChunkKey, DocumentResult, RankedHit};
use atlas_core::Score;

/// One [`RankedHit`] per passage of every document, best score first,
/// truncated to `limit`. Equal scores order by document_id, then ordinal.
pub fn flatten(docs: &[DocumentResult], limit: usize) -> Vec<RankedHit> {
    let mut hits: Vec<RankedHit> = docs
        .iter()
        .flat_map(|d| {
            d.chunks.iter().map(move |c| RankedHit {
                text: c.text.clone(),
                score: Score::from(c.distance),
                content_hash: d.content_hash.clone(),
                ordinal: c.ordinal,
                chunk_id: c.chunk_id.clone(),
                title: d.title.clone(),
                document_id: d.document_id.clone(),
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.document_id.cmp(&b.document_id))
            .then(a.ordinal.cmp(&b.ordinal))
    });
    hits.truncate(limit);
    hits
}

/// Graph coordinates of `hits`, in hit order, without duplicates. Hits with
/// no usable content hash are left out.
pub fn graph_keys(hits: &[RankedHit]) -> Vec<ChunkKey> {
    let mut keys: Vec<ChunkKey> = Vec::new();
    for h in hits {
        let Some(hash) = h.content_hash.as_deref().map(str::trim).filter(|s| !s.is_empty()) else { continue };
        let key = ChunkKey::new(hash, h.ordinal);
        if !keys.contains(&key) { keys.push(key); }
    }
    keys
}
