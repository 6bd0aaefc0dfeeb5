use std::collections::HashMap;

use atlas_core::types::{ChunkHit, DocumentAggregate, DocumentId};
use atlas_core::{Distance, Error, Result};

/// Group `hits` by document, keep each document's `top_chunks` closest
/// passages, rank documents by the mean distance of the kept passages and
/// return the first `top_docs`.
///
/// Ordering is total: passages by (distance, ordinal, chunk_id), documents by
/// (avg_distance, document_id). An empty pool yields an empty list.
pub fn aggregate(hits: Vec<ChunkHit>, top_chunks: usize, top_docs: usize) -> Result<Vec<DocumentAggregate>> {
    if top_chunks == 0 { return Err(Error::invalid("top_chunks", "must be at least 1")); }
    if top_docs == 0 { return Err(Error::invalid("top_docs", "must be at least 1")); }

    let mut docs: Vec<DocumentAggregate> = group_by_document(hits)
        .into_iter()
        .filter_map(|(document_id, mut chunks)| {
            chunks.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.ordinal.cmp(&b.ordinal))
                    .then_with(|| a.chunk_id.cmp(&b.chunk_id))
            });
            chunks.truncate(top_chunks);
            let avg_distance = Distance::mean(chunks.iter().map(|c| c.distance))?;
            Some(DocumentAggregate { document_id, selected_chunks: chunks, avg_distance })
        })
        .collect();

    docs.sort_by(|a, b| a.avg_distance.total_cmp(&b.avg_distance).then_with(|| a.document_id.cmp(&b.document_id)));
    docs.truncate(top_docs);
    tracing::debug!(documents = docs.len(), "aggregated hit pool");
    Ok(docs)
}

/// Partition hits by `document_id`. Every hit lands in exactly one group and
/// no group is empty.
pub fn group_by_document(hits: Vec<ChunkHit>) -> HashMap<DocumentId, Vec<ChunkHit>> {
    let mut groups: HashMap<DocumentId, Vec<ChunkHit>> = HashMap::new();
    for h in hits {
        groups.entry(h.document_id.clone()).or_default().push(h);
    }
    groups
}
