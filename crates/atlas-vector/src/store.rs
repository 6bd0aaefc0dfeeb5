//! Chunk table over LanceDB.
//!
//! The collaborator traits are synchronous, so the store owns a tokio runtime
//! and blocks on it. Do not call these methods from inside another runtime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use arrow_array::types::Float32Type;
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase, Select};
use lancedb::{Connection, DistanceType, Table};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use atlas_core::data_processor::SourceDocument;
use atlas_core::traits::{MetadataSource, NeighborSource};
use atlas_core::types::{chunk_id_for, document_id_for, ChunkHit, DocumentId, DocumentMetadata};
use atlas_core::{Distance, Error, Result};

use crate::schema::build_chunk_schema;
use crate::table::{float32, int32, nullable, open_chunk_table, open_db, utf8};

const VECTOR_STORE: &str = "vector store";

pub struct LanceChunkStore {
    table: Table,
    _db: Connection,
    dim: usize,
    rt: Runtime,
}

impl LanceChunkStore {
    pub fn open(uri: &str, table_name: &str, dim: usize) -> anyhow::Result<Self> {
        let dim_i32 = i32::try_from(dim).context("embedding dimension out of range")?;
        let rt = Runtime::new()?;
        let (db, table) = rt.block_on(async {
            let db = open_db(uri).await?;
            let table = open_chunk_table(&db, table_name, dim_i32).await?;
            anyhow::Ok((db, table))
        })?;
        debug!(uri, table = table_name, dim, "opened chunk store");
        Ok(Self { table, _db: db, dim, rt })
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn count_rows(&self) -> anyhow::Result<usize> {
        Ok(self.rt.block_on(self.table.count_rows(None))?)
    }

    /// Whether any row already carries `content_hash`.
    pub fn contains_document(&self, content_hash: &str) -> anyhow::Result<bool> {
        let found = self.rt.block_on(async {
            let mut stream = self.table.query().select(Select::columns(&["content_hash"])).execute().await?;
            while let Some(batch) = stream.try_next().await? {
                let col = utf8(&batch, "content_hash")?;
                if (0..batch.num_rows()).any(|i| col.value(i) == content_hash) {
                    return anyhow::Ok(true);
                }
            }
            anyhow::Ok(false)
        })?;
        Ok(found)
    }

    /// Appends one row per passage. Returns the number of rows written.
    pub fn write_document(&self, doc: &SourceDocument, embeddings: &[Vec<f32>]) -> anyhow::Result<usize> {
        if doc.chunks.is_empty() { return Ok(0); }
        if doc.chunks.len() != embeddings.len() {
            return Err(anyhow!("{} chunks but {} embeddings", doc.chunks.len(), embeddings.len()));
        }
        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dim) {
            return Err(anyhow!("embedding has dimension {}, table expects {}", bad.len(), self.dim));
        }
        let batch = self.document_batch(doc, embeddings)?;
        let schema = batch.schema();
        let reader = RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema);
        self.rt.block_on(self.table.add(Box::new(reader)).execute())?;
        info!(title = %doc.title, chunks = doc.chunks.len(), "wrote document");
        Ok(doc.chunks.len())
    }

    fn document_batch(&self, doc: &SourceDocument, embeddings: &[Vec<f32>]) -> anyhow::Result<RecordBatch> {
        let document_id = document_id_for(&doc.content_hash);
        let n = doc.chunks.len();
        let ordinals: Vec<i32> = (0..n).map(i32::try_from).collect::<std::result::Result<_, _>>()?;
        let chunk_ids: Vec<String> = ordinals.iter().map(|o| chunk_id_for(&document_id, *o as u32)).collect();
        let vectors = embeddings.iter().map(|v| Some(v.iter().copied().map(Some).collect::<Vec<_>>()));

        Ok(RecordBatch::try_new(
            build_chunk_schema(self.dim as i32),
            vec![
                Arc::new(StringArray::from(chunk_ids)),
                Arc::new(StringArray::from(vec![document_id.clone(); n])),
                Arc::new(StringArray::from(vec![doc.content_hash.clone(); n])),
                Arc::new(StringArray::from(vec![Some(doc.title.clone()); n])),
                Arc::new(StringArray::from(vec![Some(doc.source_url.clone()); n])),
                Arc::new(Int32Array::from(ordinals)),
                Arc::new(StringArray::from(doc.chunks.clone())),
                Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(vectors, self.dim as i32)),
            ],
        )?)
    }

    async fn nearest_rows(&self, query_vec: &[f32], pool: usize) -> anyhow::Result<Vec<ChunkHit>> {
        if self.table.count_rows(None).await? == 0 { return Ok(Vec::new()); }
        let mut stream = self
            .table
            .vector_search(query_vec.to_vec())?
            .distance_type(DistanceType::L2)
            .select(Select::columns(&["chunk_id", "document_id", "ordinal", "text"]))
            .limit(pool)
            .execute()
            .await?;
        let mut hits = Vec::new();
        while let Some(batch) = stream.try_next().await? {
            let chunk_ids = utf8(&batch, "chunk_id")?;
            let doc_ids = utf8(&batch, "document_id")?;
            let ordinals = int32(&batch, "ordinal")?;
            let texts = utf8(&batch, "text")?;
            let distances = float32(&batch, "_distance")?;
            for i in 0..batch.num_rows() {
                hits.push(ChunkHit {
                    chunk_id: chunk_ids.value(i).to_string(),
                    document_id: doc_ids.value(i).to_string(),
                    ordinal: u32::try_from(ordinals.value(i)).context("negative ordinal in chunk table")?,
                    text: texts.value(i).to_string(),
                    distance: Distance::from(distances.value(i)),
                });
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(hits)
    }

    async fn scan_metadata(&self, wanted: &HashSet<&str>) -> anyhow::Result<HashMap<DocumentId, DocumentMetadata>> {
        let mut out = HashMap::new();
        let mut stream = self
            .table
            .query()
            .select(Select::columns(&["document_id", "title", "source_url", "content_hash"]))
            .execute()
            .await?;
        while let Some(batch) = stream.try_next().await? {
            let ids = utf8(&batch, "document_id")?;
            let titles = utf8(&batch, "title")?;
            let urls = utf8(&batch, "source_url")?;
            let hashes = utf8(&batch, "content_hash")?;
            for i in 0..batch.num_rows() {
                let id = ids.value(i);
                if !wanted.contains(id) || out.contains_key(id) { continue; }
                out.insert(
                    id.to_string(),
                    DocumentMetadata {
                        title: nullable(titles, i),
                        source_url: nullable(urls, i),
                        content_hash: Some(hashes.value(i).to_string()),
                    },
                );
            }
            if out.len() == wanted.len() { break; }
        }
        Ok(out)
    }
}

impl NeighborSource for LanceChunkStore {
    fn nearest(&self, query_vec: &[f32], pool: usize) -> Result<Vec<ChunkHit>> {
        if query_vec.len() != self.dim {
            return Err(Error::invalid("query_vec", format!("dimension {} does not match table dimension {}", query_vec.len(), self.dim)));
        }
        self.rt
            .block_on(self.nearest_rows(query_vec, pool))
            .map_err(|e| Error::unavailable(VECTOR_STORE, e.to_string()))
    }
}

impl MetadataSource for LanceChunkStore {
    fn documents(&self, ids: &[DocumentId]) -> Result<HashMap<DocumentId, DocumentMetadata>> {
        if ids.is_empty() { return Ok(HashMap::new()); }
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.rt
            .block_on(self.scan_metadata(&wanted))
            .map_err(|e| Error::unavailable(VECTOR_STORE, e.to_string()))
    }
}
