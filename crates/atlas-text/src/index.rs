use std::path::Path;

use anyhow::{anyhow, Result};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Value};
use tantivy::{doc, Index, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info, warn};

use atlas_core::data_processor::SourceDocument;
use atlas_core::traits::KeywordSource;
use atlas_core::types::{chunk_id_for, document_id_for, KeywordHit};
use atlas_core::Error;

use crate::schema::{build_passage_schema, register_tokenizer};

const WRITER_HEAP_BYTES: usize = 50_000_000;

pub struct KeywordIndex {
    index: Index,
    chunk_id: Field,
    document_id: Field,
    content_hash: Field,
    ordinal: Field,
    text: Field,
}

impl KeywordIndex {
    /// Opens the index in `dir`, creating the directory and an empty index
    /// when missing.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let index = Index::open_or_create(MmapDirectory::open(dir)?, build_passage_schema())?;
        register_tokenizer(&index);
        let schema = index.schema();
        Ok(Self {
            chunk_id: schema.get_field("chunk_id")?,
            document_id: schema.get_field("document_id")?,
            content_hash: schema.get_field("content_hash")?,
            ordinal: schema.get_field("ordinal")?,
            text: schema.get_field("text")?,
            index,
        })
    }

    /// Indexes every passage of `docs`. Passages previously indexed under the
    /// same content hash are replaced, so repeated runs do not duplicate.
    pub fn index_documents(&self, docs: &[SourceDocument]) -> Result<usize> {
        let mut writer: IndexWriter = self.index.writer(WRITER_HEAP_BYTES)?;
        let mut passages = 0usize;
        for d in docs {
            writer.delete_term(Term::from_field_text(self.content_hash, &d.content_hash));
            let document_id = document_id_for(&d.content_hash);
            for (ordinal, text) in d.chunks.iter().enumerate() {
                let ordinal = u32::try_from(ordinal)?;
                writer.add_document(doc!(
                    self.chunk_id => chunk_id_for(&document_id, ordinal),
                    self.document_id => document_id.clone(),
                    self.content_hash => d.content_hash.clone(),
                    self.ordinal => u64::from(ordinal),
                    self.text => text.clone(),
                ))?;
                passages += 1;
            }
        }
        writer.commit()?;
        info!(documents = docs.len(), passages, "keyword index committed");
        Ok(passages)
    }

    pub fn num_passages(&self) -> Result<u64> {
        Ok(self.index.reader()?.searcher().num_docs())
    }

    /// Best `k` passages for `query`, BM25 descending, ties by chunk id.
    /// Query syntax errors are tolerated: the parsable part is searched.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<KeywordHit>> {
        if k == 0 { return Ok(Vec::new()); }
        let searcher = self.index.reader()?.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.text]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            warn!(query, errors = errors.len(), "ignoring unparsable parts of keyword query");
        }
        let top = searcher.search(&parsed, &TopDocs::with_limit(k))?;
        let mut hits = Vec::with_capacity(top.len());
        for (score, addr) in top {
            let d: TantivyDocument = searcher.doc(addr)?;
            hits.push(KeywordHit {
                chunk_id: self.stored_str(&d, self.chunk_id)?,
                document_id: self.stored_str(&d, self.document_id)?,
                content_hash: self.stored_str(&d, self.content_hash)?,
                ordinal: d
                    .get_first(self.ordinal)
                    .and_then(|v| v.as_u64())
                    .and_then(|o| u32::try_from(o).ok())
                    .ok_or_else(|| anyhow!("stored ordinal missing"))?,
                text: self.stored_str(&d, self.text)?,
                bm25_score: score,
            });
        }
        hits.sort_by(|a, b| b.bm25_score.total_cmp(&a.bm25_score).then_with(|| a.chunk_id.cmp(&b.chunk_id)));
        debug!(query, hits = hits.len(), "keyword search");
        Ok(hits)
    }

    fn stored_str(&self, d: &TantivyDocument, field: Field) -> Result<String> {
        d.get_first(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow!("stored field {} missing", self.index.schema().get_field_name(field)))
    }
}

impl KeywordSource for KeywordIndex {
    fn keyword_search(&self, query: &str, k: usize) -> atlas_core::Result<Vec<KeywordHit>> {
        self.search(query, k).map_err(|e| Error::unavailable("keyword index", e))
    }
}
