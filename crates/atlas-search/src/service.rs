//! The request pipeline.
//!
//! embed query → nearest passages → aggregate by document → metadata and
//! optional entity enrichment → optional flattening and graph assembly.

use std::collections::HashMap;
use std::slice;

use tracing::{debug, info, instrument, warn};

use atlas_core::config::SearchLimits;
use atlas_core::traits::{Embedder, EntityLinker, GraphSource, KeywordSource, MetadataSource, NeighborSource};
use atlas_core::types::{ChunkHit, ChunkKey, DocumentId, DocumentResult};
use atlas_core::{Error, Result};
use atlas_graph::{CoordinateInput, Graph, GraphAssembler};
use atlas_rank::{aggregate, collect_entities, enrich, flatten, graph_keys, lookup_links, EntityLinks};

use crate::params::{in_range, SearchParams};
use crate::response::{
    ChunkResult, ChunkSearchResponse, CombinedResponse, DocumentSearchResponse, KeywordSearchResponse, SearchOutcome,
};

pub struct SearchService<'a> {
    embedder: &'a dyn Embedder,
    neighbors: &'a dyn NeighborSource,
    metadata: &'a dyn MetadataSource,
    linker: Option<&'a dyn EntityLinker>,
    graph: Option<&'a dyn GraphSource>,
    keywords: Option<&'a dyn KeywordSource>,
    limits: SearchLimits,
}

impl<'a> SearchService<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        neighbors: &'a dyn NeighborSource,
        metadata: &'a dyn MetadataSource,
        limits: SearchLimits,
    ) -> Self {
        Self { embedder, neighbors, metadata, linker: None, graph: None, keywords: None, limits }
    }

    pub fn with_linker(mut self, linker: &'a dyn EntityLinker) -> Self {
        self.linker = Some(linker);
        self
    }

    pub fn with_graph_source(mut self, graph: &'a dyn GraphSource) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn with_keyword_source(mut self, keywords: &'a dyn KeywordSource) -> Self {
        self.keywords = Some(keywords);
        self
    }

    /// Ranked documents with metadata, entities when requested.
    #[instrument(skip_all, fields(query = %params.query, top_docs = params.top_docs, top_chunks = params.top_chunks))]
    pub fn search_documents(&self, params: &SearchParams) -> Result<SearchOutcome<DocumentSearchResponse>> {
        params.validate(&self.limits)?;
        let Some(results) = self.ranked_documents(params)? else {
            return Ok(SearchOutcome::NoMatches { query: params.query.clone() });
        };
        info!(documents = results.len(), "document search finished");
        Ok(SearchOutcome::Ranked(DocumentSearchResponse { query: params.query.clone(), top_docs: params.top_docs, results }))
    }

    /// Flat score-ordered hits, plus the graph around them when
    /// `params.with_graph` is set. Graph problems other than a structural
    /// failure leave the hits intact with an empty graph.
    #[instrument(skip_all, fields(query = %params.query, with_graph = params.with_graph))]
    pub fn search_with_graph(&self, params: &SearchParams) -> Result<SearchOutcome<CombinedResponse>> {
        params.validate(&self.limits)?;
        let Some(docs) = self.ranked_documents(params)? else {
            return Ok(SearchOutcome::NoMatches { query: params.query.clone() });
        };
        let hits = flatten(&docs, params.flatten_limit(&self.limits));
        let graph = if params.with_graph {
            self.degrading_graph(&graph_keys(&hits), params.max_entities_per_chunk)?
        } else {
            Graph::default()
        };
        info!(hits = hits.len(), nodes = graph.nodes.len(), edges = graph.edges.len(), "combined search finished");
        Ok(SearchOutcome::Ranked(CombinedResponse { hits, graph }))
    }

    /// Nearest passages as a flat list, without document aggregation.
    #[instrument(skip(self))]
    pub fn search_chunks(&self, query: &str, top_k: usize, include_entities: bool) -> Result<SearchOutcome<ChunkSearchResponse>> {
        if query.trim().is_empty() {
            return Err(Error::invalid("query", "must not be empty"));
        }
        in_range("top_k", top_k, 1, self.limits.max_chunk_pool)?;
        let hits = self.nearest(query, top_k)?;
        if hits.is_empty() {
            return Ok(SearchOutcome::NoMatches { query: query.to_string() });
        }
        let links = if include_entities { Some(self.links_for_hits(&hits)) } else { None };
        let results = hits
            .into_iter()
            .map(|h| {
                let entities = links.as_ref().map(|l| collect_entities(slice::from_ref(&h), l));
                ChunkResult { chunk_id: h.chunk_id, document_id: h.document_id, text: h.text, distance: h.distance, entities }
            })
            .collect();
        Ok(SearchOutcome::Ranked(ChunkSearchResponse { query: query.to_string(), top_k, results }))
    }

    /// BM25 passage matches from the keyword index. Unlike the other paths
    /// there is no degraded form: without an index the call fails.
    #[instrument(skip(self))]
    pub fn search_keywords(&self, query: &str, k: usize) -> Result<SearchOutcome<KeywordSearchResponse>> {
        if query.trim().is_empty() {
            return Err(Error::invalid("query", "must not be empty"));
        }
        in_range("k", k, 1, self.limits.max_chunk_pool)?;
        let source = self.keywords.ok_or_else(|| Error::unavailable("keyword index", "not configured"))?;
        let results = source.keyword_search(query, k)?;
        if results.is_empty() {
            return Ok(SearchOutcome::NoMatches { query: query.to_string() });
        }
        info!(hits = results.len(), "keyword search finished");
        Ok(SearchOutcome::Ranked(KeywordSearchResponse { query: query.to_string(), k, results }))
    }

    /// Graph around client-supplied coordinates. Invalid coordinates are
    /// skipped; an unreachable graph store yields an empty graph.
    #[instrument(skip(self, inputs), fields(inputs = inputs.len()))]
    pub fn graph_for(&self, inputs: &[CoordinateInput], max_entities_per_chunk: usize) -> Result<Graph> {
        in_range("max_entities_per_chunk", max_entities_per_chunk, 0, self.limits.max_entities_per_chunk)?;
        let keys = atlas_graph::validate_keys(inputs);
        self.degrading_graph(&keys, max_entities_per_chunk)
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let mut vecs = self
            .embedder
            .embed_batch(&[query.to_string()])
            .map_err(|e| Error::unavailable("embedder", e))?;
        vecs.pop().ok_or_else(|| Error::unavailable("embedder", "returned no vector"))
    }

    fn nearest(&self, query: &str, pool: usize) -> Result<Vec<ChunkHit>> {
        let q = self.embed_query(query)?;
        let hits = self.neighbors.nearest(&q, pool)?;
        debug!(pool, hits = hits.len(), "nearest passages");
        Ok(hits)
    }

    /// `None` when the store had no passages for the query.
    fn ranked_documents(&self, params: &SearchParams) -> Result<Option<Vec<DocumentResult>>> {
        let hits = self.nearest(&params.query, params.effective_pool())?;
        if hits.is_empty() {
            info!("no passages matched");
            return Ok(None);
        }
        let docs = aggregate(hits, params.top_chunks, params.top_docs)?;
        let ids: Vec<DocumentId> = docs.iter().map(|d| d.document_id.clone()).collect();
        let metadata = self.metadata.documents(&ids)?;
        let links = match (params.include_entities, self.linker) {
            (true, Some(linker)) => lookup_links(linker, &docs),
            (true, None) => {
                debug!("entities requested but no linker configured");
                None
            }
            (false, _) => None,
        };
        Ok(Some(enrich(docs, &metadata, links.as_ref())))
    }

    fn links_for_hits(&self, hits: &[ChunkHit]) -> EntityLinks {
        let Some(linker) = self.linker else { return HashMap::new() };
        let ids: Vec<_> = hits.iter().map(|h| h.chunk_id.clone()).collect();
        linker.entities_for(&ids).unwrap_or_else(|e| {
            warn!(error = %e, "entity linkage failed, returning passages without entities");
            HashMap::new()
        })
    }

    fn degrading_graph(&self, keys: &[ChunkKey], max_entities_per_chunk: usize) -> Result<Graph> {
        let Some(source) = self.graph else {
            debug!("no graph store configured, returning empty graph");
            return Ok(Graph::default());
        };
        match GraphAssembler::new(source, max_entities_per_chunk).assemble_keys(keys) {
            Ok(g) => Ok(g),
            Err(Error::CollaboratorUnavailable { collaborator, reason }) => {
                warn!(collaborator, %reason, "graph store unavailable, returning empty graph");
                Ok(Graph::default())
            }
            Err(e) => Err(e),
        }
    }
}
