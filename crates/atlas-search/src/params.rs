use serde::{Deserialize, Serialize};

use atlas_core::config::SearchLimits;
use atlas_core::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub top_docs: usize,
    pub top_chunks: usize,
    pub chunk_pool: usize,
    pub include_entities: bool,
    pub with_graph: bool,
    pub max_entities_per_chunk: usize,
}

impl SearchParams {
    /// Parameters for `query` with every knob at its configured default.
    pub fn with_defaults(query: impl Into<String>, limits: &SearchLimits) -> Self {
        Self {
            query: query.into(),
            top_docs: limits.default_top_docs,
            top_chunks: limits.default_top_chunks,
            chunk_pool: limits.default_chunk_pool,
            include_entities: false,
            with_graph: false,
            max_entities_per_chunk: limits.default_max_entities_per_chunk,
        }
    }

    pub fn validate(&self, limits: &SearchLimits) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::invalid("query", "must not be empty"));
        }
        in_range("top_docs", self.top_docs, 1, limits.max_top_docs)?;
        in_range("top_chunks", self.top_chunks, 1, limits.max_top_chunks)?;
        in_range("chunk_pool", self.chunk_pool, limits.min_chunk_pool, limits.max_chunk_pool)?;
        in_range("max_entities_per_chunk", self.max_entities_per_chunk, 0, limits.max_entities_per_chunk)?;
        Ok(())
    }

    /// Pool size actually requested from the nearest-neighbor store, large
    /// enough to fill `top_docs` documents of `top_chunks` passages.
    pub fn effective_pool(&self) -> usize {
        self.chunk_pool.max(self.top_docs.saturating_mul(self.top_chunks))
    }

    pub fn flatten_limit(&self, limits: &SearchLimits) -> usize {
        self.top_docs.saturating_mul(limits.flatten_multiplier)
    }
}

pub(crate) fn in_range(name: &'static str, value: usize, min: usize, max: usize) -> Result<()> {
    if value < min || value > max {
        return Err(Error::invalid(name, format!("{value} is outside {min}..={max}")));
    }
    Ok(())
}
