//! Embedders available without a model runtime.
//!
//! Production deployments plug a model-backed [`Embedder`] into the search
//! service; everything here is deterministic and dependency-light so that
//! ingestion, search and tests run offline.

use anyhow::{anyhow, Result};
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

pub use atlas_core::traits::Embedder;

/// Hashed bag-of-words embedding, L2-normalized.
///
/// Each lowercase alphanumeric token lands in bucket `hash % dim`. Texts that
/// share vocabulary end up close under cosine and L2 distance.
pub struct HashEmbedder { dim: usize }

impl HashEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 { return Err(anyhow!("embedding dimension must be > 0")); }
        Ok(Self { dim })
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 { for x in &mut v { *x /= norm; } }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Embedder selected from the environment. Only the hashed embedder ships in
/// this workspace; `APP_EMBEDDER` names anything else and fails loudly.
pub fn get_default_embedder(dim: usize) -> Result<Box<dyn Embedder>> {
    let kind = std::env::var("APP_EMBEDDER").unwrap_or_else(|_| "hash".to_string());
    match kind.as_str() {
        "hash" => {
            tracing::debug!(dim, "using hashed bag-of-words embedder");
            Ok(Box::new(HashEmbedder::new(dim)?))
        }
        other => Err(anyhow!("unknown embedder '{}'", other)),
    }
}
