//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_SEARCH__MAX_TOP_DOCS=20`). Every
//! section falls back to its `Default` when the key is absent.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self::from_figment(figment);
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    /// Typed view of all sections, defaults filled in.
    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract::<Settings>()
            .map_err(|e| Error::Config(e.to_string()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub search: SearchLimits,
    pub embedding: EmbeddingSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        if self.embedding.dimension == 0 {
            return Err(Error::Config("embedding.dimension must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub lancedb_dir: String,
    /// Tantivy keyword index over passage text.
    pub tantivy_dir: String,
    pub table: String,
    /// JSON snapshot of the entity graph, optional.
    pub graph_snapshot: Option<String>,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            raw_txt_dir: "data/raw/txt".to_string(),
            lancedb_dir: "data/indexes/lancedb".to_string(),
            tantivy_dir: "data/indexes/tantivy".to_string(),
            table: "chunks".to_string(),
            graph_snapshot: None,
        }
    }
}

/// Defaults and inclusive bounds for request knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub default_top_docs: usize,
    pub max_top_docs: usize,
    pub default_top_chunks: usize,
    pub max_top_chunks: usize,
    pub default_chunk_pool: usize,
    pub min_chunk_pool: usize,
    pub max_chunk_pool: usize,
    pub default_max_entities_per_chunk: usize,
    pub max_entities_per_chunk: usize,
    /// Flattened hit list length = `top_docs * flatten_multiplier`.
    pub flatten_multiplier: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_top_docs: 5,
            max_top_docs: 50,
            default_top_chunks: 3,
            max_top_chunks: 20,
            default_chunk_pool: 200,
            min_chunk_pool: 10,
            max_chunk_pool: 2000,
            default_max_entities_per_chunk: 5,
            max_entities_per_chunk: 10,
            flatten_multiplier: 3,
        }
    }
}

impl SearchLimits {
    pub fn validate(&self) -> Result<()> {
        let check = |name: &str, min: usize, default: usize, max: usize| {
            if min > default || default > max {
                Err(Error::Config(format!("search.{name}: expected {min} <= default {default} <= {max}")))
            } else {
                Ok(())
            }
        };
        check("top_docs", 1, self.default_top_docs, self.max_top_docs)?;
        check("top_chunks", 1, self.default_top_chunks, self.max_top_chunks)?;
        check("chunk_pool", self.min_chunk_pool, self.default_chunk_pool, self.max_chunk_pool)?;
        check("max_entities_per_chunk", 0, self.default_max_entities_per_chunk, self.max_entities_per_chunk)?;
        if self.flatten_multiplier == 0 {
            return Err(Error::Config("search.flatten_multiplier must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub dimension: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self { Self { dimension: 384 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
