use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use atlas_core::config::{expand_path, Config, Settings};
use atlas_core::data_processor::DataProcessor;
use atlas_embed::get_default_embedder;
use atlas_graph::{CoordinateInput, MemoryGraphStore};
use atlas_search::{SearchParams, SearchService};
use atlas_text::KeywordIndex;
use atlas_vector::{ingest_documents, IngestReport, LanceChunkStore};

#[derive(Parser)]
#[command(name = "atlas")]
#[command(about = "Ranked document retrieval with entity and graph context", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk, embed and index every .txt file under a directory
    Ingest {
        /// Source directory (defaults to data.raw_txt_dir)
        dir: Option<PathBuf>,
    },

    /// Search the indexed corpus
    Search(SearchArgs),

    /// Build the graph around chunk coordinates (content_hash:ordinal)
    Graph {
        #[arg(required = true)]
        coords: Vec<String>,
        #[arg(long = "max-entities")]
        max_entities: Option<usize>,
    },
}

#[derive(Args)]
struct SearchArgs {
    query: String,
    #[arg(long)]
    top_docs: Option<usize>,
    #[arg(long)]
    top_chunks: Option<usize>,
    #[arg(long)]
    chunk_pool: Option<usize>,
    #[arg(long = "max-entities")]
    max_entities: Option<usize>,
    /// Attach linked entities to each chunk
    #[arg(long)]
    entities: bool,
    /// Also return the flattened hits and their graph
    #[arg(long)]
    graph: bool,
    /// Return the K nearest passages instead of documents
    #[arg(long, value_name = "K", conflicts_with_all = ["graph", "keyword"])]
    chunks: Option<usize>,
    /// Return the K best BM25 passages from the keyword index
    #[arg(long, value_name = "K", conflicts_with = "graph")]
    keyword: Option<usize>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(settings: &Settings) -> Result<LanceChunkStore> {
    let dir = expand_path(&settings.data.lancedb_dir);
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    LanceChunkStore::open(&dir.to_string_lossy(), &settings.data.table, settings.embedding.dimension)
}

fn open_keywords(settings: &Settings) -> Result<KeywordIndex> {
    KeywordIndex::open(&expand_path(&settings.data.tantivy_dir))
}

fn open_graph(settings: &Settings) -> Result<Option<MemoryGraphStore>> {
    match &settings.data.graph_snapshot {
        Some(path) => Ok(Some(MemoryGraphStore::load(&expand_path(path))?)),
        None => Ok(None),
    }
}

#[derive(Serialize)]
struct IngestSummary {
    #[serde(flatten)]
    vectors: IngestReport,
    passages_indexed: usize,
}

fn ingest(settings: &Settings, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(|| expand_path(&settings.data.raw_txt_dir));
    tracing::info!(dir = %dir.display(), "ingesting");
    let docs = DataProcessor::new().process_directory(&dir)?;
    let store = open_store(settings)?;
    let embedder = get_default_embedder(settings.embedding.dimension)?;
    let report = ingest_documents(&store, embedder.as_ref(), &docs)?;
    let passages_indexed = open_keywords(settings)?.index_documents(&docs)?;
    print_json(&IngestSummary { vectors: report, passages_indexed })
}

fn search(settings: &Settings, args: SearchArgs) -> Result<()> {
    let mut params = SearchParams::with_defaults(args.query, &settings.search);
    if let Some(n) = args.top_docs { params.top_docs = n; }
    if let Some(n) = args.top_chunks { params.top_chunks = n; }
    if let Some(n) = args.chunk_pool { params.chunk_pool = n; }
    if let Some(n) = args.max_entities { params.max_entities_per_chunk = n; }
    params.include_entities = args.entities;
    params.with_graph = args.graph;

    let store = open_store(settings)?;
    let embedder = get_default_embedder(settings.embedding.dimension)?;
    let service = SearchService::new(embedder.as_ref(), &store, &store, settings.search.clone());

    if let Some(k) = args.keyword {
        let index = open_keywords(settings)?;
        return print_json(&service.with_keyword_source(&index).search_keywords(&params.query, k)?);
    }

    let graph_store = open_graph(settings)?;
    let service = match &graph_store {
        Some(g) => service.with_linker(g).with_graph_source(g),
        None => service,
    };
    if let Some(k) = args.chunks {
        return print_json(&service.search_chunks(&params.query, k, params.include_entities)?);
    }
    if params.with_graph {
        print_json(&service.search_with_graph(&params)?)
    } else {
        print_json(&service.search_documents(&params)?)
    }
}

fn parse_coordinate(coord: &str) -> CoordinateInput {
    match coord.rsplit_once(':') {
        Some((hash, ordinal)) => CoordinateInput::new(hash, ordinal),
        None => CoordinateInput { content_hash: Some(coord.to_string()), ordinal: None },
    }
}

fn graph(settings: &Settings, coords: &[String], max_entities: Option<usize>) -> Result<()> {
    let max_entities = max_entities.unwrap_or(settings.search.default_max_entities_per_chunk);
    let inputs: Vec<CoordinateInput> = coords.iter().map(|c| parse_coordinate(c)).collect();
    let store = open_store(settings)?;
    let graph = open_graph(settings)?.ok_or_else(|| anyhow!("data.graph_snapshot is not configured"))?;
    let embedder = get_default_embedder(settings.embedding.dimension)?;
    let service = SearchService::new(embedder.as_ref(), &store, &store, settings.search.clone()).with_graph_source(&graph);
    print_json(&service.graph_for(&inputs, max_entities)?)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    match cli.command {
        Commands::Ingest { dir } => ingest(&settings, dir),
        Commands::Search(args) => search(&settings, args),
        Commands::Graph { coords, max_entities } => graph(&settings, &coords, max_entities),
    }
}
