use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use atlas_core::traits::GraphSource;
use atlas_core::types::{ChunkKey, ChunkNeighborhood};
use atlas_core::{Error, Result};

use crate::ids::{chunk_node_id, document_node_id, edge_id, entity_node_id};
use crate::model::{Graph, GraphEdge, GraphNode, NodeAttributes, NodeKind, Relation};
use crate::preview::{preview, ATTRIBUTE_CHARS, LABEL_CHARS};

pub const UNTITLED: &str = "(untitled)";

/// A passage coordinate as received from a client, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateInput {
    pub content_hash: Option<String>,
    pub ordinal: Option<Value>,
}

impl CoordinateInput {
    pub fn new(content_hash: impl Into<String>, ordinal: impl Into<Value>) -> Self {
        Self { content_hash: Some(content_hash.into()), ordinal: Some(ordinal.into()) }
    }

    /// Requires a non-blank hash and an ordinal that is, or parses as, a
    /// non-negative integer.
    pub fn to_key(&self) -> Result<ChunkKey> {
        let hash = self
            .content_hash
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidCoordinate("missing content_hash".into()))?;
        let ordinal = match &self.ordinal {
            Some(v) => coerce_ordinal(v).ok_or_else(|| Error::InvalidCoordinate(format!("ordinal {v} is not an integer")))?,
            None => return Err(Error::InvalidCoordinate(format!("missing ordinal for {hash}"))),
        };
        Ok(ChunkKey::new(hash, ordinal))
    }
}

fn coerce_ordinal(v: &Value) -> Option<u32> {
    match v {
        Value::Number(n) => match n.as_u64() {
            Some(u) => u32::try_from(u).ok(),
            None => n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX)).map(|f| f as u32),
        },
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Valid, distinct keys in input order. Invalid inputs are logged and skipped.
pub fn validate_keys(inputs: &[CoordinateInput]) -> Vec<ChunkKey> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for (i, input) in inputs.iter().enumerate() {
        match input.to_key() {
            Ok(k) => {
                if seen.insert(k.clone()) { keys.push(k); }
            }
            Err(e) => warn!(index = i, error = %e, "skipping invalid chunk coordinate"),
        }
    }
    keys
}

/// Builds visualization graphs from a traversal collaborator.
pub struct GraphAssembler<'a> {
    source: &'a dyn GraphSource,
    max_entities_per_chunk: usize,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(source: &'a dyn GraphSource, max_entities_per_chunk: usize) -> Self {
        Self { source, max_entities_per_chunk }
    }

    pub fn assemble(&self, inputs: &[CoordinateInput]) -> Result<Graph> {
        let keys = validate_keys(inputs);
        self.assemble_keys(&keys)
    }

    /// Outcomes:
    /// - no keys: empty graph
    /// - a single key failed in the collaborator: empty graph, logged
    /// - collaborator unreachable: `Error::CollaboratorUnavailable`
    /// - any other collaborator fault: `Error::GraphAssembly`
    #[instrument(skip_all, fields(keys = keys.len(), max_entities = self.max_entities_per_chunk))]
    pub fn assemble_keys(&self, keys: &[ChunkKey]) -> Result<Graph> {
        if keys.is_empty() {
            debug!("no valid coordinates, returning empty graph");
            return Ok(Graph::default());
        }
        match self.source.neighborhoods(keys, self.max_entities_per_chunk) {
            Ok(neighborhoods) => Ok(build_graph(&neighborhoods, self.max_entities_per_chunk)),
            Err(Error::KeyFailure { key, reason }) => {
                warn!(%key, %reason, "graph traversal failed for one key, returning empty graph");
                Ok(Graph::default())
            }
            Err(e @ Error::CollaboratorUnavailable { .. }) => Err(e),
            Err(e) => Err(Error::GraphAssembly(e.to_string())),
        }
    }
}

#[derive(Default)]
struct GraphBuilder {
    node_ids: HashSet<String>,
    edge_ids: HashSet<String>,
    graph: Graph,
}

impl GraphBuilder {
    fn add_node(&mut self, node: GraphNode) {
        if self.node_ids.insert(node.id.clone()) { self.graph.nodes.push(node); }
    }

    fn add_edge(&mut self, source: &str, target: &str, label: Relation) {
        let id = edge_id(source, target, label);
        if self.edge_ids.insert(id.clone()) {
            self.graph.edges.push(GraphEdge { id, source: source.to_string(), target: target.to_string(), label });
        }
    }
}

/// Document, chunk and entity nodes with HAS_CHUNK and MENTIONS edges, each
/// id emitted once. At most `max_entities_per_chunk` distinct entities are
/// linked per chunk even if the traversal returned more.
/// A document node's label is its title cut to a bounded preview; `full_title` keeps it whole.
pub fn build_graph(neighborhoods: &[ChunkNeighborhood], max_entities_per_chunk: usize) -> Graph {
    let mut b = GraphBuilder::default();
    for n in neighborhoods {
        let doc_id = document_node_id(&n.document.content_hash);
        let title = n.document.title.as_deref().map(str::trim).filter(|t| !t.is_empty()).unwrap_or(UNTITLED);
        b.add_node(GraphNode {
            id: doc_id.clone(),
            kind: NodeKind::Document,
            label: preview(title, LABEL_CHARS),
            attributes: NodeAttributes::Document {
                content_hash: n.document.content_hash.clone(),
                full_title: title.to_string(),
                source_url: n.document.source_url.clone(),
            },
        });

        let chunk_id = chunk_node_id(&n.chunk.content_hash, n.chunk.ordinal);
        b.add_node(GraphNode {
            id: chunk_id.clone(),
            kind: NodeKind::Chunk,
            label: preview(&n.chunk.text, LABEL_CHARS),
            attributes: NodeAttributes::Chunk {
                ordinal: n.chunk.ordinal,
                preview: preview(&n.chunk.text, ATTRIBUTE_CHARS),
                content_hash: n.chunk.content_hash.clone(),
            },
        });
        b.add_edge(&doc_id, &chunk_id, Relation::HasChunk);

        let mut linked = HashSet::new();
        for e in &n.entities {
            if linked.len() >= max_entities_per_chunk { break; }
            if !linked.insert(e.id.as_str()) { continue; }
            let entity_id = entity_node_id(&e.id);
            b.add_node(GraphNode {
                id: entity_id.clone(),
                kind: NodeKind::Entity,
                label: format!("{} ({})", e.name, e.kind),
                attributes: NodeAttributes::Entity { kind: e.kind.clone(), name: e.name.clone() },
            });
            b.add_edge(&chunk_id, &entity_id, Relation::Mentions);
        }
    }
    debug!(nodes = b.graph.nodes.len(), edges = b.graph.edges.len(), "graph assembled");
    b.graph
}
