use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Document,
    Chunk,
    Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeAttributes {
    Document { content_hash: String, full_title: String, source_url: Option<String> },
    Chunk { ordinal: u32, preview: String, content_hash: String },
    Entity {
        #[serde(rename = "type")]
        kind: String,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    pub attributes: NodeAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Relation {
    #[serde(rename = "HAS_CHUNK")]
    HasChunk,
    #[serde(rename = "MENTIONS")]
    Mentions,
}

impl Relation {
    pub fn as_str(self) -> &'static str {
        match self {
            Relation::HasChunk => "HAS_CHUNK",
            Relation::Mentions => "MENTIONS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: Relation,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Graph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Graph {
    pub fn is_empty(&self) -> bool { self.nodes.is_empty() && self.edges.is_empty() }

    pub fn node(&self, id: &str) -> Option<&GraphNode> { self.nodes.iter().find(|n| n.id == id) }

    pub fn count(&self, kind: NodeKind) -> usize { self.nodes.iter().filter(|n| n.kind == kind).count() }
}
