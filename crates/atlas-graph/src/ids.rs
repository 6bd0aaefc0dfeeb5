use crate::model::Relation;

pub fn document_node_id(content_hash: &str) -> String { format!("doc:{content_hash}") }

pub fn chunk_node_id(content_hash: &str, ordinal: u32) -> String { format!("chunk:{content_hash}:{ordinal}") }

pub fn entity_node_id(native_id: &str) -> String { format!("entity:{native_id}") }

pub fn edge_id(source: &str, target: &str, relation: Relation) -> String {
    format!("e:{source}->{target}:{}", relation.as_str())
}
