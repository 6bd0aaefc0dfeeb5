use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

/// One row per passage. Document metadata is denormalized onto every row.
pub fn build_chunk_schema(dim: i32) -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("chunk_id", DataType::Utf8, false),
        Field::new("document_id", DataType::Utf8, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("title", DataType::Utf8, true),
        Field::new("source_url", DataType::Utf8, true),
        Field::new("ordinal", DataType::Int32, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
    ]))
}
