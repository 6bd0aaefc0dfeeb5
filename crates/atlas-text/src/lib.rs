//! Tantivy BM25 index over passage text.

pub mod index;
pub mod schema;

pub use index::KeywordIndex;
