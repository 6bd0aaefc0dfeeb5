//! LanceDB-backed chunk table: nearest-neighbor lookup, document metadata
//! lookup, and the writer used by ingestion.

pub mod ingest;
pub mod schema;
pub mod store;
pub mod table;

pub use ingest::{ingest_documents, IngestReport};
pub use store::LanceChunkStore;
