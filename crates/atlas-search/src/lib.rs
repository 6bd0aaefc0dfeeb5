//! Request orchestration: validated parameters go in, one of the response
//! shapes comes out. Stores and models are borrowed collaborators.

pub mod params;
pub mod response;
pub mod service;

pub use params::SearchParams;
pub use response::{
    ChunkResult, ChunkSearchResponse, CombinedResponse, DocumentSearchResponse, KeywordSearchResponse, SearchOutcome,
};
pub use service::SearchService;
