//! Turns a pool of nearest-neighbor passage hits into ranked documents,
//! attaches entities, and flattens documents back into a scored hit list.

pub mod aggregate;
pub mod enrich;
pub mod flatten;

pub use aggregate::{aggregate, group_by_document};
pub use enrich::{collect_entities, enrich, lookup_links, EntityLinks};
pub use flatten::{flatten, graph_keys};
