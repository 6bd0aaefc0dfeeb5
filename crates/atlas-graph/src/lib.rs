//! Visualization graph built from passage coordinates.
//!
//! Node and edge ids are pure functions of their natural keys (see [`ids`]),
//! so assembling the same coordinates twice, or merging graphs from several
//! calls, never produces duplicates.

pub mod assemble;
pub mod ids;
pub mod memory;
pub mod model;
pub mod preview;

pub use assemble::{build_graph, validate_keys, CoordinateInput, GraphAssembler};
pub use memory::{GraphSnapshot, MemoryGraphStore};
pub use model::{Graph, GraphEdge, GraphNode, NodeAttributes, NodeKind, Relation};
