//! `ps-graph` — street graph, spatial partitioning, and routing.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`graph`]     | `Vertex`, `Edge`, `Graph` (CSR over dense indices)         |
//! | [`partition`] | `PartitionPlan`, `PartitionConfig`, `Partition`            |
//! | [`router`]    | `Router` trait, `DijkstraRouter`                           |
//! | [`loader`]    | `GraphDocument` — JSON graph description                   |
//! | [`error`]     | `GraphError`, `GraphResult<T>`                             |
//!
//! # Build order
//!
//! ```text
//! GraphDocument ─► PartitionPlan (bounding box, strips) ─► filter(strip)
//!               └────────────────────────────────────────► Graph::new ─► Partition
//! ```
//!
//! Filtering happens before graph construction so a leaf graph never holds an
//! edge with an endpoint outside its strip.

pub mod error;
pub mod graph;
pub mod loader;
pub mod partition;
pub mod router;


pub use error::{GraphError, GraphResult};
pub use graph::{Edge, Graph, Vertex};
pub use loader::GraphDocument;
pub use partition::{build_all, build_partition, Partition, PartitionConfig, PartitionPlan, Selection};
pub use router::{DijkstraRouter, Router};
