//! `ps-core` — foundational types for the `pstreets` partitioned simulator.
//!
//! This crate is a dependency of every other `ps-*` crate.  It has no `ps-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `VertexId`, `PartitionId`, `Rank`, `VehicleId`        |
//! | [`geo`]         | planar `Point` and axis-aligned `Rect`                |
//! | [`rng`]         | `SimRng` (seeded, per process)                        |
//! | [`config`]      | `SimConfig`, `ExecutionMode`                          |
//! | [`error`]       | `CoreError`, `CoreResult`                             |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{ExecutionMode, SimConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{Point, Rect};
pub use ids::{PartitionId, Rank, VehicleId, VertexId};
pub use rng::SimRng;
