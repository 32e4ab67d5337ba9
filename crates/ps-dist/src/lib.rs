//! `ps-dist` — the root/leaf coordination protocol of the pstreets simulator.
//!
//! # Roles
//!
//! ```text
//!            ┌──────────── rank 0: root (full graph) ────────────┐
//!            │ seed fleet · edge-length oracle · re-router ·     │
//!            │ termination aggregator                            │
//!            └───▲──────────────┬─────────────▲──────────────┬───┘
//!   VehicleOut,  │    VehicleIn,│             │              │
//!   EdgeRequest, │  EdgeResponse│             │              │
//!   DoneReport   │ DoneBroadcast▼             │              ▼
//!            ┌───┴─────────────────┐   ┌──────┴──────────────────┐
//!            │ rank 1: leaf strip 0 │   │ rank 2: leaf strip 1    │ …
//!            └──────────────────────┘   └─────────────────────────┘
//! ```
//!
//! A vehicle is owned by exactly one rank at a time.  It moves from leaf to
//! leaf only through the root: the leaf forwards it (`VehicleOut`) and the
//! root sends it on to the owner of its next vertex (`VehicleIn`).
//!
//! # Crate layout
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`transport`]   | `Transport`, `Tag`, `Envelope`, in-process `LocalWorld` |
//! | [`protocol`]    | edge-length messages, `Completion`, payload codecs    |
//! | [`routing`]     | `RoutingTable` (vertex → owning leaf rank)            |
//! | [`termination`] | `TerminationAggregator`, `Tally`                      |
//! | [`root`]        | `RootCoordinator`                                     |
//! | [`leaf`]        | `LeafCoordinator`                                     |
//! | [`coordinator`] | `Coordinator` trait, `coordinator_for`                |
//! | [`report`]      | `RunReport`, `RootReport`, `LeafReport`               |
//! | [`run`]         | `run`, `run_local`, `run_distributed`                 |

pub mod coordinator;
pub mod error;
pub mod leaf;
pub mod protocol;
pub mod report;
pub mod root;
pub mod routing;
pub mod run;
pub mod termination;
pub mod transport;

#[cfg(test)]
mod tests;

pub use coordinator::{coordinator_for, Coordinator, RoleReport};
pub use error::{DistError, DistResult};
pub use leaf::LeafCoordinator;
pub use protocol::{Completion, EdgeLengthRequest, EdgeLengthResponse};
pub use report::{LeafReport, RootReport, RunReport};
pub use root::RootCoordinator;
pub use routing::RoutingTable;
pub use run::{run, run_distributed, run_local};
pub use termination::{Tally, TerminationAggregator};
pub use transport::{ChannelTransport, Envelope, LocalWorld, Tag, Transport};
