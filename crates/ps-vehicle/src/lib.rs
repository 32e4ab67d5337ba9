//! `ps-vehicle` — vehicle movement state machine, wire format and seeding.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                          |
//! |-------------|-------------------------------------------------------------------|
//! | [`state`]   | `VehicleState`, `Handoff` — what a step or a drive ended in       |
//! | [`vehicle`] | `Vehicle`, `VehicleSpec` — path, speed, delta, and `step()`       |
//! | [`message`] | `VehicleMessage` — the serialisable wire form                     |
//! | [`seed`]    | `seed_vehicle`, `seed_fleet` — random origin/destination + path   |
//! | [`error`]   | `VehicleError`, `VehicleResult<T>`                                |
//!
//! # Movement model (edge-at-a-time)
//!
//! A vehicle sits on the edge `prev_id → next_id` of a precomputed path.  One
//! [`Vehicle::step`] against the driving partition's graph:
//!
//! 1. adds the edge length to the carried `delta`,
//! 2. consumes whole multiples of `speed`, keeping the remainder as the new
//!    `delta`,
//! 3. resolves the successor of `next_id` in the path (last occurrence) and
//!    either parks (end of path), stops at a boundary (successor outside the
//!    local graph), or slides forward onto the next edge.
//!
//! No randomness is involved: identical inputs produce identical outputs.

pub mod error;
pub mod message;
pub mod seed;
pub mod state;
pub mod vehicle;

#[cfg(test)]
mod tests;

pub use error::{VehicleError, VehicleResult};
pub use message::VehicleMessage;
pub use seed::{seed_fleet, seed_vehicle};
pub use state::{Handoff, VehicleState};
pub use vehicle::{Vehicle, VehicleSpec};
