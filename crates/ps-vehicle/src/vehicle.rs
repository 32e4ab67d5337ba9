//! The `Vehicle` state machine.

use ps_core::{SimRng, VehicleId, VertexId};
use ps_graph::Graph;
use tracing::trace;

use crate::{Handoff, VehicleError, VehicleResult, VehicleState};

/// Construction parameters for a [`Vehicle`].
///
/// Validated once by [`Vehicle::new`]; a vehicle that exists is always
/// well-formed.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSpec {
    /// Ordered vertex sequence, origin first.  At least two entries.
    pub path:    Vec<VertexId>,
    /// Distance consumed per step.  Finite and `> 0`.
    pub speed:   f64,
    /// Unspent distance carried into the first edge.  Finite and `>= 0`.
    pub delta:   f64,
    /// Start vertex of the current edge; must appear in `path`.
    pub prev_id: VertexId,
}

/// A simulated vehicle travelling a precomputed path one edge at a time.
///
/// The vehicle never holds a graph reference; the driving partition passes
/// its local graph into every call, which is what "binding" a migrated
/// vehicle amounts to.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    id:                  VehicleId,
    path:                Vec<VertexId>,
    speed:               f64,
    delta:               f64,
    prev_id:             VertexId,
    next_id:             VertexId,
    is_parked:           bool,
    marked_for_deletion: bool,
    distance_remaining:  f64,
}

impl Vehicle {
    /// Validate `spec` and build a vehicle with a fresh id drawn from `rng`.
    pub fn new(spec: VehicleSpec, rng: &mut SimRng) -> VehicleResult<Vehicle> {
        Self::with_id(rng.vehicle_id(), spec)
    }

    /// Validate `spec` and build a vehicle with a caller-chosen id.
    ///
    /// `next_id` is the successor of the first occurrence of `prev_id` in the
    /// path.  If `prev_id` is the final vertex the vehicle starts parked.
    pub fn with_id(id: VehicleId, spec: VehicleSpec) -> VehicleResult<Vehicle> {
        check_motion(spec.speed, spec.delta)?;
        check_path(&spec.path)?;
        let at = spec
            .path
            .iter()
            .position(|&v| v == spec.prev_id)
            .ok_or_else(|| VehicleError::Invalid(format!("{} is not on the path", spec.prev_id)))?;
        let (next_id, is_parked) = match spec.path.get(at + 1) {
            Some(&next) => (next, false),
            None        => (spec.prev_id, true),
        };
        Ok(Vehicle {
            id,
            path: spec.path,
            speed: spec.speed,
            delta: spec.delta,
            prev_id: spec.prev_id,
            next_id,
            is_parked,
            marked_for_deletion: false,
            distance_remaining: 0.0,
        })
    }

    /// Reassemble a vehicle from wire fields.  `marked_for_deletion` always
    /// starts cleared.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        id:                 VehicleId,
        path:               Vec<VertexId>,
        speed:              f64,
        delta:              f64,
        prev_id:            VertexId,
        next_id:            VertexId,
        is_parked:          bool,
        distance_remaining: f64,
    ) -> VehicleResult<Vehicle> {
        check_motion(speed, delta)?;
        check_path(&path)?;
        for v in [prev_id, next_id] {
            if !path.contains(&v) {
                return Err(VehicleError::Invalid(format!("{v} is not on the path")));
            }
        }
        if !(distance_remaining.is_finite() && distance_remaining >= 0.0) {
            return Err(VehicleError::Invalid(format!(
                "distance_remaining must be finite and >= 0, got {distance_remaining}"
            )));
        }
        Ok(Vehicle {
            id,
            path,
            speed,
            delta,
            prev_id,
            next_id,
            is_parked,
            marked_for_deletion: false,
            distance_remaining,
        })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    pub fn path(&self) -> &[VertexId] {
        &self.path
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn prev_id(&self) -> VertexId {
        self.prev_id
    }

    pub fn next_id(&self) -> VertexId {
        self.next_id
    }

    pub fn is_parked(&self) -> bool {
        self.is_parked
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    pub fn distance_remaining(&self) -> f64 {
        self.distance_remaining
    }

    /// The current edge `(prev_id, next_id)`.
    pub fn edge(&self) -> (VertexId, VertexId) {
        (self.prev_id, self.next_id)
    }

    pub fn state(&self) -> VehicleState {
        if self.is_parked {
            VehicleState::Parked
        } else if self.marked_for_deletion {
            VehicleState::AtBoundary
        } else {
            VehicleState::Traveling
        }
    }

    // ── Movement ──────────────────────────────────────────────────────────

    /// Advance across the current edge of `graph`.
    ///
    /// A parked vehicle, or one already waiting at a boundary, is left
    /// untouched.
    ///
    /// # Errors
    ///
    /// [`VehicleError::OffGraph`] if `(prev_id, next_id)` is not an edge of
    /// `graph`.  That means the vehicle is being driven by a partition that
    /// does not own its position, which is a migration bug.
    pub fn step(&mut self, graph: &Graph) -> VehicleResult<VehicleState> {
        if self.is_parked || self.marked_for_deletion {
            return Ok(self.state());
        }
        let length = graph
            .edge(self.prev_id, self.next_id)
            .map_err(|source| VehicleError::OffGraph { vehicle: self.id.clone(), source })?
            .length;
        Ok(self.advance(length, graph))
    }

    /// Advance across the current edge using an externally supplied `length`.
    ///
    /// Used by a partition that has just received this vehicle and obtained
    /// the length of `(prev_id, next_id)` from the full graph, since the edge
    /// may not exist locally.  Clears `marked_for_deletion` first.
    pub fn absorb(&mut self, length: f64, graph: &Graph) -> VehicleResult<VehicleState> {
        if !(length.is_finite() && length > 0.0) {
            return Err(VehicleError::Invalid(format!(
                "edge length must be finite and > 0, got {length}"
            )));
        }
        self.marked_for_deletion = false;
        if self.is_parked {
            return Ok(VehicleState::Parked);
        }
        Ok(self.advance(length, graph))
    }

    /// Step until parked.  Single-graph mode only.
    ///
    /// Returns the number of steps taken.  Reaching a boundary is an error,
    /// since with one graph every path vertex should be local.
    pub fn drive(&mut self, graph: &Graph) -> VehicleResult<usize> {
        let mut steps = 0;
        loop {
            if self.is_parked {
                return Ok(steps);
            }
            match self.step(graph)? {
                VehicleState::Traveling  => steps += 1,
                VehicleState::Parked     => return Ok(steps + 1),
                VehicleState::AtBoundary => {
                    return Err(VehicleError::UnexpectedBoundary {
                        vehicle: self.id.clone(),
                        next:    self.next_id,
                    });
                }
            }
        }
    }

    /// Step until the vehicle parks or must leave `graph`.
    pub fn drive_until_handoff(&mut self, graph: &Graph) -> VehicleResult<Handoff> {
        loop {
            match self.state() {
                VehicleState::Parked     => return Ok(Handoff::Parked),
                VehicleState::AtBoundary => return Ok(Handoff::Boundary),
                VehicleState::Traveling  => {
                    self.step(graph)?;
                }
            }
        }
    }

    /// Consume `length` plus the carried delta in whole multiples of `speed`,
    /// then resolve the next hop.
    fn advance(&mut self, length: f64, graph: &Graph) -> VehicleState {
        self.distance_remaining = length + self.delta;
        self.delta = self.distance_remaining % self.speed;
        self.distance_remaining = 0.0;

        let state = match self.successor(self.next_id) {
            None => {
                self.is_parked = true;
                VehicleState::Parked
            }
            Some(hop) => {
                self.prev_id = self.next_id;
                self.next_id = hop;
                if graph.vertex_exists(hop) {
                    VehicleState::Traveling
                } else {
                    self.marked_for_deletion = true;
                    VehicleState::AtBoundary
                }
            }
        };
        trace!(
            vehicle = %self.id,
            prev = self.prev_id.0,
            next = self.next_id.0,
            delta = self.delta,
            %state,
            "step"
        );
        state
    }

    /// The vertex after the last occurrence of `v` in the path.
    fn successor(&self, v: VertexId) -> Option<VertexId> {
        self.path
            .iter()
            .rposition(|&p| p == v)
            .and_then(|i| self.path.get(i + 1))
            .copied()
    }
}

fn check_motion(speed: f64, delta: f64) -> VehicleResult<()> {
    if !(speed.is_finite() && speed > 0.0) {
        return Err(VehicleError::Invalid(format!("speed must be finite and > 0, got {speed}")));
    }
    if !(delta.is_finite() && delta >= 0.0) {
        return Err(VehicleError::Invalid(format!("delta must be finite and >= 0, got {delta}")));
    }
    Ok(())
}

fn check_path(path: &[VertexId]) -> VehicleResult<()> {
    if path.len() < 2 {
        return Err(VehicleError::Invalid(format!(
            "path needs at least two vertices, got {}",
            path.len()
        )));
    }
    Ok(())
}
