//! Movement states and drive outcomes.

/// Where a vehicle stands after a [`step`][crate::Vehicle::step].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VehicleState {
    /// Still on a local edge; the next step continues locally.
    Traveling,

    /// The next hop lies outside the driving partition.  The vehicle is
    /// marked for deletion locally and must be migrated through the root.
    AtBoundary,

    /// End of path reached.  Terminal.
    Parked,
}

impl VehicleState {
    pub fn as_str(self) -> &'static str {
        match self {
            VehicleState::Traveling  => "traveling",
            VehicleState::AtBoundary => "at-boundary",
            VehicleState::Parked     => "parked",
        }
    }
}

impl std::fmt::Display for VehicleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a leaf-side drive ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Handoff {
    /// Report completion to the root.
    Parked,
    /// Forward the full vehicle state to the root for re-routing.
    Boundary,
}
