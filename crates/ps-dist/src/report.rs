//! Run summaries.

use std::fmt;

use ps_core::{ExecutionMode, PartitionId};

/// What the root observed during a distributed run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RootReport {
    pub vehicles:     usize,
    pub parked:       usize,
    pub abandoned:    usize,
    /// Vehicles sent to their first leaf.
    pub emitted:      usize,
    /// Boundary crossings forwarded to a new leaf.
    pub rerouted:     usize,
    pub edge_queries: usize,
}

/// What one leaf observed during a distributed run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LeafReport {
    pub leaf:      PartitionId,
    pub received:  usize,
    pub parked:    usize,
    pub forwarded: usize,
    pub failed:    usize,
}

/// Outcome of a whole run, in any mode.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    pub mode:         ExecutionMode,
    pub vehicles:     usize,
    pub parked:       usize,
    pub abandoned:    usize,
    pub emitted:      usize,
    pub rerouted:     usize,
    pub edge_queries: usize,
    /// Per-leaf detail, in rank order.  Empty for single-graph runs.
    pub leaves:       Vec<LeafReport>,
}

impl RunReport {
    pub fn local(mode: ExecutionMode, vehicles: usize) -> RunReport {
        RunReport {
            mode,
            vehicles,
            parked: 0,
            abandoned: 0,
            emitted: 0,
            rerouted: 0,
            edge_queries: 0,
            leaves: Vec::new(),
        }
    }

    pub fn distributed(root: RootReport, leaves: Vec<LeafReport>) -> RunReport {
        RunReport {
            mode:         ExecutionMode::Distributed,
            vehicles:     root.vehicles,
            parked:       root.parked,
            abandoned:    root.abandoned,
            emitted:      root.emitted,
            rerouted:     root.rerouted,
            edge_queries: root.edge_queries,
            leaves,
        }
    }

    /// Every vehicle either parked or was abandoned.
    pub fn accounted(&self) -> bool {
        self.parked + self.abandoned == self.vehicles
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "mode:      {}", self.mode)?;
        writeln!(f, "vehicles:  {}", self.vehicles)?;
        writeln!(f, "parked:    {}", self.parked)?;
        write!(f, "abandoned: {}", self.abandoned)?;
        if self.mode == ExecutionMode::Distributed {
            writeln!(f)?;
            writeln!(f, "emitted:   {}", self.emitted)?;
            writeln!(f, "rerouted:  {}", self.rerouted)?;
            write!(f, "edge queries: {}", self.edge_queries)?;
            for l in &self.leaves {
                write!(
                    f,
                    "\n  {}: received {} parked {} forwarded {} failed {}",
                    l.leaf, l.received, l.parked, l.forwarded, l.failed
                )?;
            }
        }
        Ok(())
    }
}
