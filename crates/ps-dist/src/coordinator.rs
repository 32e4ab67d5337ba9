//! Role selection.
//!
//! Every rank runs exactly one coordinator for its whole lifetime: rank 0
//! the [`RootCoordinator`], every other rank the [`LeafCoordinator`] for the
//! strip with the same number.  The role is chosen once, here.

use ps_core::{Rank, SimConfig};
use ps_graph::Partition;

use crate::{DistError, DistResult, LeafCoordinator, LeafReport, RootCoordinator, RootReport, Transport};

/// Result of running one role.
#[derive(Clone, Debug, PartialEq)]
pub enum RoleReport {
    Root(RootReport),
    Leaf(LeafReport),
}

pub trait Coordinator: Send {
    fn rank(&self) -> Rank;

    /// Run the role's protocol to termination.
    fn run(self: Box<Self>) -> DistResult<RoleReport>;
}

impl<T: Transport> Coordinator for RootCoordinator<T> {
    fn rank(&self) -> Rank {
        self.transport().rank()
    }

    fn run(self: Box<Self>) -> DistResult<RoleReport> {
        RootCoordinator::run(*self).map(RoleReport::Root)
    }
}

impl<T: Transport + 'static> Coordinator for LeafCoordinator<T> {
    fn rank(&self) -> Rank {
        self.transport().rank()
    }

    fn run(self: Box<Self>) -> DistResult<RoleReport> {
        LeafCoordinator::run(*self).map(RoleReport::Leaf)
    }
}

/// Build the coordinator for `transport`'s rank.
///
/// The root seeds its fleet here, so any seeding failure surfaces before a
/// single message is sent.
pub fn coordinator_for<T: Transport + 'static>(
    transport: T,
    root:      &Partition,
    leaves:    &[Partition],
    config:    &SimConfig,
) -> DistResult<Box<dyn Coordinator>> {
    let rank = transport.rank();
    if rank.is_root() {
        return Ok(Box::new(RootCoordinator::new(transport, root, leaves, config)?));
    }
    let leaf = rank
        .index()
        .checked_sub(1)
        .and_then(|i| leaves.get(i))
        .ok_or(DistError::NoSuchRank { rank, size: leaves.len() + 1 })?;
    Ok(Box::new(LeafCoordinator::new(transport, leaf.clone(), config.num_threads)?))
}
