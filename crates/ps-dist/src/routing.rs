//! Vertex → owning leaf lookup used by the root.

use rustc_hash::FxHashMap;

use ps_core::{Rank, VertexId};
use ps_graph::{Graph, Partition};

/// Maps every vertex referenced by the full graph's edges to the rank of the
/// leaf whose strip contains it.  Read-only once built.
#[derive(Clone, Debug, Default)]
pub struct RoutingTable {
    owner: FxHashMap<VertexId, Rank>,
}

impl RoutingTable {
    /// Intersect `root`'s referenced vertices with each leaf's membership.
    ///
    /// Strips are disjoint, so each vertex has at most one owner.  Root
    /// partitions in `leaves` are skipped.
    pub fn build(root: &Graph, leaves: &[Partition]) -> RoutingTable {
        let mut owner =
            FxHashMap::with_capacity_and_hasher(root.vertices().len(), Default::default());
        for &v in root.vertices() {
            let found = leaves
                .iter()
                .filter(|p| !p.is_root())
                .find(|p| p.graph().vertex_exists(v));
            if let Some(leaf) = found {
                owner.insert(v, Rank::from(leaf.id()));
            }
        }
        RoutingTable { owner }
    }

    #[inline]
    pub fn owner(&self, v: VertexId) -> Option<Rank> {
        self.owner.get(&v).copied()
    }

    pub fn len(&self) -> usize {
        self.owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_empty()
    }
}
