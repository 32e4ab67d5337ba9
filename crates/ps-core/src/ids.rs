//! Strongly typed identifier wrappers.
//!
//! Integer IDs are `Copy + Ord + Hash` so they can be used as map keys and
//! sorted collection elements without ceremony.  Vertex IDs come from the
//! graph description and are sparse, so unlike dense storage indices they are
//! never used to index a `Vec` directly.

use std::fmt;

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> $name {
                $name(raw)
            }
        }
    };
}

typed_id! {
    /// Identifier of a street-graph vertex, as given by the graph description.
    pub struct VertexId(i64);
}

typed_id! {
    /// Identifier of a graph partition.  `PartitionId::ROOT` is the full graph;
    /// leaves are numbered from 1 upwards.
    pub struct PartitionId(u32);
}

typed_id! {
    /// Position of a process (or in-process worker) in the transport world.
    pub struct Rank(u32);
}

impl PartitionId {
    /// The root partition, holding the complete unfiltered graph.
    pub const ROOT: PartitionId = PartitionId(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    /// Partition ID of the leaf built from strip `index` (strips are 0-based,
    /// leaf IDs start at 1).
    #[inline]
    pub fn leaf(index: usize) -> PartitionId {
        PartitionId(index as u32 + 1)
    }

    /// The strip index this leaf was built from.  `None` for the root.
    #[inline]
    pub fn strip_index(self) -> Option<usize> {
        self.0.checked_sub(1).map(|i| i as usize)
    }
}

impl Rank {
    /// Rank 0 always plays the root role.
    pub const ROOT: Rank = Rank(0);

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Leaf partitions are bound 1:1 to worker ranks.
impl From<PartitionId> for Rank {
    #[inline]
    fn from(id: PartitionId) -> Rank {
        Rank(id.0)
    }
}

impl From<Rank> for PartitionId {
    #[inline]
    fn from(rank: Rank) -> PartitionId {
        PartitionId(rank.0)
    }
}

// ── VehicleId ─────────────────────────────────────────────────────────────────

/// Globally unique vehicle identifier: a short alphanumeric string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VehicleId(pub String);

impl VehicleId {
    /// Length of generated identifiers.
    pub const LEN: usize = 10;

    /// Draw a fresh `[A-Za-z0-9]{10}` identifier from `rng`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id: String = rng
            .sample_iter(&Alphanumeric)
            .take(Self::LEN)
            .map(char::from)
            .collect();
        VehicleId(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
