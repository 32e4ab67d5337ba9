use ps_core::{CoreError, Rank, VertexId};
use ps_graph::GraphError;
use ps_vehicle::VehicleError;
use thiserror::Error;

use crate::Tag;

#[derive(Debug, Error)]
pub enum DistError {
    #[error("rank {rank} is outside a world of {size} ranks")]
    NoSuchRank { rank: Rank, size: usize },

    #[error("{0} channel disconnected")]
    Disconnected(String),

    #[error("malformed {tag} payload: {reason}")]
    Payload { tag: Tag, reason: String },

    #[error("root has no usable length for edge {from} -> {to}")]
    EdgeUnavailable { from: VertexId, to: VertexId },

    #[error("edge-length response out of sequence: expected {expected}, got {got}")]
    OutOfSequence { expected: u64, got: u64 },

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),

    #[error("rank {rank} expected a {expected} partition")]
    RoleMismatch { rank: Rank, expected: &'static str },

    #[error("world has {size} ranks but {leaves} leaf partitions need {needed}")]
    WorldSize { size: usize, leaves: usize, needed: usize },

    #[error("termination incomplete: {done} of {expected} vehicles reported")]
    Incomplete { done: usize, expected: usize },

    #[error("thread {0} panicked")]
    Panicked(String),

    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Vehicle(#[from] VehicleError),
}

pub type DistResult<T> = Result<T, DistError>;
