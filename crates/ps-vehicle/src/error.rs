use ps_core::{VehicleId, VertexId};
use ps_graph::GraphError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error("invalid vehicle: {0}")]
    Invalid(String),

    #[error("vehicle {vehicle} is off its local graph: {source}")]
    OffGraph {
        vehicle: VehicleId,
        #[source]
        source:  GraphError,
    },

    #[error("vehicle {vehicle} reached partition boundary at {next} in single-graph mode")]
    UnexpectedBoundary { vehicle: VehicleId, next: VertexId },

    #[error("no routable origin/destination pair found after {attempts} attempts")]
    NoRoutablePair { attempts: usize },

    #[error("graph has fewer than two vertices to route between")]
    TooFewVertices,

    #[error("malformed vehicle message: {0}")]
    Wire(#[from] serde_json::Error),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type VehicleResult<T> = Result<T, VehicleError>;
