//! Graph-subsystem error type.

use thiserror::Error;

use ps_core::VertexId;

/// Errors produced by `ps-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph description has no vertices")]
    EmptyVertices,

    #[error("graph description has no edges")]
    EmptyEdges,

    #[error("strip count must be >= 1")]
    NoStrips,

    #[error("rectangle {index} selected but only {count} exist")]
    RectOutOfRange { index: usize, count: usize },

    #[error("edge {from} -> {to} references a vertex outside the graph")]
    DanglingEdge { from: VertexId, to: VertexId },

    #[error("vertex {0} not found in graph")]
    VertexNotFound(VertexId),

    #[error("edge {from} -> {to} not found in graph")]
    EdgeNotFound { from: VertexId, to: VertexId },

    #[error("no route from {from} to {to}")]
    NoRoute { from: VertexId, to: VertexId },

    #[error("malformed graph description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
