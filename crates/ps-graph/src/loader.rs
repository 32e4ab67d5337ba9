//! Graph-description loader.
//!
//! # Format
//!
//! A JSON document with a vertex array and an edge array:
//!
//! ```json
//! {
//!   "vertices": [{ "id": 1, "x": 0.0, "y": 0.0 }],
//!   "edges":    [{ "from": 1, "to": 2, "length": 10.0,
//!                  "max_speed": "50", "id": "e1", "name": "Main St" }]
//! }
//! ```
//!
//! The same two arrays may also be nested under a top-level `"graph"` key,
//! which is how the export tooling writes them.  `max_speed` may be a number
//! or a numeric string.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Edge, GraphResult, Vertex};

/// Raw, unfiltered vertex and edge lists.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// Accepts either the bare document or one wrapped in `{"graph": ...}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope {
    Wrapped { graph: GraphDocument },
    Bare(GraphDocument),
}

impl From<Envelope> for GraphDocument {
    fn from(env: Envelope) -> Self {
        match env {
            Envelope::Wrapped { graph } => graph,
            Envelope::Bare(doc)         => doc,
        }
    }
}

impl GraphDocument {
    pub fn new(vertices: Vec<Vertex>, edges: Vec<Edge>) -> Self {
        Self { vertices, edges }
    }

    /// Parse a document held in memory.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> GraphResult<Self> {
        let env: Envelope = serde_json::from_str(json)?;
        Ok(env.into())
    }

    /// Parse a document from any reader.
    pub fn from_reader<R: Read>(reader: R) -> GraphResult<Self> {
        let env: Envelope = serde_json::from_reader(reader)?;
        Ok(env.into())
    }

    /// Load and parse a document from disk.
    ///
    /// # Errors
    ///
    /// [`GraphError::Io`][crate::GraphError::Io] if the file cannot be
    /// opened, [`GraphError::Parse`][crate::GraphError::Parse] if it is not a
    /// valid graph description.
    pub fn load(path: &Path) -> GraphResult<Self> {
        let file = File::open(path)?;
        let doc = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            vertices = doc.vertices.len(),
            edges = doc.edges.len(),
            "loaded graph description"
        );
        Ok(doc)
    }
}
