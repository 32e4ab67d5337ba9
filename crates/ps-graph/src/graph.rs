//! Street graph representation.
//!
//! # Data layout
//!
//! Vertex IDs in the graph description are sparse integers, so the graph
//! assigns each vertex a dense `u32` index at construction time and stores
//! outgoing edges in **Compressed Sparse Row (CSR)** order.  Given dense
//! index `n`, its outgoing edges occupy:
//!
//! ```text
//! edges[ out_start[n] .. out_start[n+1] ]
//! ```
//!
//! `edges` is sorted by source index, so iterating over a vertex's outgoing
//! edges is a contiguous scan, which Dijkstra's inner loop relies on.
//!
//! A `Graph` is immutable once built.  Share it across threads by `Arc`.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize};

use ps_core::{Point, VertexId};

use crate::{GraphError, GraphResult};

// ── Vertex / Edge ─────────────────────────────────────────────────────────────

/// A street intersection as loaded from the graph description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub x:  f64,
    pub y:  f64,
}

impl Vertex {
    #[inline]
    pub fn new(id: i64, x: f64, y: f64) -> Self {
        Self { id: VertexId(id), x, y }
    }

    #[inline]
    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A directed street segment.
///
/// `length` is the only field the step algorithm reads; `max_speed` is carried
/// through but never caps vehicle speed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub from:   VertexId,
    pub to:     VertexId,
    pub length: f64,

    /// Speed limit.  Accepts a JSON number or a numeric string; anything
    /// else reads as 0.
    #[serde(default, deserialize_with = "lenient_speed")]
    pub max_speed: f64,

    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

impl Edge {
    pub fn new(from: i64, to: i64, length: f64) -> Self {
        Self {
            from:      VertexId(from),
            to:        VertexId(to),
            length,
            max_speed: 0.0,
            id:        String::new(),
            name:      String::new(),
        }
    }
}

fn lenient_speed<'de, D: Deserializer<'de>>(de: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(de)? {
        Some(Raw::Number(v)) => v,
        Some(Raw::Text(s))   => s.trim().parse().unwrap_or(0.0),
        None                 => 0.0,
    })
}

// ── Graph ─────────────────────────────────────────────────────────────────────

/// Directed street graph in CSR format.
///
/// Invariant: every edge's endpoints are vertices of this same graph.
/// Construct with [`Graph::new`].
#[derive(Debug)]
pub struct Graph {
    /// Vertex ID of each dense index.
    vertex_ids: Vec<VertexId>,

    /// Position of each dense index.
    vertex_pos: Vec<Point>,

    /// Sparse ID → dense index.
    index_of: FxHashMap<VertexId, u32>,

    /// CSR row pointer.  Length = `vertex_count + 1`.
    out_start: Vec<u32>,

    /// Edges sorted by source index.
    edges: Vec<Edge>,

    /// Dense index of each edge's target, parallel to `edges`.
    edge_to: Vec<u32>,

    /// Distinct vertex IDs referenced by at least one edge, computed on
    /// first use.
    referenced: OnceLock<Vec<VertexId>>,
}

impl Graph {
    /// Build a graph from vertex and edge lists.
    ///
    /// Vertex IDs are assumed unique; if one repeats, the first occurrence
    /// wins.  Fails with [`GraphError::DanglingEdge`] if an edge names a
    /// vertex that is not in `vertices`.
    ///
    /// Time complexity: O(V + E log E).
    pub fn new(vertices: Vec<Vertex>, edges: Vec<Edge>) -> GraphResult<Graph> {
        let mut index_of: FxHashMap<VertexId, u32> =
            FxHashMap::with_capacity_and_hasher(vertices.len(), Default::default());
        let mut vertex_ids = Vec::with_capacity(vertices.len());
        let mut vertex_pos = Vec::with_capacity(vertices.len());

        for v in &vertices {
            if index_of.contains_key(&v.id) {
                continue;
            }
            index_of.insert(v.id, vertex_ids.len() as u32);
            vertex_ids.push(v.id);
            vertex_pos.push(v.pos());
        }

        // Resolve endpoints, then sort by source for CSR construction.
        let mut keyed: Vec<(u32, u32, Edge)> = Vec::with_capacity(edges.len());
        for e in edges {
            match (index_of.get(&e.from), index_of.get(&e.to)) {
                (Some(&f), Some(&t)) => keyed.push((f, t, e)),
                _ => return Err(GraphError::DanglingEdge { from: e.from, to: e.to }),
            }
        }
        keyed.sort_by_key(|(f, _, _)| *f);

        let vertex_count = vertex_ids.len();
        let mut out_start = vec![0u32; vertex_count + 1];
        for (f, _, _) in &keyed {
            out_start[*f as usize + 1] += 1;
        }
        for i in 1..=vertex_count {
            out_start[i] += out_start[i - 1];
        }
        debug_assert_eq!(out_start[vertex_count] as usize, keyed.len());

        let edge_to = keyed.iter().map(|(_, t, _)| *t).collect();
        let edges   = keyed.into_iter().map(|(_, _, e)| e).collect();

        Ok(Graph {
            vertex_ids,
            vertex_pos,
            index_of,
            out_start,
            edges,
            edge_to,
            referenced: OnceLock::new(),
        })
    }

    // ── Dimensions ────────────────────────────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertex_ids.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_ids.is_empty()
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn vertex_exists(&self, id: VertexId) -> bool {
        self.index_of.contains_key(&id)
    }

    pub fn position(&self, id: VertexId) -> GraphResult<Point> {
        self.index(id)
            .map(|i| self.vertex_pos[i])
            .ok_or(GraphError::VertexNotFound(id))
    }

    /// The edge `from → to`.  With parallel edges the first one in input
    /// order is returned.
    pub fn edge(&self, from: VertexId, to: VertexId) -> GraphResult<&Edge> {
        let not_found = GraphError::EdgeNotFound { from, to };
        let (Some(f), Some(t)) = (self.index(from), self.index(to)) else {
            return Err(not_found);
        };
        self.out_range(f)
            .find(|&e| self.edge_to[e] as usize == t)
            .map(|e| &self.edges[e])
            .ok_or(not_found)
    }

    /// Outgoing edges of `id`; empty for an unknown vertex.
    pub fn out_edges(&self, id: VertexId) -> impl Iterator<Item = &Edge> + '_ {
        let range = match self.index(id) {
            Some(i) => self.out_range(i),
            None    => 0..0,
        };
        self.edges[range].iter()
    }

    /// Every vertex ID, including ones no edge touches, in input order.
    pub fn vertex_ids(&self) -> &[VertexId] {
        &self.vertex_ids
    }

    /// Distinct vertex IDs referenced by at least one edge.
    ///
    /// Order is not meaningful.  Computed once on first call and cached for
    /// the lifetime of the graph.
    pub fn vertices(&self) -> &[VertexId] {
        self.referenced.get_or_init(|| {
            let mut seen = vec![false; self.vertex_count()];
            for (src, targets) in self.out_start.windows(2).enumerate() {
                if targets[0] != targets[1] {
                    seen[src] = true;
                }
            }
            for &t in &self.edge_to {
                seen[t as usize] = true;
            }
            seen.iter()
                .enumerate()
                .filter(|(_, s)| **s)
                .map(|(i, _)| self.vertex_ids[i])
                .collect()
        })
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    // ── Dense-index access for the router ─────────────────────────────────

    #[inline]
    pub(crate) fn index(&self, id: VertexId) -> Option<usize> {
        self.index_of.get(&id).map(|&i| i as usize)
    }

    #[inline]
    pub(crate) fn id_at(&self, index: usize) -> VertexId {
        self.vertex_ids[index]
    }

    #[inline]
    pub(crate) fn out_range(&self, index: usize) -> std::ops::Range<usize> {
        self.out_start[index] as usize..self.out_start[index + 1] as usize
    }

    #[inline]
    pub(crate) fn edge_at(&self, e: usize) -> (&Edge, usize) {
        (&self.edges[e], self.edge_to[e] as usize)
    }
}
