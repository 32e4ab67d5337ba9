//! Routing trait and default Dijkstra implementation.
//!
//! Vehicles are seeded with a precomputed vertex path over the root graph.
//! Seeding calls routing through the [`Router`] trait so a different
//! algorithm (A*, contraction hierarchies) can be swapped in without touching
//! the vehicle or coordinator crates.
//!
//! Costs are edge `length`s: the shortest path is the shortest street
//! distance, not the fastest.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use ps_core::VertexId;

use crate::{Graph, GraphError, GraphResult};

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// Implementations must be `Send + Sync` so one router can be shared by
/// every thread that seeds or re-plans vehicles.
pub trait Router: Send + Sync {
    /// Ordered vertex sequence from `from` to `to`, both inclusive.
    ///
    /// `from == to` yields the one-element path `[from]`.  Returns
    /// [`GraphError::NoRoute`] when `to` is unreachable and
    /// [`GraphError::VertexNotFound`] for an unknown endpoint.
    fn shortest_path(
        &self,
        graph: &Graph,
        from:  VertexId,
        to:    VertexId,
    ) -> GraphResult<Vec<VertexId>>;
}

// ── DijkstraRouter ────────────────────────────────────────────────────────────

/// Standard Dijkstra over the CSR street graph, with edge length as cost.
pub struct DijkstraRouter;

impl Router for DijkstraRouter {
    fn shortest_path(
        &self,
        graph: &Graph,
        from:  VertexId,
        to:    VertexId,
    ) -> GraphResult<Vec<VertexId>> {
        dijkstra(graph, from, to)
    }
}

/// Sentinel for "no predecessor".
const NONE: usize = usize::MAX;

fn dijkstra(graph: &Graph, from: VertexId, to: VertexId) -> GraphResult<Vec<VertexId>> {
    let src = graph.index(from).ok_or(GraphError::VertexNotFound(from))?;
    let dst = graph.index(to).ok_or(GraphError::VertexNotFound(to))?;
    if src == dst {
        return Ok(vec![from]);
    }

    let n = graph.vertex_count();
    // dist[v] = best known distance to reach v.
    let mut dist = vec![f64::INFINITY; n];
    // prev[v] = dense index of the vertex that reached v.
    let mut prev = vec![NONE; n];

    dist[src] = 0.0;

    // Min-heap keyed on (distance, dense index); the index breaks ties
    // deterministically.
    let mut heap: BinaryHeap<Reverse<(OrderedFloat<f64>, usize)>> = BinaryHeap::new();
    heap.push(Reverse((OrderedFloat(0.0), src)));

    while let Some(Reverse((OrderedFloat(cost), node))) = heap.pop() {
        if node == dst {
            return Ok(reconstruct(graph, &prev, dst));
        }

        // Skip stale heap entries.
        if cost > dist[node] {
            continue;
        }

        for e in graph.out_range(node) {
            let (edge, neighbor) = graph.edge_at(e);
            let next = cost + edge.length;
            if next < dist[neighbor] {
                dist[neighbor] = next;
                prev[neighbor] = node;
                heap.push(Reverse((OrderedFloat(next), neighbor)));
            }
        }
    }

    Err(GraphError::NoRoute { from, to })
}

fn reconstruct(graph: &Graph, prev: &[usize], dst: usize) -> Vec<VertexId> {
    let mut path = vec![graph.id_at(dst)];
    let mut cur = dst;
    while prev[cur] != NONE {
        cur = prev[cur];
        path.push(graph.id_at(cur));
    }
    path.reverse();
    path
}
