//! Spatial strip partitioner.
//!
//! # Strips
//!
//! The bounding box of all vertices is cut into `N` equal-width vertical
//! strips.  With `w = (max_x - min_x) / N`, a vertex at `x` belongs to strip
//!
//! ```text
//! floor((x - min_x) / w)   clamped to N-1
//! ```
//!
//! i.e. every strip is half-open `[left, right)` except the last, which also
//! owns the right edge of the bounding box.  Each vertex is therefore claimed
//! by exactly one strip.  A zero-width box (all vertices share one `x`) puts
//! every vertex in strip 0.
//!
//! # Filtering
//!
//! A leaf keeps the vertices of its strip and the edges whose *both*
//! endpoints are in that strip.  Cross-strip edges exist only in the root
//! graph; a vehicle that needs one is a boundary crossing handled by the
//! coordinator, never by a local lookup.
//!
//! Candidate vertices for a strip come from an R-tree envelope query (via
//! `rstar`) and are then checked against the exact strip rule above.

use std::sync::Arc;

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use ps_core::{PartitionId, Point, Rect, VertexId};

use crate::{Edge, Graph, GraphDocument, GraphError, GraphResult, Vertex};

// ── R-tree vertex entry ───────────────────────────────────────────────────────

/// Entry stored in the R-tree: an `[x, y]` point and the vertex's position in
/// the input list.
#[derive(Clone)]
struct VertexEntry {
    point: [f64; 2],
    slot:  usize,
}

impl RTreeObject for VertexEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for VertexEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.point[0] - point[0];
        let dy = self.point[1] - point[1];
        dx * dx + dy * dy
    }
}

// ── PartitionPlan ─────────────────────────────────────────────────────────────

/// Bounding box, strip rectangles and spatial index for one vertex set.
pub struct PartitionPlan {
    bounds: Rect,
    rects:  Vec<Rect>,
    index:  RTree<VertexEntry>,
}

impl PartitionPlan {
    /// Compute the bounding box of `vertices` and cut it into `strips`
    /// rectangles.
    pub fn new(vertices: &[Vertex], strips: usize) -> GraphResult<PartitionPlan> {
        if strips == 0 {
            return Err(GraphError::NoStrips);
        }
        let bounds = Rect::bounding(vertices.iter().map(Vertex::pos))
            .ok_or(GraphError::EmptyVertices)?;
        let rects = bounds.vertical_strips(strips);

        let entries: Vec<VertexEntry> = vertices
            .iter()
            .enumerate()
            .map(|(slot, v)| VertexEntry { point: [v.x, v.y], slot })
            .collect();
        let index = RTree::bulk_load(entries);

        debug!(%bounds, strips, "partition plan computed");
        Ok(PartitionPlan { bounds, rects, index })
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    pub fn strip_count(&self) -> usize {
        self.rects.len()
    }

    /// The single strip that owns position `p`.
    pub fn strip_of(&self, p: Point) -> usize {
        let n = self.rects.len();
        let w = self.bounds.width() / n as f64;
        if w <= 0.0 || !w.is_finite() {
            return 0;
        }
        let raw = ((p.x - self.bounds.bottom_left.x) / w).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(n - 1)
        }
    }

    /// Vertices of strip `index` and the edges with both endpoints among
    /// them, in input order.
    ///
    /// `vertices` must be the list this plan was built from.
    pub fn filter(
        &self,
        index:    usize,
        vertices: &[Vertex],
        edges:    &[Edge],
    ) -> GraphResult<(Vec<Vertex>, Vec<Edge>)> {
        let rect = self.rect(index)?;
        // Pad the query so floating rounding at a strip edge can only add
        // candidates; the exact strip rule below decides membership.
        let pad = self.bounds.width().abs() * 1e-9 + f64::EPSILON;
        let envelope = AABB::from_corners(
            [rect.bottom_left.x - pad, rect.bottom_left.y - pad],
            [rect.top_right.x + pad, rect.top_right.y + pad],
        );

        let mut slots: Vec<usize> = self
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|e| e.slot)
            .filter(|&slot| self.strip_of(vertices[slot].pos()) == index)
            .collect();
        slots.sort_unstable();

        let kept: Vec<Vertex> = slots.iter().map(|&s| vertices[s].clone()).collect();
        let members: FxHashSet<VertexId> = kept.iter().map(|v| v.id).collect();
        let internal: Vec<Edge> = edges
            .iter()
            .filter(|e| members.contains(&e.from) && members.contains(&e.to))
            .cloned()
            .collect();

        Ok((kept, internal))
    }

    fn rect(&self, index: usize) -> GraphResult<Rect> {
        self.rects
            .get(index)
            .copied()
            .ok_or(GraphError::RectOutOfRange { index, count: self.rects.len() })
    }
}

// ── Partition ─────────────────────────────────────────────────────────────────

/// A built graph partition.
///
/// The root carries the complete graph and acts as routing authority.  A leaf
/// carries only its strip; it reaches the root through its coordinator, not
/// through a pointer held here.
#[derive(Clone, Debug)]
pub enum Partition {
    Root {
        graph: Arc<Graph>,
    },
    Leaf {
        id:    PartitionId,
        rect:  Rect,
        graph: Arc<Graph>,
    },
}

impl Partition {
    pub fn id(&self) -> PartitionId {
        match self {
            Partition::Root { .. }     => PartitionId::ROOT,
            Partition::Leaf { id, .. } => *id,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, Partition::Root { .. })
    }

    pub fn graph(&self) -> &Arc<Graph> {
        match self {
            Partition::Root { graph } | Partition::Leaf { graph, .. } => graph,
        }
    }

    /// The strip rectangle of a leaf.  `None` for the root.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            Partition::Root { .. }       => None,
            Partition::Leaf { rect, .. } => Some(*rect),
        }
    }
}

/// Which partition to build.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The unfiltered full graph.
    Root,
    /// The leaf built from strip `index` (0-based).
    Leaf(usize),
}

/// Immutable description of one partition build.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartitionConfig {
    pub strips:    usize,
    pub selection: Selection,
}

/// Build one partition from a raw graph description.
///
/// # Errors
///
/// - [`GraphError::EmptyVertices`] / [`GraphError::EmptyEdges`] if the
///   document lacks either list.
/// - [`GraphError::NoStrips`] if `config.strips == 0`.
/// - [`GraphError::RectOutOfRange`] if a leaf strip index is too large.
/// - [`GraphError::DanglingEdge`] if the document's edges reference
///   unknown vertices.
pub fn build_partition(doc: &GraphDocument, config: &PartitionConfig) -> GraphResult<Partition> {
    check_document(doc)?;
    let plan = PartitionPlan::new(&doc.vertices, config.strips)?;
    match config.selection {
        Selection::Root        => build_root(doc),
        Selection::Leaf(index) => build_leaf(&plan, doc, index),
    }
}

/// Build the root and every leaf, sharing one plan.
///
/// Leaves are returned in strip order, so `leaves[i].id() == PartitionId::leaf(i)`.
pub fn build_all(doc: &GraphDocument, strips: usize) -> GraphResult<(Partition, Vec<Partition>)> {
    check_document(doc)?;
    let plan = PartitionPlan::new(&doc.vertices, strips)?;
    let root = build_root(doc)?;
    let leaves = (0..plan.strip_count())
        .map(|i| build_leaf(&plan, doc, i))
        .collect::<GraphResult<Vec<_>>>()?;
    Ok((root, leaves))
}

fn check_document(doc: &GraphDocument) -> GraphResult<()> {
    if doc.vertices.is_empty() {
        return Err(GraphError::EmptyVertices);
    }
    if doc.edges.is_empty() {
        return Err(GraphError::EmptyEdges);
    }
    Ok(())
}

fn build_root(doc: &GraphDocument) -> GraphResult<Partition> {
    let graph = Graph::new(doc.vertices.clone(), doc.edges.clone())?;
    info!(
        partition = %PartitionId::ROOT,
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "built root graph"
    );
    Ok(Partition::Root { graph: Arc::new(graph) })
}

fn build_leaf(plan: &PartitionPlan, doc: &GraphDocument, index: usize) -> GraphResult<Partition> {
    let rect = plan.rect(index)?;
    let (vertices, edges) = plan.filter(index, &doc.vertices, &doc.edges)?;
    let graph = Graph::new(vertices, edges)?;
    let id = PartitionId::leaf(index);
    info!(
        partition = %id,
        %rect,
        vertices = graph.vertex_count(),
        edges = graph.edge_count(),
        "built leaf graph"
    );
    Ok(Partition::Leaf { id, rect, graph: Arc::new(graph) })
}
