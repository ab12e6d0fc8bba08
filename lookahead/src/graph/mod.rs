//! Memoized path graphs.
//!
//! A [`PathGraph`] holds every legal sequence of timing-group hops that
//! covers a fixed distance along one axis, from one group to another. It is
//! built once by [`builder::PathGraphBuilder`] and shared read-only by every
//! query that needs the same (distance, from, to) key.

pub mod builder;
pub mod indices;

pub use builder::PathGraphBuilder;
pub use indices::{EdgeId, VertexId};

use eda_common::fabric::{Axis, TimingGroup};
use serde::{Deserialize, Serialize};

/// A reached state: the far end of a `group` wire lies `distance` tiles from
/// the leg start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vertex {
    pub distance: u32,
    pub group: TimingGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: VertexId,
    pub to: VertexId,
}

/// Directed acyclic graph in compressed adjacency form. Out-edges of vertex
/// `v` are `edges[offsets[v]..offsets[v + 1]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGraph {
    axis: Axis,
    target: u32,
    vertices: Vec<Vertex>,
    offsets: Vec<u32>,
    edges: Vec<Edge>,
    source: VertexId,
    destination: VertexId,
}

impl PathGraph {
    pub(crate) fn from_adjacency(
        axis: Axis,
        target: u32,
        vertices: Vec<Vertex>,
        adjacency: Vec<Vec<VertexId>>,
        source: VertexId,
        destination: VertexId,
    ) -> Self {
        debug_assert_eq!(vertices.len(), adjacency.len());
        let mut offsets = Vec::with_capacity(vertices.len() + 1);
        let mut edges = Vec::with_capacity(adjacency.iter().map(Vec::len).sum());
        offsets.push(0);
        for (from, targets) in adjacency.into_iter().enumerate() {
            edges.extend(targets.into_iter().map(|to| Edge {
                from: VertexId::new(from),
                to,
            }));
            offsets.push(edges.len() as u32);
        }
        Self {
            axis,
            target,
            vertices,
            offsets,
            edges,
            source,
            destination,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Distance covered between source and destination.
    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn destination(&self) -> VertexId {
        self.destination
    }

    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Ids of the out-edges of `v`.
    #[inline]
    pub fn out_edges(&self, v: VertexId) -> impl Iterator<Item = EdgeId> {
        let start = self.offsets[v.index()] as usize;
        let end = self.offsets[v.index() + 1] as usize;
        (start..end).map(EdgeId::new)
    }

    /// Group of the wire entered by `edge`.
    #[inline]
    pub fn hop_group(&self, edge: &Edge) -> TimingGroup {
        self.vertex(edge.to).group
    }

    /// Signed change in leg distance along `edge`. Negative for detour returns.
    #[inline]
    pub fn advance(&self, edge: &Edge) -> i64 {
        self.vertex(edge.to).distance as i64 - self.vertex(edge.from).distance as i64
    }

    /// Vertices that cannot reach the destination. Empty for every graph
    /// produced by the builder.
    pub fn dead_vertices(&self) -> Vec<VertexId> {
        let n = self.vertices.len();
        let mut reaches = vec![false; n];
        reaches[self.destination.index()] = true;
        // Repeated relaxation; graphs are tiny.
        let mut changed = true;
        while changed {
            changed = false;
            for edge in &self.edges {
                if reaches[edge.to.index()] && !reaches[edge.from.index()] {
                    reaches[edge.from.index()] = true;
                    changed = true;
                }
            }
        }
        (0..n)
            .filter(|&i| !reaches[i])
            .map(VertexId::new)
            .collect()
    }

    /// Kahn's algorithm; `None` if the graph has a cycle.
    pub fn topological_order(&self) -> Option<Vec<VertexId>> {
        let n = self.vertices.len();
        let mut indegree = vec![0usize; n];
        for edge in &self.edges {
            indegree[edge.to.index()] += 1;
        }
        let mut ready: Vec<VertexId> = (0..n)
            .filter(|&i| indegree[i] == 0)
            .map(VertexId::new)
            .collect();
        let mut order = Vec::with_capacity(n);
        while let Some(v) = ready.pop() {
            order.push(v);
            for e in self.out_edges(v) {
                let to = self.edge(e).to;
                indegree[to.index()] -= 1;
                if indegree[to.index()] == 0 {
                    ready.push(to);
                }
            }
        }
        (order.len() == n).then_some(order)
    }
}
