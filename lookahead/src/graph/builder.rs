use super::{PathGraph, Vertex, VertexId};
use crate::error::ConstructionError;
use eda_common::fabric::{Axis, InterconnectHierarchy, TimingGroup};
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// At or below the target distance.
    Forward,
    /// Past the target; the next hop must land exactly on it.
    Detouring,
}

#[derive(Clone, Copy, Debug)]
struct WaveEntry {
    group: TimingGroup,
    distance: u32,
    vertex: VertexId,
    phase: Phase,
}

/// Breadth-first construction of [`PathGraph`]s over an interconnect
/// hierarchy.
///
/// Hop rules for a leg covering `target` tiles along `axis`:
/// - below the target, a hop onto a wire of the leg axis advances by the
///   wire length, and may overshoot by at most `detour_budget` tiles;
/// - an overshooting state may only take one hop straight back onto the
///   target;
/// - at the target, only zero-advance hops are taken: into the destination
///   group when it is not a wire of the leg axis (logic inputs, bend
///   waypoints), or into a local bounce wire.
///
/// Only the source may overshoot from the target itself, which is what makes
/// zero-distance legs possible. Together these rules keep the graph acyclic.
pub struct PathGraphBuilder<'a> {
    hierarchy: &'a InterconnectHierarchy,
    detour_budget: u32,
}

impl<'a> PathGraphBuilder<'a> {
    pub fn new(hierarchy: &'a InterconnectHierarchy, detour_budget: u32) -> Self {
        Self {
            hierarchy,
            detour_budget,
        }
    }

    pub fn build(
        &self,
        from: TimingGroup,
        to: TimingGroup,
        axis: Axis,
        target: u32,
    ) -> Result<PathGraph, ConstructionError> {
        let unreachable = || ConstructionError::Unreachable {
            from,
            to,
            axis,
            distance: target,
        };
        if !self.hierarchy.is_declared(from) || !self.hierarchy.is_declared(to) {
            return Err(unreachable());
        }

        let source_vertex = Vertex {
            distance: 0,
            group: from,
        };
        let source = VertexId::new(0);
        if from == to && target == 0 {
            return Ok(PathGraph::from_adjacency(
                axis,
                target,
                vec![source_vertex],
                vec![Vec::new()],
                source,
                source,
            ));
        }

        let mut vertices = vec![source_vertex];
        let mut adjacency: Vec<Vec<VertexId>> = vec![Vec::new()];
        let mut index: HashMap<Vertex, VertexId> = HashMap::from([(source_vertex, source)]);
        let dest_key = Vertex {
            distance: target,
            group: to,
        };

        let mut wave = vec![WaveEntry {
            group: from,
            distance: 0,
            vertex: source,
            phase: Phase::Forward,
        }];

        while !wave.is_empty() {
            let mut next_wave = Vec::new();
            for entry in &wave {
                let candidates = self.hierarchy.legal_next_filtered(entry.group, move |g| {
                    g.axis() == Some(axis) || g == to || g.is_local()
                });
                for group in candidates {
                    let Some(distance) = self.step(entry, source, group, to, axis, target) else {
                        continue;
                    };
                    let key = Vertex { distance, group };
                    let (vertex, created) = match index.get(&key) {
                        Some(&id) => (id, false),
                        None => {
                            let id = VertexId::new(vertices.len());
                            vertices.push(key);
                            adjacency.push(Vec::new());
                            index.insert(key, id);
                            (id, true)
                        }
                    };
                    if vertex == source || vertex == entry.vertex {
                        continue;
                    }
                    let out = &mut adjacency[entry.vertex.index()];
                    if !out.contains(&vertex) {
                        out.push(vertex);
                    }
                    if created && key != dest_key {
                        next_wave.push(WaveEntry {
                            group,
                            distance,
                            vertex,
                            phase: if distance > target {
                                Phase::Detouring
                            } else {
                                Phase::Forward
                            },
                        });
                    }
                }
            }
            wave = next_wave;
        }

        let destination = *index.get(&dest_key).ok_or_else(unreachable)?;
        let graph = prune(axis, target, vertices, adjacency, source, destination);
        log::trace!(
            "{} graph {} -> {} @ {}: {} vertices, {} edges",
            axis,
            from,
            to,
            target,
            graph.vertex_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    /// Distance reached by hopping from `entry` onto `next`, if the hop is
    /// allowed.
    fn step(
        &self,
        entry: &WaveEntry,
        source: VertexId,
        next: TimingGroup,
        to: TimingGroup,
        axis: Axis,
        target: u32,
    ) -> Option<u32> {
        let on_axis = next.axis() == Some(axis);
        let len = next.length();
        match entry.phase {
            Phase::Detouring => {
                (on_axis && entry.distance.checked_sub(len) == Some(target)).then_some(target)
            }
            Phase::Forward => {
                let at_target = entry.distance == target;
                if on_axis {
                    if at_target && entry.vertex != source {
                        return None;
                    }
                    let distance = entry.distance + len;
                    (distance <= target + self.detour_budget).then_some(distance)
                } else if at_target
                    && (next == to || (next.is_local() && !entry.group.is_local()))
                {
                    Some(target)
                } else {
                    None
                }
            }
        }
    }
}

/// Drops every vertex that cannot reach the destination and compacts ids.
fn prune(
    axis: Axis,
    target: u32,
    vertices: Vec<Vertex>,
    adjacency: Vec<Vec<VertexId>>,
    source: VertexId,
    destination: VertexId,
) -> PathGraph {
    let n = vertices.len();
    let mut alive = vec![true; n];
    loop {
        let mut removed = false;
        for v in 0..n {
            if alive[v]
                && v != destination.index()
                && adjacency[v].iter().all(|w| !alive[w.index()])
            {
                alive[v] = false;
                removed = true;
            }
        }
        if !removed {
            break;
        }
    }

    let mut remap = vec![None; n];
    let mut kept = Vec::with_capacity(n);
    for (v, vertex) in vertices.into_iter().enumerate() {
        if alive[v] {
            remap[v] = Some(VertexId::new(kept.len()));
            kept.push(vertex);
        }
    }
    let compact: Vec<Vec<VertexId>> = adjacency
        .into_iter()
        .enumerate()
        .filter(|(v, _)| alive[*v])
        .map(|(_, out)| out.into_iter().filter_map(|w| remap[w.index()]).collect())
        .collect();

    // Both survive: the source reaches the destination by construction.
    let source = remap[source.index()].unwrap_or(source);
    let destination = remap[destination.index()].unwrap_or(destination);
    PathGraph::from_adjacency(axis, target, kept, compact, source, destination)
}
