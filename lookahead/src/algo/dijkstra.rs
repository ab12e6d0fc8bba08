//! Shortest path over a [`PathGraph`] with position-dependent edge weights.
//!
//! A hop's delay depends on where in the fabric it starts, and that is only
//! known once its source vertex is settled. Weights are therefore computed
//! lazily: when a vertex is settled, each out-edge is priced from the
//! settled vertex's position, and the target's position is fixed when it is
//! first discovered. Weights are non-negative and never change after being
//! computed, so the usual greedy argument still holds.

use crate::Delay;
use crate::error::InvariantViolation;
use crate::graph::{Edge, PathGraph, VertexId};
use priority_queue::PriorityQueue;
use std::cmp::Reverse;

/// Strategy supplying edge weights and positional state to the search.
pub trait EdgeWeigher {
    /// Delay of `edge`, whose source `settled` sits at fabric coordinate
    /// `position`.
    fn weight(
        &self,
        graph: &PathGraph,
        settled: VertexId,
        edge: &Edge,
        position: i64,
    ) -> Result<Delay, InvariantViolation>;

    /// Position of `edge.to` when first reached from `settled`.
    fn discover(&self, graph: &PathGraph, settled: VertexId, edge: &Edge, position: i64) -> i64;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortestPath {
    pub delay: Delay,
    /// Source to destination, inclusive.
    pub vertices: Vec<VertexId>,
    /// Number of vertices settled before the destination.
    pub settled: usize,
}

/// Minimum delay from the graph's source, anchored at `start`, to its
/// destination.
pub fn min_delay<W: EdgeWeigher + ?Sized>(
    graph: &PathGraph,
    start: i64,
    weigher: &W,
) -> Result<Delay, InvariantViolation> {
    shortest_path(graph, start, weigher).map(|p| p.delay)
}

pub fn shortest_path<W: EdgeWeigher + ?Sized>(
    graph: &PathGraph,
    start: i64,
    weigher: &W,
) -> Result<ShortestPath, InvariantViolation> {
    let n = graph.vertex_count();
    let source = graph.source();
    let destination = graph.destination();

    let mut best = vec![Delay::MAX; n];
    let mut position: Vec<Option<i64>> = vec![None; n];
    let mut parent: Vec<Option<VertexId>> = vec![None; n];
    let mut settled = vec![false; n];
    let mut settled_count = 0;

    best[source.index()] = 0;
    position[source.index()] = Some(start);
    let mut queue: PriorityQueue<VertexId, Reverse<Delay>> = PriorityQueue::new();
    queue.push(source, Reverse(0));

    while let Some((v, Reverse(delay))) = queue.pop() {
        settled[v.index()] = true;
        settled_count += 1;
        if v == destination {
            return Ok(ShortestPath {
                delay,
                vertices: reconstruct_path(&parent, source, destination),
                settled: settled_count,
            });
        }

        let Some(here) = position[v.index()] else {
            continue;
        };
        for e in graph.out_edges(v) {
            let edge = graph.edge(e);
            let u = edge.to.index();
            if settled[u] {
                continue;
            }
            let weight = weigher.weight(graph, v, edge, here)?;
            if position[u].is_none() {
                position[u] = Some(weigher.discover(graph, v, edge, here));
            }
            let candidate = delay.saturating_add(weight);
            if candidate < best[u] {
                best[u] = candidate;
                parent[u] = Some(v);
                queue.push_increase(edge.to, Reverse(candidate));
            }
        }
    }

    Err(InvariantViolation::DestinationUnreachable)
}

fn reconstruct_path(
    parent: &[Option<VertexId>],
    source: VertexId,
    destination: VertexId,
) -> Vec<VertexId> {
    let mut path = vec![destination];
    let mut current = destination;
    while current != source {
        match parent[current.index()] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::leg::{CrossAnchor, LegWeigher};
    use crate::delay_model::DelayModel;
    use crate::graph::PathGraphBuilder;
    use eda_common::characterization::{Characterization, GroupCharacterization};
    use eda_common::fabric::{Axis, InterconnectHierarchy, TimingGroup};
    use std::cell::Cell;

    fn reference_model() -> DelayModel {
        DelayModel::new(
            &Characterization::reference(),
            &InterconnectHierarchy::fabric(),
        )
        .unwrap()
    }

    /// Exhaustive relaxation in topological order. Valid here because every
    /// path reaches a vertex at the same position.
    fn brute_force(graph: &PathGraph, start: i64, weigher: &LegWeigher) -> Delay {
        let order = graph.topological_order().unwrap();
        let mut best = vec![Delay::MAX; graph.vertex_count()];
        let mut pos = vec![start; graph.vertex_count()];
        best[graph.source().index()] = 0;
        for v in order {
            if best[v.index()] == Delay::MAX {
                continue;
            }
            for e in graph.out_edges(v) {
                let edge = graph.edge(e);
                let w = weigher.weight(graph, v, edge, pos[v.index()]).unwrap();
                let u = edge.to.index();
                pos[u] = weigher.discover(graph, v, edge, pos[v.index()]);
                best[u] = best[u].min(best[v.index()] + w);
            }
        }
        best[graph.destination().index()]
    }

    #[test]
    fn agrees_with_exhaustive_search() {
        let h = InterconnectHierarchy::fabric();
        let model = reference_model();
        let builder = PathGraphBuilder::new(&h, 2);
        for axis in Axis::ALL {
            for target in 0..=13 {
                let graph = builder
                    .build(TimingGroup::LogicOut, TimingGroup::LogicIn, axis, target)
                    .unwrap();
                let weigher = LegWeigher::new(&model, 1, CrossAnchor::new(0, 1));
                let fast = min_delay(&graph, 5, &weigher).unwrap();
                assert_eq!(fast, brute_force(&graph, 5, &weigher), "{axis} @ {target}");
            }
        }
    }

    #[test]
    fn path_follows_legal_edges() {
        let h = InterconnectHierarchy::fabric();
        let model = reference_model();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::LogicOut, TimingGroup::LogicIn, Axis::Horizontal, 7)
            .unwrap();
        let weigher = LegWeigher::new(&model, 1, CrossAnchor::new(0, 1));
        let path = shortest_path(&graph, 0, &weigher).unwrap();
        assert_eq!(path.vertices.first(), Some(&graph.source()));
        assert_eq!(path.vertices.last(), Some(&graph.destination()));
        for pair in path.vertices.windows(2) {
            let a = graph.vertex(pair[0]).group;
            let b = graph.vertex(pair[1]).group;
            assert!(h.is_legal(a, b));
        }
        assert!(path.settled <= graph.vertex_count());
    }

    #[test]
    fn start_position_matters_with_non_uniform_pitch() {
        let mut c = Characterization::reference();
        // Tiles 4..8 are three times as wide as the rest.
        let pitch: Vec<f64> = (0..16)
            .scan(0.0, |acc, i| {
                let value = *acc;
                *acc += if (4..8).contains(&i) { 3.0 } else { 1.0 };
                Some(value)
            })
            .collect();
        for group in [
            TimingGroup::HorzSingle,
            TimingGroup::HorzDouble,
            TimingGroup::HorzQuad,
            TimingGroup::HorzLong,
        ] {
            let mut entry = c.get(group).unwrap().clone();
            entry.distances = pitch.clone();
            c.set(entry);
        }
        let h = InterconnectHierarchy::fabric();
        let model = DelayModel::new(&c, &h).unwrap();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::LogicOut, TimingGroup::LogicIn, Axis::Horizontal, 2)
            .unwrap();
        let weigher = LegWeigher::new(&model, 1, CrossAnchor::new(0, 1));
        let narrow = min_delay(&graph, 0, &weigher).unwrap();
        let wide = min_delay(&graph, 4, &weigher).unwrap();
        assert!(wide > narrow, "wide {wide} narrow {narrow}");
    }

    struct Failing;

    impl EdgeWeigher for Failing {
        fn weight(
            &self,
            graph: &PathGraph,
            _settled: VertexId,
            edge: &Edge,
            position: i64,
        ) -> Result<Delay, InvariantViolation> {
            Err(InvariantViolation::NegativeWeight {
                group: graph.hop_group(edge),
                start: position,
                end: position,
                delay: -1.0,
            })
        }

        fn discover(&self, _: &PathGraph, _: VertexId, _: &Edge, position: i64) -> i64 {
            position
        }
    }

    #[test]
    fn negative_weight_aborts_the_search() {
        let h = InterconnectHierarchy::fabric();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::LogicOut, TimingGroup::LogicIn, Axis::Vertical, 1)
            .unwrap();
        let err = min_delay(&graph, 0, &Failing).unwrap_err();
        assert!(matches!(err, InvariantViolation::NegativeWeight { .. }));
    }

    /// Counts weight evaluations; every hop costs its group length.
    struct Counting<'a> {
        calls: &'a Cell<usize>,
    }

    impl EdgeWeigher for Counting<'_> {
        fn weight(
            &self,
            graph: &PathGraph,
            _settled: VertexId,
            edge: &Edge,
            _position: i64,
        ) -> Result<Delay, InvariantViolation> {
            self.calls.set(self.calls.get() + 1);
            Ok(graph.hop_group(edge).length())
        }

        fn discover(&self, graph: &PathGraph, _: VertexId, edge: &Edge, position: i64) -> i64 {
            position + graph.advance(edge)
        }
    }

    #[test]
    fn each_edge_is_priced_at_most_once() {
        let h = InterconnectHierarchy::fabric();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::LogicOut, TimingGroup::LogicIn, Axis::Vertical, 9)
            .unwrap();
        let calls = Cell::new(0);
        let delay = min_delay(&graph, 0, &Counting { calls: &calls }).unwrap();
        assert!(calls.get() <= graph.edge_count());
        // Cheapest by length alone is an exact forward cover of 9 tiles.
        assert_eq!(delay, 9);
    }

    #[test]
    fn single_vertex_graph_costs_nothing() {
        let h = InterconnectHierarchy::fabric();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::HorzLong, TimingGroup::HorzLong, Axis::Horizontal, 0)
            .unwrap();
        let model = reference_model();
        let weigher = LegWeigher::new(&model, -1, CrossAnchor::new(3, 1));
        assert_eq!(min_delay(&graph, 10, &weigher).unwrap(), 0);
    }

    #[test]
    fn cross_anchor_prices_bend_terminator() {
        let mut c = Characterization::reference();
        c.set(
            GroupCharacterization::new(TimingGroup::VertDouble, 10.0, 0.0, 1.0, 0.0)
                .with_distances(vec![0.0, 1.0, 2.0, 10.0, 20.0]),
        );
        let h = InterconnectHierarchy::fabric();
        let model = DelayModel::new(&c, &h).unwrap();
        let graph = PathGraphBuilder::new(&h, 2)
            .build(TimingGroup::LogicOut, TimingGroup::VertDouble, Axis::Horizontal, 1)
            .unwrap();
        let low = LegWeigher::new(&model, 1, CrossAnchor::new(0, 1));
        let high = LegWeigher::new(&model, 1, CrossAnchor::new(2, 1));
        let a = min_delay(&graph, 0, &low).unwrap();
        let b = min_delay(&graph, 0, &high).unwrap();
        // vert_double spans 0..2 (2.0) vs 2..4 (18.0).
        assert_eq!(b - a, 16);
    }
}
