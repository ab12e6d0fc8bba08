use super::dijkstra::EdgeWeigher;
use crate::Delay;
use crate::delay_model::DelayModel;
use crate::error::InvariantViolation;
use crate::graph::{Edge, PathGraph, VertexId};

/// Where hops onto the other axis are priced. A bend terminator starts at
/// `coord` on the cross axis and runs `direction` for its full length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossAnchor {
    pub coord: i64,
    pub direction: i64,
}

impl CrossAnchor {
    pub fn new(coord: i64, direction: i64) -> Self {
        Self { coord, direction }
    }
}

/// Prices the hops of one straight leg through a [`DelayModel`].
///
/// Positions are fabric coordinates on the leg axis. A hop on the leg axis
/// spans from the settled position to the discovered one; a hop without an
/// axis (pins, bounce wires) has zero span.
pub struct LegWeigher<'a> {
    model: &'a DelayModel,
    direction: i64,
    cross: CrossAnchor,
}

impl<'a> LegWeigher<'a> {
    pub fn new(model: &'a DelayModel, direction: i64, cross: CrossAnchor) -> Self {
        Self {
            model,
            direction,
            cross,
        }
    }
}

impl EdgeWeigher for LegWeigher<'_> {
    fn weight(
        &self,
        graph: &PathGraph,
        _settled: VertexId,
        edge: &Edge,
        position: i64,
    ) -> Result<Delay, InvariantViolation> {
        let group = graph.hop_group(edge);
        match group.axis() {
            Some(axis) if axis == graph.axis() => {
                let end = position + self.direction * graph.advance(edge);
                self.model.hop_delay(group, position, end)
            }
            Some(_) => {
                let start = self.cross.coord;
                let end = start + self.cross.direction * group.length() as i64;
                self.model.hop_delay(group, start, end)
            }
            None => self.model.hop_delay(group, position, position),
        }
    }

    fn discover(&self, graph: &PathGraph, _settled: VertexId, edge: &Edge, position: i64) -> i64 {
        position + self.direction * graph.advance(edge)
    }
}
