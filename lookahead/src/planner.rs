//! Decomposes a source/sink query into table lookups.
//!
//! Straight queries use one leg. Diagonal queries bend once, at a vertical
//! key group, in either order. Legs longer than the table are split into a
//! tabulated begin, a run of long wires, and a tabulated end.

use crate::Delay;
use crate::algo::{CrossAnchor, LegWeigher, min_delay};
use crate::delay_model::DelayModel;
use crate::error::InvariantViolation;
use crate::table::TableCache;
use eda_common::fabric::{Axis, InterconnectHierarchy, TileCoord, TimingGroup};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BendOrder {
    HorizontalFirst,
    VerticalFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Straight(Axis),
    Bend { key: TimingGroup, order: BendOrder },
}

/// A leg that did not fit in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub begin: u32,
    pub long_hops: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegPlan {
    pub axis: Axis,
    pub from: TimingGroup,
    pub to: TimingGroup,
    /// Coordinate on `axis` where the leg starts.
    pub start: i64,
    pub distance: u32,
    pub delay: Delay,
    pub extension: Option<Extension>,
}

/// Delay of a query together with the plan that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Estimate {
    pub delay: Delay,
    /// Intrinsic delay of the driving logic output.
    pub source_delay: Delay,
    pub route: Route,
    pub legs: Vec<LegPlan>,
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.route {
            Route::Straight(axis) => writeln!(f, "{} ps, straight {}", self.delay, axis)?,
            Route::Bend { key, order } => {
                let order = match order {
                    BendOrder::HorizontalFirst => "horizontal first",
                    BendOrder::VerticalFirst => "vertical first",
                };
                writeln!(f, "{} ps, bend at {} ({})", self.delay, key, order)?
            }
        }
        writeln!(f, "  logic_out: {} ps", self.source_delay)?;
        for leg in &self.legs {
            write!(
                f,
                "  {} {} -> {} from {} over {}: {} ps",
                leg.axis, leg.from, leg.to, leg.start, leg.distance, leg.delay
            )?;
            if let Some(ext) = leg.extension {
                write!(
                    f,
                    " (begin {}, {} long hops, end {})",
                    ext.begin, ext.long_hops, ext.end
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// One straight leg to price.
#[derive(Debug, Clone, Copy)]
struct LegQuery {
    axis: Axis,
    from: TimingGroup,
    to: TimingGroup,
    start: i64,
    direction: i64,
    distance: u32,
    cross: CrossAnchor,
}

pub struct QueryPlanner<'a> {
    tables: &'a TableCache,
    model: &'a DelayModel,
    hierarchy: &'a InterconnectHierarchy,
    keys: &'a [TimingGroup],
}

impl<'a> QueryPlanner<'a> {
    pub fn new(
        tables: &'a TableCache,
        model: &'a DelayModel,
        hierarchy: &'a InterconnectHierarchy,
        keys: &'a [TimingGroup],
    ) -> Self {
        Self {
            tables,
            model,
            hierarchy,
            keys,
        }
    }

    pub fn estimate_delay(
        &self,
        source: TileCoord,
        sink: TileCoord,
    ) -> Result<Delay, InvariantViolation> {
        self.explain(source, sink).map(|e| e.delay)
    }

    pub fn explain(
        &self,
        source: TileCoord,
        sink: TileCoord,
    ) -> Result<Estimate, InvariantViolation> {
        let source_delay = self.model.intrinsic_delay(TimingGroup::LogicOut)?;
        let (dx, sx) = source.span_to(sink, Axis::Horizontal);
        let (dy, sy) = source.span_to(sink, Axis::Vertical);

        let best = if dx == 0 || dy == 0 {
            let axis = if dx == 0 {
                Axis::Vertical
            } else {
                Axis::Horizontal
            };
            let (distance, direction) = source.span_to(sink, axis);
            let cross_axis = axis.other();
            let leg = self.leg(&LegQuery {
                axis,
                from: TimingGroup::LogicOut,
                to: TimingGroup::LogicIn,
                start: source.along(axis) as i64,
                direction,
                distance,
                cross: CrossAnchor::new(source.along(cross_axis) as i64, 1),
            })?;
            match leg {
                Some(leg) => Some((leg.delay, Route::Straight(axis), vec![leg])),
                None if distance <= self.tables.limit(axis) => {
                    return Err(InvariantViolation::MissingTable {
                        axis,
                        distance,
                        from: TimingGroup::LogicOut,
                        to: TimingGroup::LogicIn,
                    });
                }
                None => None,
            }
        } else {
            let mut best: Option<(Delay, Route, Vec<LegPlan>)> = None;
            for &key in self.keys {
                let candidates = [
                    (
                        BendOrder::HorizontalFirst,
                        self.horizontal_first(source, sink, key, (dx, sx), (dy, sy))?,
                    ),
                    (
                        BendOrder::VerticalFirst,
                        self.vertical_first(source, sink, key, (dx, sx), (dy, sy))?,
                    ),
                ];
                for (order, legs) in candidates {
                    let Some(legs) = legs else {
                        continue;
                    };
                    let delay = legs
                        .iter()
                        .fold(0, |acc: Delay, l| acc.saturating_add(l.delay));
                    if best.as_ref().is_none_or(|(b, _, _)| delay < *b) {
                        best = Some((delay, Route::Bend { key, order }, legs));
                    }
                }
            }
            best
        };

        let Some((legs_delay, route, legs)) = best else {
            return Err(InvariantViolation::NoDecomposition { src: source, sink });
        };
        let estimate = Estimate {
            delay: source_delay.saturating_add(legs_delay),
            source_delay,
            route,
            legs,
        };
        log::trace!("{} -> {}: {} ps via {:?}", source, sink, estimate.delay, route);
        Ok(estimate)
    }

    /// Horizontal leg onto `key`, which then carries the signal vertically
    /// from the source row.
    fn horizontal_first(
        &self,
        source: TileCoord,
        sink: TileCoord,
        key: TimingGroup,
        (dx, sx): (u32, i64),
        (dy, sy): (u32, i64),
    ) -> Result<Option<Vec<LegPlan>>, InvariantViolation> {
        let key_len = key.length();
        let Some(rest) = dy.checked_sub(key_len) else {
            return Ok(None);
        };
        let Some(first) = self.leg(&LegQuery {
            axis: Axis::Horizontal,
            from: TimingGroup::LogicOut,
            to: key,
            start: source.x as i64,
            direction: sx,
            distance: dx,
            cross: CrossAnchor::new(source.y as i64, sy),
        })?
        else {
            return Ok(None);
        };
        let Some(second) = self.leg(&LegQuery {
            axis: Axis::Vertical,
            from: key,
            to: TimingGroup::LogicIn,
            start: source.y as i64 + sy * key_len as i64,
            direction: sy,
            distance: rest,
            cross: CrossAnchor::new(sink.x as i64, sx),
        })?
        else {
            return Ok(None);
        };
        Ok(Some(vec![first, second]))
    }

    /// Vertical leg ending on `key`, then a horizontal leg from the bend.
    fn vertical_first(
        &self,
        source: TileCoord,
        sink: TileCoord,
        key: TimingGroup,
        (dx, sx): (u32, i64),
        (dy, sy): (u32, i64),
    ) -> Result<Option<Vec<LegPlan>>, InvariantViolation> {
        let Some(first) = self.leg(&LegQuery {
            axis: Axis::Vertical,
            from: TimingGroup::LogicOut,
            to: key,
            start: source.y as i64,
            direction: sy,
            distance: dy,
            cross: CrossAnchor::new(source.x as i64, sx),
        })?
        else {
            return Ok(None);
        };
        let Some(second) = self.leg(&LegQuery {
            axis: Axis::Horizontal,
            from: key,
            to: TimingGroup::LogicIn,
            start: source.x as i64,
            direction: sx,
            distance: dx,
            cross: CrossAnchor::new(sink.y as i64, sy),
        })?
        else {
            return Ok(None);
        };
        Ok(Some(vec![first, second]))
    }

    /// `None` when no combination of table cells covers the leg.
    fn leg(&self, query: &LegQuery) -> Result<Option<LegPlan>, InvariantViolation> {
        if query.distance <= self.tables.limit(query.axis) {
            let delay = self.cell(query, query.from, query.to, query.distance, query.start)?;
            return Ok(delay.map(|delay| LegPlan {
                axis: query.axis,
                from: query.from,
                to: query.to,
                start: query.start,
                distance: query.distance,
                delay,
                extension: None,
            }));
        }
        self.extended_leg(query)
    }

    /// Shortest delay through a single table cell.
    fn cell(
        &self,
        query: &LegQuery,
        from: TimingGroup,
        to: TimingGroup,
        distance: u32,
        start: i64,
    ) -> Result<Option<Delay>, InvariantViolation> {
        let Some(graph) = self.tables.get(query.axis, distance, from, to) else {
            return Ok(None);
        };
        let weigher = LegWeigher::new(self.model, query.direction, query.cross);
        min_delay(graph, start, &weigher).map(Some)
    }

    /// Tries every split `begin + n * len(long) + end == distance` with both
    /// ends inside the table. Runs of long wires are only used when the long
    /// group may drive itself.
    fn extended_leg(&self, query: &LegQuery) -> Result<Option<LegPlan>, InvariantViolation> {
        let long = query.axis.long_group();
        let long_len = long.length();
        let limit = self.tables.limit(query.axis);
        let distance = query.distance;
        if long_len == 0 {
            return Ok(None);
        }
        let chains = self.hierarchy.is_legal(long, long);

        let max_offset = limit.min(distance);
        let mut ends: Vec<Option<Option<Delay>>> = vec![None; max_offset as usize + 1];
        let mut best: Option<(Delay, Extension)> = None;

        for begin in 0..=max_offset {
            let Some(begin_delay) = self.cell(query, query.from, long, begin, query.start)? else {
                continue;
            };

            // run[n]: delay of n long hops starting at the begin offset.
            let max_hops = if chains {
                (distance - begin) / long_len
            } else {
                0
            };
            let mut run: Vec<Delay> = Vec::with_capacity(max_hops as usize + 1);
            run.push(0);
            let mut position = query.start + query.direction * begin as i64;
            for _ in 0..max_hops {
                let next = position + query.direction * long_len as i64;
                let hop = self.model.hop_delay(long, position, next)?;
                run.push(run[run.len() - 1].saturating_add(hop));
                position = next;
            }

            for end in 0..=limit.min(distance - begin) {
                let middle = distance - begin - end;
                if middle % long_len != 0 {
                    continue;
                }
                let long_hops = middle / long_len;
                let Some(&run_delay) = run.get(long_hops as usize) else {
                    continue;
                };

                let end_delay = match ends[end as usize] {
                    Some(cached) => cached,
                    None => {
                        let end_start = query.start + query.direction * (distance - end) as i64;
                        let d = self.cell(query, long, query.to, end, end_start)?;
                        ends[end as usize] = Some(d);
                        d
                    }
                };
                let Some(end_delay) = end_delay else {
                    continue;
                };

                let total = begin_delay
                    .saturating_add(run_delay)
                    .saturating_add(end_delay);
                if best.is_none_or(|(b, _)| total < b) {
                    best = Some((
                        total,
                        Extension {
                            begin,
                            long_hops,
                            end,
                        },
                    ));
                }
            }
        }

        Ok(best.map(|(delay, extension)| LegPlan {
            axis: query.axis,
            from: query.from,
            to: query.to,
            start: query.start,
            distance,
            delay,
            extension: Some(extension),
        }))
    }
}
