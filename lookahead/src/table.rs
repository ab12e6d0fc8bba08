//! Eagerly built path-graph tables, one per axis.

use crate::error::ConstructionError;
use crate::graph::{PathGraph, PathGraphBuilder};
use dashmap::DashMap;
use eda_common::fabric::{Axis, InterconnectHierarchy, TimingGroup};
use eda_common::util::config::LookaheadConfig;
use eda_common::util::profiler::ScopedTimer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

type CellKey = (Axis, u32, TimingGroup, TimingGroup);

/// How far past the table limit to look for the first usable extension cell.
const EXTENSION_PROBE_SPAN: u32 = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStats {
    /// Cells holding a path graph.
    pub cells: usize,
    /// Cells whose destination cannot be reached.
    pub unreachable: usize,
    pub vertices: usize,
    pub edges: usize,
}

/// `[distance][from][to]` for a single axis, flattened. Absent cells are
/// either not tabulated or unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AxisTable {
    max_distance: u32,
    cells: Vec<Option<PathGraph>>,
}

impl AxisTable {
    fn empty(max_distance: u32) -> Self {
        let len = (max_distance as usize + 1) * TimingGroup::COUNT * TimingGroup::COUNT;
        Self {
            max_distance,
            cells: vec![None; len],
        }
    }

    #[inline]
    fn slot(distance: u32, from: TimingGroup, to: TimingGroup) -> usize {
        (distance as usize * TimingGroup::COUNT + from.index()) * TimingGroup::COUNT + to.index()
    }

    fn get(&self, distance: u32, from: TimingGroup, to: TimingGroup) -> Option<&PathGraph> {
        if distance > self.max_distance {
            return None;
        }
        self.cells[Self::slot(distance, from, to)].as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCache {
    horizontal: AxisTable,
    vertical: AxisTable,
    stats: TableStats,
}

impl TableCache {
    /// Builds every cell of both tables.
    ///
    /// Rows are `logic_out`, the axis long group and the key groups; columns
    /// are `logic_in`, the axis long group and the key groups. Only declared
    /// groups take part.
    pub fn build(
        hierarchy: &InterconnectHierarchy,
        config: &LookaheadConfig,
    ) -> Result<Self, ConstructionError> {
        if config.threads > 0 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| ConstructionError::ThreadPool(e.to_string()))?;
            pool.install(|| Self::build_parallel(hierarchy, config))
        } else {
            Self::build_parallel(hierarchy, config)
        }
    }

    fn build_parallel(
        hierarchy: &InterconnectHierarchy,
        config: &LookaheadConfig,
    ) -> Result<Self, ConstructionError> {
        let _timer = ScopedTimer::new("lookahead table construction");
        let builder = PathGraphBuilder::new(hierarchy, config.detour_budget);
        let keys = hierarchy.key_groups();

        let mut jobs: Vec<CellKey> = Vec::new();
        for axis in Axis::ALL {
            let limit = match axis {
                Axis::Horizontal => config.table_width,
                Axis::Vertical => config.table_height,
            };
            let long = axis.long_group();
            let rows: Vec<TimingGroup> = [TimingGroup::LogicOut, long]
                .into_iter()
                .chain(keys.iter().copied())
                .filter(|&g| hierarchy.is_declared(g))
                .collect();
            let columns: Vec<TimingGroup> = [TimingGroup::LogicIn, long]
                .into_iter()
                .chain(keys.iter().copied())
                .filter(|&g| hierarchy.is_declared(g))
                .collect();
            for distance in 0..=limit {
                for &from in &rows {
                    for &to in &columns {
                        jobs.push((axis, distance, from, to));
                    }
                }
            }
        }
        jobs.sort();
        jobs.dedup();
        log::info!(
            "Building {} lookahead cells (width {}, height {}, {} key groups)",
            jobs.len(),
            config.table_width,
            config.table_height,
            keys.len()
        );

        let built: DashMap<CellKey, PathGraph> = DashMap::with_capacity(jobs.len());
        jobs.par_iter()
            .try_for_each(|&(axis, distance, from, to)| {
                match builder.build(from, to, axis, distance) {
                    Ok(graph) => {
                        built.insert((axis, distance, from, to), graph);
                        Ok(())
                    }
                    Err(ConstructionError::Unreachable { .. })
                        if !(config.strict_tables
                            && from == TimingGroup::LogicOut
                            && to == TimingGroup::LogicIn) =>
                    {
                        log::debug!("{} cell {} -> {} @ {} is unreachable", axis, from, to, distance);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            })?;

        let mut horizontal = AxisTable::empty(config.table_width);
        let mut vertical = AxisTable::empty(config.table_height);
        let mut stats = TableStats {
            unreachable: jobs.len() - built.len(),
            ..TableStats::default()
        };
        for ((axis, distance, from, to), graph) in built.into_iter() {
            stats.cells += 1;
            stats.vertices += graph.vertex_count();
            stats.edges += graph.edge_count();
            let table = match axis {
                Axis::Horizontal => &mut horizontal,
                Axis::Vertical => &mut vertical,
            };
            table.cells[AxisTable::slot(distance, from, to)] = Some(graph);
        }

        log::info!(
            "Lookahead tables: {} cells, {} unreachable, {} vertices, {} edges",
            stats.cells,
            stats.unreachable,
            stats.vertices,
            stats.edges
        );
        Ok(Self {
            horizontal,
            vertical,
            stats,
        })
    }

    pub fn get(
        &self,
        axis: Axis,
        distance: u32,
        from: TimingGroup,
        to: TimingGroup,
    ) -> Option<&PathGraph> {
        self.table(axis).get(distance, from, to)
    }

    /// Largest distance tabulated along `axis`.
    pub fn limit(&self, axis: Axis) -> u32 {
        self.table(axis).max_distance
    }

    pub fn stats(&self) -> TableStats {
        self.stats
    }

    /// Checks that legs longer than the table can be split. Each axis whose
    /// long group is declared needs a `logic_out -> long` begin cell and a
    /// `long -> logic_in` end cell within its limit.
    pub fn check_extension(
        &self,
        hierarchy: &InterconnectHierarchy,
        detour_budget: u32,
    ) -> Result<(), ConstructionError> {
        for axis in Axis::ALL {
            let long = axis.long_group();
            if !hierarchy.is_declared(long) {
                log::debug!("{} long group {} is not declared, no extension", axis, long);
                continue;
            }
            let limit = self.limit(axis);
            let shortest = |from, to| (0..=limit).find(|&d| self.get(axis, d, from, to).is_some());
            let begin = shortest(TimingGroup::LogicOut, long);
            let end = shortest(long, TimingGroup::LogicIn);
            if begin.is_some() && end.is_some() {
                if !hierarchy.is_legal(long, long) {
                    log::warn!(
                        "{} cannot drive itself; {} legs longer than {} tiles have no decomposition",
                        long,
                        axis,
                        2 * limit
                    );
                }
                continue;
            }

            let builder = PathGraphBuilder::new(hierarchy, detour_budget);
            let first_beyond = |from, to| {
                (limit + 1..=limit + EXTENSION_PROBE_SPAN)
                    .find(|&d| builder.build(from, to, axis, d).is_ok())
                    .ok_or(ConstructionError::Unreachable {
                        from,
                        to,
                        axis,
                        distance: limit + EXTENSION_PROBE_SPAN,
                    })
            };
            let begin = match begin {
                Some(d) => d,
                None => first_beyond(TimingGroup::LogicOut, long)?,
            };
            let end = match end {
                Some(d) => d,
                None => first_beyond(long, TimingGroup::LogicIn)?,
            };
            return Err(ConstructionError::TableTooNarrow {
                axis,
                limit,
                required: begin.max(end),
            });
        }
        Ok(())
    }

    fn table(&self, axis: Axis) -> &AxisTable {
        match axis {
            Axis::Horizontal => &self.horizontal,
            Axis::Vertical => &self.vertical,
        }
    }
}
