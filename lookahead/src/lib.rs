pub mod algo;
pub mod delay_model;
pub mod error;
pub mod graph;
pub mod persist;
pub mod planner;
pub mod table;

pub use delay_model::DelayModel;
pub use error::{
    ConstructionError, InvariantViolation, LookaheadError, Result, SerializationError,
};
pub use planner::{Estimate, QueryPlanner};
pub use table::{TableCache, TableStats};

use eda_common::characterization::Characterization;
use eda_common::fabric::{InterconnectHierarchy, TileCoord, TimingGroup};
use eda_common::util::config::LookaheadConfig;
use eda_common::util::profiler::ScopedTimer;
use serde::{Deserialize, Serialize};

/// Delay in picoseconds.
pub type Delay = u32;

/// Immutable, thread-safe interconnect delay estimator.
///
/// All path graphs are built up front; queries only run shortest-path
/// searches over the memoized tables and never mutate the estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Estimator {
    config: LookaheadConfig,
    hierarchy: InterconnectHierarchy,
    model: DelayModel,
    tables: TableCache,
    keys: Vec<TimingGroup>,
}

impl Estimator {
    /// Builds against the characterization's hierarchy override, or the
    /// built-in fabric table when it has none.
    pub fn build(characterization: &Characterization, config: &LookaheadConfig) -> Result<Self> {
        let hierarchy = characterization.hierarchy()?;
        Self::with_hierarchy(hierarchy, characterization, config)
    }

    pub fn with_hierarchy(
        hierarchy: InterconnectHierarchy,
        characterization: &Characterization,
        config: &LookaheadConfig,
    ) -> Result<Self> {
        hierarchy.validate()?;
        let model = DelayModel::new(characterization, &hierarchy)?;
        let tables = TableCache::build(&hierarchy, config)?;
        tables.check_extension(&hierarchy, config.detour_budget)?;
        let keys = hierarchy.key_groups();
        log::debug!(
            "Estimator ready: {} key groups, {} table cells",
            keys.len(),
            tables.stats().cells
        );
        Ok(Self {
            config: config.clone(),
            hierarchy,
            model,
            tables,
            keys,
        })
    }

    pub fn estimate_delay(&self, source: TileCoord, sink: TileCoord) -> Result<Delay> {
        Ok(self.explain(source, sink)?.delay)
    }

    /// Delay of the best plan, together with the plan.
    pub fn explain(&self, source: TileCoord, sink: TileCoord) -> Result<Estimate> {
        self.planner().explain(source, sink).map_err(|e| {
            log::debug!("Query {} -> {} failed: {}", source, sink, e);
            LookaheadError::from(e)
        })
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(persist::encode(self)?)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let _timer = ScopedTimer::with_level("lookahead decode", log::Level::Debug);
        Ok(persist::decode(bytes)?)
    }

    pub fn stats(&self) -> TableStats {
        self.tables.stats()
    }

    pub fn config(&self) -> &LookaheadConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &InterconnectHierarchy {
        &self.hierarchy
    }

    pub fn delay_model(&self) -> &DelayModel {
        &self.model
    }

    pub fn tables(&self) -> &TableCache {
        &self.tables
    }

    fn planner(&self) -> QueryPlanner<'_> {
        QueryPlanner::new(&self.tables, &self.model, &self.hierarchy, &self.keys)
    }
}
