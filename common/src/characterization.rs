//! Physical characterization of a fabric: per-group delay coefficients and
//! cumulative distance arrays, plus an optional hierarchy override.

use crate::fabric::{HierarchyEntry, HierarchyError, InterconnectHierarchy, TimingGroup};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupCharacterization {
    pub group: TimingGroup,
    /// Fixed offset in picoseconds.
    #[serde(default)]
    pub k0: f64,
    /// Multiplier on the intrinsic length factor `l`.
    #[serde(default)]
    pub k1: f64,
    /// Multiplier on the physical distance covered by a hop.
    #[serde(default)]
    pub k2: f64,
    #[serde(default)]
    pub l: f64,
    /// Cumulative physical distance indexed by fabric coordinate. Empty means
    /// unit pitch.
    #[serde(default)]
    pub distances: Vec<f64>,
}

impl GroupCharacterization {
    pub fn new(group: TimingGroup, k0: f64, k1: f64, k2: f64, l: f64) -> Self {
        Self {
            group,
            k0,
            k1,
            k2,
            l,
            distances: Vec::new(),
        }
    }

    pub fn with_distances(mut self, distances: Vec<f64>) -> Self {
        self.distances = distances;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Characterization {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupCharacterization>,
    #[serde(default)]
    pub hierarchy: Option<Vec<HierarchyEntry>>,
}

impl Characterization {
    /// Built-in reference fabric with unit pitch. Every wire pays 20 ps per
    /// tile, which dominates the per-hop offsets.
    pub fn reference() -> Self {
        use TimingGroup::*;

        let groups = vec![
            GroupCharacterization::new(VertSingle, 4.0, 1.0, 20.0, 0.0),
            GroupCharacterization::new(VertDouble, 5.0, 1.0, 20.0, 1.0),
            GroupCharacterization::new(VertQuad, 6.0, 1.0, 20.0, 2.0),
            GroupCharacterization::new(VertLong, 8.0, 1.0, 20.0, 4.0),
            GroupCharacterization::new(HorzSingle, 4.0, 1.0, 20.0, 0.0),
            GroupCharacterization::new(HorzDouble, 5.0, 1.0, 20.0, 1.0),
            GroupCharacterization::new(HorzQuad, 6.0, 1.0, 20.0, 2.0),
            GroupCharacterization::new(HorzLong, 8.0, 1.0, 20.0, 3.0),
            GroupCharacterization::new(LogicOut, 2.0, 0.0, 0.0, 0.0),
            GroupCharacterization::new(LogicIn, 3.0, 0.0, 0.0, 0.0),
            GroupCharacterization::new(Bounce, 6.0, 0.0, 0.0, 0.0),
        ];
        Self {
            groups,
            hierarchy: None,
        }
    }

    pub fn get(&self, group: TimingGroup) -> Option<&GroupCharacterization> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Replaces or adds the entry for `entry.group`.
    pub fn set(&mut self, entry: GroupCharacterization) {
        match self.groups.iter_mut().find(|g| g.group == entry.group) {
            Some(slot) => *slot = entry,
            None => self.groups.push(entry),
        }
    }

    /// The override hierarchy if one is present, the built-in fabric otherwise.
    pub fn hierarchy(&self) -> Result<InterconnectHierarchy, HierarchyError> {
        match &self.hierarchy {
            Some(entries) => InterconnectHierarchy::from_entries(entries.iter().cloned()),
            None => Ok(InterconnectHierarchy::fabric()),
        }
    }
}
