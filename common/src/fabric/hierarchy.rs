use super::timing_group::{Axis, TimingGroup};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("timing group {0} is declared more than once")]
    Duplicate(TimingGroup),

    #[error("timing group {from} drives {to}, which is not declared")]
    Undeclared { from: TimingGroup, to: TimingGroup },

    #[error("hierarchy does not declare the {0} endpoint")]
    MissingEndpoint(TimingGroup),

    #[error("timing group {0} can never reach logic_in")]
    InputUnreachable(TimingGroup),
}

/// One row of a hierarchy as written in a characterization file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub group: TimingGroup,
    #[serde(default)]
    pub next: Vec<TimingGroup>,
}

/// Which timing groups each timing group may legally drive.
///
/// Groups without a row are "undeclared": they never appear in a path graph
/// and are never offered as bend waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterconnectHierarchy {
    next: Vec<Option<Vec<TimingGroup>>>,
}

impl Default for InterconnectHierarchy {
    fn default() -> Self {
        Self::fabric()
    }
}

impl InterconnectHierarchy {
    /// The built-in tiled fabric.
    pub fn fabric() -> Self {
        use TimingGroup::*;

        const SHORT: [TimingGroup; 6] = [
            VertSingle, VertDouble, VertQuad, HorzSingle, HorzDouble, HorzQuad,
        ];
        let wires = || {
            let mut v = SHORT.to_vec();
            v.extend([VertLong, HorzLong]);
            v
        };

        let mut next = vec![None; TimingGroup::COUNT];
        let mut set = |group: TimingGroup, targets: Vec<TimingGroup>| {
            next[group.index()] = Some(targets);
        };

        let mut out = SHORT.to_vec();
        out.push(Bounce);
        set(LogicOut, out);

        for group in [VertSingle, VertDouble, HorzSingle, HorzDouble] {
            let mut targets = wires();
            targets.extend([LogicIn, Bounce]);
            set(group, targets);
        }
        for group in [VertQuad, HorzQuad] {
            let mut targets = wires();
            targets.push(Bounce);
            set(group, targets);
        }
        for group in [VertLong, HorzLong] {
            set(group, wires());
        }
        set(Bounce, vec![LogicIn]);
        set(LogicIn, Vec::new());

        Self { next }
    }

    /// Builds and validates a custom hierarchy.
    pub fn from_entries<I>(entries: I) -> Result<Self, HierarchyError>
    where
        I: IntoIterator<Item = HierarchyEntry>,
    {
        let mut next: Vec<Option<Vec<TimingGroup>>> = vec![None; TimingGroup::COUNT];
        for entry in entries {
            let slot = &mut next[entry.group.index()];
            if slot.is_some() {
                return Err(HierarchyError::Duplicate(entry.group));
            }
            let mut targets = entry.next;
            targets.sort();
            targets.dedup();
            *slot = Some(targets);
        }
        let hierarchy = Self { next };
        hierarchy.validate()?;
        Ok(hierarchy)
    }

    pub fn validate(&self) -> Result<(), HierarchyError> {
        for endpoint in [TimingGroup::LogicOut, TimingGroup::LogicIn] {
            if !self.is_declared(endpoint) {
                return Err(HierarchyError::MissingEndpoint(endpoint));
            }
        }
        for from in self.declared() {
            for &to in self.legal_next(from) {
                if !self.is_declared(to) {
                    return Err(HierarchyError::Undeclared { from, to });
                }
            }
        }

        // Reverse BFS from logic_in over the transition table.
        let mut reaches_input = [false; TimingGroup::COUNT];
        reaches_input[TimingGroup::LogicIn.index()] = true;
        let mut queue = VecDeque::from([TimingGroup::LogicIn]);
        while let Some(target) = queue.pop_front() {
            for driver in self.declared() {
                if !reaches_input[driver.index()] && self.is_legal(driver, target) {
                    reaches_input[driver.index()] = true;
                    queue.push_back(driver);
                }
            }
        }
        if let Some(dead) = self.declared().find(|g| !reaches_input[g.index()]) {
            return Err(HierarchyError::InputUnreachable(dead));
        }
        Ok(())
    }

    #[inline]
    pub fn is_declared(&self, group: TimingGroup) -> bool {
        self.next[group.index()].is_some()
    }

    pub fn declared(&self) -> impl Iterator<Item = TimingGroup> + '_ {
        TimingGroup::ALL
            .into_iter()
            .filter(move |&g| self.is_declared(g))
    }

    /// Groups `group` may drive. Undeclared groups drive nothing.
    #[inline]
    pub fn legal_next(&self, group: TimingGroup) -> &[TimingGroup] {
        self.next[group.index()].as_deref().unwrap_or(&[])
    }

    /// Legal successors of `group` accepted by `pred`.
    pub fn legal_next_filtered<'a, P>(
        &'a self,
        group: TimingGroup,
        mut pred: P,
    ) -> impl Iterator<Item = TimingGroup> + 'a
    where
        P: FnMut(TimingGroup) -> bool + 'a,
    {
        self.legal_next(group)
            .iter()
            .copied()
            .filter(move |&g| pred(g))
    }

    pub fn is_legal(&self, from: TimingGroup, to: TimingGroup) -> bool {
        self.legal_next(from).contains(&to)
    }

    /// Declared vertical groups, used as bend waypoints by the planner.
    pub fn key_groups(&self) -> Vec<TimingGroup> {
        self.declared()
            .filter(|g| g.axis() == Some(Axis::Vertical))
            .collect()
    }

    pub fn entries(&self) -> Vec<HierarchyEntry> {
        self.declared()
            .map(|group| HierarchyEntry {
                group,
                next: self.legal_next(group).to_vec(),
            })
            .collect()
    }
}
