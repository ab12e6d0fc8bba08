//! Linear per-group delay model.
//!
//! A hop of group `g` spanning fabric coordinates `[a, b]` costs
//! `k0 + k1 * L + k2 * |phys(b) - phys(a)|` picoseconds, where `phys` is the
//! group's cumulative distance array. Pitch does not have to be uniform.

use crate::Delay;
use crate::error::{ConstructionError, InvariantViolation};
use eda_common::characterization::Characterization;
use eda_common::fabric::{InterconnectHierarchy, TimingGroup};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DelayCoefficients {
    pub k0: f64,
    pub k1: f64,
    pub k2: f64,
    pub l: f64,
}

impl DelayCoefficients {
    #[inline]
    fn evaluate(&self, physical_distance: f64) -> f64 {
        self.k0 + self.k1 * self.l + self.k2 * physical_distance
    }
}

/// Monotone cumulative physical distance, indexed by fabric coordinate.
///
/// Coordinates outside the array extrapolate with the pitch of the nearest
/// end, so detours that leave the fabric edge still get a finite length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceArray {
    cumulative: Vec<f64>,
}

impl DistanceArray {
    /// Unit pitch: `phys(c) == c`.
    pub fn unit() -> Self {
        Self::default()
    }

    /// Fails with the first index at which the sequence decreases.
    pub fn new(cumulative: Vec<f64>) -> Result<Self, usize> {
        if let Some(i) = cumulative.windows(2).position(|w| !(w[1] >= w[0])) {
            return Err(i + 1);
        }
        Ok(Self { cumulative })
    }

    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    pub fn at(&self, coord: i64) -> f64 {
        let arr = &self.cumulative;
        let n = arr.len();
        match n {
            0 => coord as f64,
            1 => arr[0] + coord as f64,
            _ => {
                let last = (n - 1) as i64;
                if coord < 0 {
                    arr[0] + coord as f64 * (arr[1] - arr[0])
                } else if coord > last {
                    arr[n - 1] + (coord - last) as f64 * (arr[n - 1] - arr[n - 2])
                } else {
                    arr[coord as usize]
                }
            }
        }
    }

    #[inline]
    pub fn span(&self, start: i64, end: i64) -> f64 {
        (self.at(end) - self.at(start)).abs()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayModel {
    coefficients: Vec<DelayCoefficients>,
    distances: Vec<DistanceArray>,
}

impl DelayModel {
    /// Every group declared by `hierarchy` must be characterized.
    pub fn new(
        characterization: &Characterization,
        hierarchy: &InterconnectHierarchy,
    ) -> Result<Self, ConstructionError> {
        let mut coefficients = vec![DelayCoefficients::default(); TimingGroup::COUNT];
        let mut distances = vec![DistanceArray::unit(); TimingGroup::COUNT];
        let mut seen = [false; TimingGroup::COUNT];

        for entry in &characterization.groups {
            let idx = entry.group.index();
            coefficients[idx] = DelayCoefficients {
                k0: entry.k0,
                k1: entry.k1,
                k2: entry.k2,
                l: entry.l,
            };
            distances[idx] = DistanceArray::new(entry.distances.clone()).map_err(|index| {
                ConstructionError::DecreasingDistances {
                    group: entry.group,
                    index,
                }
            })?;
            seen[idx] = true;
        }

        if let Some(missing) = hierarchy.declared().find(|g| !seen[g.index()]) {
            return Err(ConstructionError::MissingCoefficients(missing));
        }

        Ok(Self {
            coefficients,
            distances,
        })
    }

    pub fn coefficients(&self, group: TimingGroup) -> &DelayCoefficients {
        &self.coefficients[group.index()]
    }

    pub fn distances(&self, group: TimingGroup) -> &DistanceArray {
        &self.distances[group.index()]
    }

    /// Unrounded delay of a `group` hop between two fabric coordinates.
    pub fn raw_hop_delay(&self, group: TimingGroup, start: i64, end: i64) -> f64 {
        let idx = group.index();
        self.coefficients[idx].evaluate(self.distances[idx].span(start, end))
    }

    pub fn hop_delay(
        &self,
        group: TimingGroup,
        start: i64,
        end: i64,
    ) -> Result<Delay, InvariantViolation> {
        let delay = self.raw_hop_delay(group, start, end);
        if !(delay >= 0.0) {
            return Err(InvariantViolation::NegativeWeight {
                group,
                start,
                end,
                delay,
            });
        }
        Ok(delay.round() as Delay)
    }

    /// Delay of a zero-span hop (pins, bounce wires).
    pub fn intrinsic_delay(&self, group: TimingGroup) -> Result<Delay, InvariantViolation> {
        self.hop_delay(group, 0, 0)
    }
}
