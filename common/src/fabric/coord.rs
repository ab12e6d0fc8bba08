use super::timing_group::Axis;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tile coordinate in the routing fabric.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn along(&self, axis: Axis) -> u32 {
        match axis {
            Axis::Horizontal => self.x,
            Axis::Vertical => self.y,
        }
    }

    /// Unsigned span and step direction (+1 / -1) from `self` to `other`.
    pub fn span_to(&self, other: TileCoord, axis: Axis) -> (u32, i64) {
        let from = self.along(axis);
        let to = other.along(axis);
        if to >= from {
            (to - from, 1)
        } else {
            (from - to, -1)
        }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl FromStr for TileCoord {
    type Err = String;

    /// Parses `X,Y`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
        let x = x
            .trim()
            .parse()
            .map_err(|e| format!("bad x coordinate '{}': {}", x, e))?;
        let y = y
            .trim()
            .parse()
            .map_err(|e| format!("bad y coordinate '{}': {}", y, e))?;
        Ok(Self { x, y })
    }
}
