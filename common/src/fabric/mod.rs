pub mod coord;
pub mod hierarchy;
pub mod timing_group;

pub use coord::TileCoord;
pub use hierarchy::{HierarchyEntry, HierarchyError, InterconnectHierarchy};
pub use timing_group::{Axis, DelayClass, Orientation, TimingGroup};
