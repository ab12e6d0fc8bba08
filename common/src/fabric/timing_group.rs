//! The closed set of abstract wire-segment categories ("timing groups").
//!
//! Every real routing resource of the fabric is classified into one of these
//! categories before it reaches the lookahead. Adding a variant forces every
//! `match` in the workspace to be revisited.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Routing axis of a leg or of a wire category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Horizontal, Axis::Vertical];

    pub fn other(self) -> Axis {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    /// Long-range category used to extend legs beyond the table range.
    pub fn long_group(self) -> TimingGroup {
        match self {
            Axis::Horizontal => TimingGroup::HorzLong,
            Axis::Vertical => TimingGroup::VertLong,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Vertical,
    Horizontal,
    Input,
    Output,
    Local,
}

impl Orientation {
    pub fn axis(self) -> Option<Axis> {
        match self {
            Orientation::Vertical => Some(Axis::Vertical),
            Orientation::Horizontal => Some(Axis::Horizontal),
            Orientation::Input | Orientation::Output | Orientation::Local => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayClass {
    Single,
    Double,
    Quad,
    Long,
    Output,
    Input,
    Bounce,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimingGroup {
    VertSingle,
    VertDouble,
    VertQuad,
    VertLong,
    HorzSingle,
    HorzDouble,
    HorzQuad,
    HorzLong,
    /// Logic-block output pin pseudo-category. Every query starts here.
    LogicOut,
    /// Logic-block input pin pseudo-category. Every query ends here.
    LogicIn,
    /// Local bounce wire feeding logic inputs inside a tile.
    Bounce,
}

impl TimingGroup {
    pub const COUNT: usize = 11;

    pub const ALL: [TimingGroup; TimingGroup::COUNT] = [
        TimingGroup::VertSingle,
        TimingGroup::VertDouble,
        TimingGroup::VertQuad,
        TimingGroup::VertLong,
        TimingGroup::HorzSingle,
        TimingGroup::HorzDouble,
        TimingGroup::HorzQuad,
        TimingGroup::HorzLong,
        TimingGroup::LogicOut,
        TimingGroup::LogicIn,
        TimingGroup::Bounce,
    ];

    pub fn orientation(self) -> Orientation {
        match self {
            TimingGroup::VertSingle
            | TimingGroup::VertDouble
            | TimingGroup::VertQuad
            | TimingGroup::VertLong => Orientation::Vertical,
            TimingGroup::HorzSingle
            | TimingGroup::HorzDouble
            | TimingGroup::HorzQuad
            | TimingGroup::HorzLong => Orientation::Horizontal,
            TimingGroup::LogicOut => Orientation::Output,
            TimingGroup::LogicIn => Orientation::Input,
            TimingGroup::Bounce => Orientation::Local,
        }
    }

    pub fn delay_class(self) -> DelayClass {
        match self {
            TimingGroup::VertSingle | TimingGroup::HorzSingle => DelayClass::Single,
            TimingGroup::VertDouble | TimingGroup::HorzDouble => DelayClass::Double,
            TimingGroup::VertQuad | TimingGroup::HorzQuad => DelayClass::Quad,
            TimingGroup::VertLong | TimingGroup::HorzLong => DelayClass::Long,
            TimingGroup::LogicOut => DelayClass::Output,
            TimingGroup::LogicIn => DelayClass::Input,
            TimingGroup::Bounce => DelayClass::Bounce,
        }
    }

    /// Nominal hop length in tiles along the group's own axis.
    pub fn length(self) -> u32 {
        match self {
            TimingGroup::VertSingle | TimingGroup::HorzSingle => 1,
            TimingGroup::VertDouble | TimingGroup::HorzDouble => 2,
            TimingGroup::VertQuad | TimingGroup::HorzQuad => 4,
            TimingGroup::VertLong => 12,
            TimingGroup::HorzLong => 6,
            TimingGroup::LogicOut | TimingGroup::LogicIn | TimingGroup::Bounce => 0,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn axis(self) -> Option<Axis> {
        self.orientation().axis()
    }

    pub fn is_local(self) -> bool {
        self.orientation() == Orientation::Local
    }

    pub fn name(self) -> &'static str {
        match self {
            TimingGroup::VertSingle => "vert_single",
            TimingGroup::VertDouble => "vert_double",
            TimingGroup::VertQuad => "vert_quad",
            TimingGroup::VertLong => "vert_long",
            TimingGroup::HorzSingle => "horz_single",
            TimingGroup::HorzDouble => "horz_double",
            TimingGroup::HorzQuad => "horz_quad",
            TimingGroup::HorzLong => "horz_long",
            TimingGroup::LogicOut => "logic_out",
            TimingGroup::LogicIn => "logic_in",
            TimingGroup::Bounce => "bounce",
        }
    }
}

impl fmt::Display for TimingGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
