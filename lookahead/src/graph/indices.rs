//! Dense ids into the vertex and edge arrays of a [`super::PathGraph`].

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! graph_index {
    ($name:ident, $prefix:literal) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            #[inline(always)]
            pub fn new(id: usize) -> Self {
                debug_assert!(id <= u32::MAX as usize, "{} overflow", stringify!($name));
                Self(id as u32)
            }

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

graph_index!(VertexId, "v");
graph_index!(EdgeId, "e");
