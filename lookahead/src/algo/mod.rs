pub mod dijkstra;
pub mod leg;

pub use dijkstra::{EdgeWeigher, ShortestPath, min_delay, shortest_path};
pub use leg::{CrossAnchor, LegWeigher};
