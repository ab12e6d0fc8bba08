pub mod characterization;
pub mod fabric;
pub mod util;
