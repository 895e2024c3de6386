pub mod book;
pub mod metrics;
pub mod params;

pub use book::*;
pub use metrics::*;
pub use params::*;
