// Layer 3 - Aggregators
// Consumes depth events and produces liquidity snapshots

pub mod liquidity;

pub use liquidity::{CompassAggregator, CompassStats};
