// Liquidity Compass - top-of-book depth aggregation and liquidity classification
// Pure Rust library - the feed and the display are supplied by the host

pub mod core;
pub mod layer2;
pub mod layer3;

pub use crate::core::{
    CompassConfig, ConfigError, ConfigManager, DepthEvent, DepthOperation, LiquidityLabel,
    ColorToken, LiquiditySnapshot, Side,
};
pub use crate::layer3::liquidity::{
    CompassAggregator, CompassStats, LatestSnapshot, EventBusSink, OverlaySink, SnapshotSink,
    SinkError,
};
