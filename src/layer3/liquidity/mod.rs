// Liquidity Compass - depth aggregation, classification and publishing
//
// Module structure:
// - compass_aggregator.rs: CompassAggregator (event ingestion, fallback, publishing)
// - classifier.rs: LiquidityClassifier (THIN / MEDIUM / THICK)
// - sink.rs: SnapshotSink seam, LatestSnapshot and EventBusSink
// - overlay.rs: OverlaySink and overlay text formatting

pub mod classifier;
pub mod compass_aggregator;
pub mod overlay;
pub mod sink;

pub use classifier::LiquidityClassifier;
pub use compass_aggregator::{CompassAggregator, CompassStats};
pub use overlay::{OverlaySink, OverlayText, format_whole};
pub use sink::{EventBusSink, LatestSnapshot, SinkError, SnapshotSink};
