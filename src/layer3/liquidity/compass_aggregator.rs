// Compass Aggregator - applies depth events and publishes liquidity snapshots
// One instance per instrument, driven synchronously by the feed dispatcher

use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::core::config::{instrument_root, CompassConfig, ConfigError};
use crate::core::types::{DepthEvent, DepthOperation, LiquiditySnapshot, Side};
use crate::layer2::depth_book::{DepthBook, LevelState};

use super::classifier::LiquidityClassifier;
use super::sink::SnapshotSink;

/// Counters kept by the aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompassStats {
    pub instrument: String,
    pub events_applied: u64,
    pub ignored_subject: u64,
    pub ignored_range: u64,
    pub clears_recorded: u64,
    pub levels_expired: u64,
    pub fallbacks_used: u64,
    pub negative_volumes: u64,
    pub snapshots_published: u64,
    pub publish_failures: u64,
}

impl fmt::Display for CompassStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compass({} applied={} ignored={} clears={} expired={} fallbacks={} published={} failed={})",
            self.instrument,
            self.events_applied,
            self.ignored_subject + self.ignored_range,
            self.clears_recorded,
            self.levels_expired,
            self.fallbacks_used,
            self.snapshots_published,
            self.publish_failures
        )
    }
}

/// CompassAggregator owns the depth ladder and the fallback totals
pub struct CompassAggregator {
    config: CompassConfig,
    book: DepthBook,
    classifier: LiquidityClassifier,

    // Fallback-on-zero carry
    last_bid_total: f64,
    last_ask_total: f64,

    current: Option<LiquiditySnapshot>,
    sinks: Vec<Arc<dyn SnapshotSink>>,
    stats: CompassStats,
}

impl CompassAggregator {
    /// Rejects an invalid configuration (e.g. inverted thresholds)
    pub fn new(config: CompassConfig) -> Result<Self, ConfigError> {
        let classifier = LiquidityClassifier::from_config(&config)?;
        let book = DepthBook::new(config.depth_levels, config.stale_clear_window_ms());

        debug!(
            instrument = %config.instrument,
            depth_levels = config.depth_levels,
            thin = config.thin_threshold,
            thick = config.thick_threshold,
            "Initializing CompassAggregator"
        );

        let stats = CompassStats {
            instrument: config.instrument.clone(),
            ..CompassStats::default()
        };

        Ok(Self {
            config,
            book,
            classifier,
            last_bid_total: 0.0,
            last_ask_total: 0.0,
            current: None,
            sinks: Vec::new(),
            stats,
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.attach_sink(sink);
        self
    }

    pub fn attach_sink(&mut self, sink: Arc<dyn SnapshotSink>) {
        debug!(sink = sink.name(), "Snapshot sink attached");
        self.sinks.push(sink);
    }

    /// Release every collaborator. Later events update state but publish nowhere.
    pub fn teardown(&mut self) {
        debug!(instrument = %self.config.instrument, sinks = self.sinks.len(), "Tearing down CompassAggregator");
        self.sinks.clear();
    }

    /// Forget every level and the fallback totals. Sinks stay attached.
    pub fn reset(&mut self) {
        debug!(instrument = %self.config.instrument, "Resetting CompassAggregator");
        self.book.reset();
        self.last_bid_total = 0.0;
        self.last_ask_total = 0.0;
        self.current = None;
    }

    /// True when the event's root symbol matches the configured subject
    pub fn accepts_instrument(&self, instrument: &str) -> bool {
        instrument_root(instrument).eq_ignore_ascii_case(self.config.instrument_root())
    }

    /// Feed entry point: filters by instrument, then applies the update
    pub fn on_depth_event(&mut self, event: &DepthEvent) -> Option<&LiquiditySnapshot> {
        if !self.accepts_instrument(&event.instrument) {
            self.stats.ignored_subject += 1;
            trace!(instrument = %event.instrument, "Ignoring event for other instrument");
            return None;
        }

        self.apply_depth_event(
            event.side,
            event.position,
            event.operation,
            event.volume,
            event.timestamp,
        )
    }

    /// Apply one level update and recompute the snapshot.
    ///
    /// Positions outside `0..depth_levels` are ignored and return `None`.
    /// A remove, or a zero volume, only starts the stale-clear window: the
    /// level keeps counting until the window has elapsed at a later event.
    /// Negative volumes are clamped to zero and so count as a clear.
    pub fn apply_depth_event(
        &mut self,
        side: Side,
        position: i64,
        operation: DepthOperation,
        volume: i64,
        timestamp: i64,
    ) -> Option<&LiquiditySnapshot> {
        let position = match usize::try_from(position) {
            Ok(p) if p < self.book.depth_levels() => p,
            _ => {
                self.stats.ignored_range += 1;
                trace!(side = %side, position, "Ignoring out-of-range depth position");
                return None;
            }
        };

        if volume < 0 {
            self.stats.negative_volumes += 1;
            warn!(side = %side, position, volume, "Negative depth volume clamped to zero");
        }
        let volume = volume.max(0) as u64;
        let remove = operation.is_remove() || volume == 0;

        if self.config.enable_logging {
            debug!(side = %side, position, operation = %operation, volume, "Depth event");
        }

        self.book.apply(side, position, volume, remove, timestamp);
        self.stats.events_applied += 1;
        if remove {
            self.stats.clears_recorded += 1;
        }

        let snapshot = self.recompute(timestamp);
        self.publish(&snapshot);
        self.current = Some(snapshot);
        self.current.as_ref()
    }

    fn recompute(&mut self, now: i64) -> LiquiditySnapshot {
        let totals = self.book.totals(now);
        self.stats.levels_expired += totals.expired as u64;

        let fresh_bid = totals.bid as f64;
        let fresh_ask = totals.ask as f64;

        let bid_total = if fresh_bid == 0.0 { self.last_bid_total } else { fresh_bid };
        let ask_total = if fresh_ask == 0.0 { self.last_ask_total } else { fresh_ask };
        if (fresh_bid == 0.0 && bid_total > 0.0) || (fresh_ask == 0.0 && ask_total > 0.0) {
            self.stats.fallbacks_used += 1;
        }
        self.last_bid_total = bid_total;
        self.last_ask_total = ask_total;

        let (average, label) = self.classifier.classify(bid_total, ask_total);

        if self.config.enable_logging {
            debug!(bid_total, ask_total, average, label = %label, "Liquidity recomputed");
        }

        LiquiditySnapshot {
            instrument: self.config.instrument.clone(),
            timestamp: now,
            bid_total,
            ask_total,
            average,
            label,
            color: label.color(),
        }
    }

    fn publish(&mut self, snapshot: &LiquiditySnapshot) {
        for sink in &self.sinks {
            match sink.publish(snapshot) {
                Ok(()) => self.stats.snapshots_published += 1,
                Err(e) => {
                    // Skipped for this cycle only
                    self.stats.publish_failures += 1;
                    debug!(sink = sink.name(), error = %e, "Snapshot publish skipped");
                }
            }
        }
    }

    /// Last published snapshot, None before the first applied event
    pub fn snapshot(&self) -> Option<&LiquiditySnapshot> {
        self.current.as_ref()
    }

    pub fn level_state(&self, side: Side, position: usize, now: i64) -> Option<LevelState> {
        self.book.level_state(side, position, now)
    }

    pub fn book(&self) -> &DepthBook {
        &self.book
    }

    pub fn config(&self) -> &CompassConfig {
        &self.config
    }

    pub fn stats(&self) -> CompassStats {
        self.stats.clone()
    }
}
