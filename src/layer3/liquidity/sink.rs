// Snapshot Sinks - outbound seam from the aggregator to display collaborators
// Every sink is "latest value wins": nothing is queued behind a slow reader

use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::core::events::{
    get_event_bus, Event, EventBus, EventPriority, LIQUIDITY_LABEL_CHANGE, LIQUIDITY_SNAPSHOT,
};
use crate::core::types::{LiquidityLabel, LiquiditySnapshot};

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("collaborator not attached")]
    Detached,
    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Receives every snapshot the aggregator publishes
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: &LiquiditySnapshot) -> Result<(), SinkError>;

    fn name(&self) -> &str;
}

// ============================================================================
// Latest Snapshot (single slot)
// ============================================================================

/// Single-slot buffer. Readers poll `latest()` or await a `watch::Receiver`.
pub struct LatestSnapshot {
    tx: watch::Sender<Option<LiquiditySnapshot>>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LiquiditySnapshot>> {
        self.tx.subscribe()
    }

    pub fn latest(&self) -> Option<LiquiditySnapshot> {
        self.tx.borrow().clone()
    }
}

impl Default for LatestSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSink for LatestSnapshot {
    fn publish(&self, snapshot: &LiquiditySnapshot) -> Result<(), SinkError> {
        // send_replace succeeds even with no live receivers
        self.tx.send_replace(Some(snapshot.clone()));
        Ok(())
    }

    fn name(&self) -> &str {
        "latest_snapshot"
    }
}

// ============================================================================
// Event Bus Sink
// ============================================================================

/// Publishes snapshots on an EventBus, plus a label-change event on transitions
pub struct EventBusSink {
    bus: Arc<EventBus>,
    source: String,
    last_label: Mutex<Option<LiquidityLabel>>,
}

impl EventBusSink {
    pub fn new(bus: Arc<EventBus>, source: &str) -> Self {
        Self {
            bus,
            source: source.to_string(),
            last_label: Mutex::new(None),
        }
    }

    /// Sink on the process-wide bus
    pub fn global() -> Self {
        Self::new(get_event_bus(), "liquidity_compass")
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    fn snapshot_data(snapshot: &LiquiditySnapshot) -> Result<HashMap<String, serde_json::Value>, SinkError> {
        let value = serde_json::to_value(snapshot)?;
        Ok(serde_json::from_value(value)?)
    }
}

impl SnapshotSink for EventBusSink {
    fn publish(&self, snapshot: &LiquiditySnapshot) -> Result<(), SinkError> {
        let data = Self::snapshot_data(snapshot)?;
        self.bus.publish(Event::new(
            LIQUIDITY_SNAPSHOT.to_string(),
            snapshot.timestamp,
            data,
            self.source.clone(),
            EventPriority::Info,
        ));

        let previous = self.last_label.lock().replace(snapshot.label);
        if let Some(prev) = previous.filter(|prev| *prev != snapshot.label) {
            let mut data = HashMap::new();
            data.insert("instrument".to_string(), json!(snapshot.instrument));
            data.insert("prev_label".to_string(), json!(prev));
            data.insert("new_label".to_string(), json!(snapshot.label));
            data.insert("average".to_string(), json!(snapshot.average));

            self.bus.publish(Event::new(
                LIQUIDITY_LABEL_CHANGE.to_string(),
                snapshot.timestamp,
                data,
                self.source.clone(),
                EventPriority::High,
            ));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "event_bus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ColorToken;

    fn make_snapshot(label: LiquidityLabel, timestamp: i64) -> LiquiditySnapshot {
        LiquiditySnapshot {
            instrument: "ES".to_string(),
            timestamp,
            bid_total: 30.0,
            ask_total: 15.0,
            average: 7.5,
            label,
            color: label.color(),
        }
    }

    #[test]
    fn test_latest_snapshot_keeps_last() {
        let sink = LatestSnapshot::new();
        assert!(sink.latest().is_none());

        let mut rx = sink.subscribe();
        sink.publish(&make_snapshot(LiquidityLabel::Thin, 1)).unwrap();
        sink.publish(&make_snapshot(LiquidityLabel::Medium, 2)).unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone().unwrap();
        assert_eq!(seen.timestamp, 2);
        assert_eq!(seen.color, ColorToken::Amber);
        assert_eq!(sink.latest().unwrap().label, LiquidityLabel::Medium);
    }

    #[test]
    fn test_event_bus_sink_snapshot_and_label_change() {
        let bus = Arc::new(EventBus::new());
        let sink = EventBusSink::new(Arc::clone(&bus), "test");

        sink.publish(&make_snapshot(LiquidityLabel::Thin, 1)).unwrap();
        sink.publish(&make_snapshot(LiquidityLabel::Thin, 2)).unwrap();
        assert!(bus.get_recent_events(Some(LIQUIDITY_LABEL_CHANGE), None).is_empty());

        sink.publish(&make_snapshot(LiquidityLabel::Thick, 3)).unwrap();

        let snapshots = bus.get_recent_events(Some(LIQUIDITY_SNAPSHOT), None);
        assert_eq!(snapshots.len(), 3);
        assert_eq!(snapshots[0].data.get("label"), Some(&json!("THICK")));

        let changes = bus.get_recent_events(Some(LIQUIDITY_LABEL_CHANGE), None);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].data.get("prev_label"), Some(&json!("THIN")));
        assert_eq!(changes[0].data.get("new_label"), Some(&json!("THICK")));
        assert_eq!(changes[0].priority, EventPriority::High);
    }

    #[test]
    fn test_global_sink_uses_shared_bus() {
        let sink = EventBusSink::global();
        assert!(Arc::ptr_eq(sink.bus(), &get_event_bus()));
        assert_eq!(sink.name(), "event_bus");
    }
}
