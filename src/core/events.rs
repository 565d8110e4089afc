// Event System for Liquidity Compass
// In-process pub/sub bus: direct callbacks, a broadcast channel and bounded history

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast;
use uuid::Uuid;

pub const LIQUIDITY_SNAPSHOT: &str = "liquidity_snapshot";
pub const LIQUIDITY_LABEL_CHANGE: &str = "liquidity_label_change";

const WILDCARD: &str = "*";

// ============================================================================
// Event
// ============================================================================

/// Lower value is more urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EventPriority {
    /// Label transitions
    High = 1,
    /// Per-event snapshots
    Info = 3,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub event_type: String,
    pub timestamp: i64,
    pub data: HashMap<String, serde_json::Value>,
    pub source: String,
    pub priority: EventPriority,
    pub event_id: String,
}

impl Event {
    pub fn new(
        event_type: String,
        timestamp: i64,
        data: HashMap<String, serde_json::Value>,
        source: String,
        priority: EventPriority,
    ) -> Self {
        Self {
            event_type,
            timestamp,
            data,
            source,
            priority,
            event_id: Uuid::new_v4().to_string(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} from {} ({:?})", self.event_type, self.timestamp, self.source, self.priority)
    }
}

// ============================================================================
// Event Bus
// ============================================================================

type EventCallback = Arc<dyn Fn(Event) + Send + Sync>;

/// Callbacks keyed by event type; `WILDCARD` receives everything
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    callbacks: RwLock<HashMap<String, Vec<EventCallback>>>,
    history: RwLock<VecDeque<Event>>,
    max_history: usize,
    published: AtomicU64,
    delivered: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024, 1024)
    }

    pub fn with_capacity(channel_capacity: usize, max_history: usize) -> Self {
        let (tx, _rx) = broadcast::channel(channel_capacity.max(1));

        Self {
            tx,
            callbacks: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::with_capacity(max_history)),
            max_history,
            published: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
        }
    }

    /// Register a callback for one event type, or "*" for all of them
    pub fn subscribe<F>(&self, event_type: &str, callback: F)
    where
        F: Fn(Event) + Send + Sync + 'static,
    {
        self.callbacks
            .write()
            .entry(event_type.to_string())
            .or_default()
            .push(Arc::new(callback));

        tracing::debug!(event_type = %event_type, "Subscribed to events");
    }

    pub fn publish(&self, event: Event) {
        self.published.fetch_add(1, Ordering::Relaxed);

        {
            let mut history = self.history.write();
            if history.len() >= self.max_history {
                history.pop_front();
            }
            if self.max_history > 0 {
                history.push_back(event.clone());
            }
        }

        // No receivers is not an error
        let _ = self.tx.send(event.clone());

        // Callbacks run outside the lock so they may subscribe
        let targets: Vec<EventCallback> = {
            let callbacks = self.callbacks.read();
            [event.event_type.as_str(), WILDCARD]
                .iter()
                .filter_map(|key| callbacks.get(*key))
                .flatten()
                .cloned()
                .collect()
        };

        for callback in &targets {
            callback(event.clone());
        }
        self.delivered.fetch_add(targets.len() as u64, Ordering::Relaxed);
    }

    /// Receiver for every published event
    pub fn subscribe_channel(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Most recent events first
    pub fn get_recent_events(&self, event_type: Option<&str>, limit: Option<usize>) -> Vec<Event> {
        self.history
            .read()
            .iter()
            .rev()
            .filter(|e| event_type.map_or(true, |et| e.event_type == et))
            .take(limit.unwrap_or(100))
            .cloned()
            .collect()
    }

    pub fn get_stats(&self) -> EventBusStatsSnapshot {
        let callbacks = self.callbacks.read();

        EventBusStatsSnapshot {
            total_published: self.published.load(Ordering::Relaxed),
            total_delivered: self.delivered.load(Ordering::Relaxed),
            subscriber_count: callbacks.values().map(Vec::len).sum(),
            history_size: self.history.read().len(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBusStatsSnapshot {
    pub total_published: u64,
    pub total_delivered: u64,
    pub subscriber_count: usize,
    pub history_size: usize,
}

// ============================================================================
// Global Event Bus
// ============================================================================

static GLOBAL_EVENT_BUS: OnceLock<Arc<EventBus>> = OnceLock::new();

/// Process-wide bus for hosts that do not inject their own
pub fn get_event_bus() -> Arc<EventBus> {
    Arc::clone(GLOBAL_EVENT_BUS.get_or_init(|| Arc::new(EventBus::new())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_event(event_type: &str, timestamp: i64) -> Event {
        Event::new(
            event_type.to_string(),
            timestamp,
            HashMap::new(),
            "test_source".to_string(),
            EventPriority::Info,
        )
    }

    #[test]
    fn test_event_priority() {
        assert!(EventPriority::High < EventPriority::Info);
    }

    #[test]
    fn test_event_creation() {
        let event = make_event("test", 123456789);
        assert_eq!(event.event_type, "test");
        assert_eq!(event.source, "test_source");
        assert!(!event.event_id.is_empty());
        assert_eq!(event.to_string(), "test@123456789 from test_source (Info)");
    }

    #[test]
    fn test_event_bus_subscribe_and_publish() {
        let bus = EventBus::new();

        let received = Arc::new(RwLock::new(0u32));
        let received_clone = Arc::clone(&received);
        bus.subscribe("test", move |_event| {
            *received_clone.write() += 1;
        });

        let everything = Arc::new(RwLock::new(0u32));
        let everything_clone = Arc::clone(&everything);
        bus.subscribe("*", move |_event| {
            *everything_clone.write() += 1;
        });

        bus.publish(make_event("test", 1));
        bus.publish(make_event("other", 2));

        assert_eq!(*received.read(), 1);
        assert_eq!(*everything.read(), 2);
        let stats = bus.get_stats();
        assert_eq!(stats.total_published, 2);
        assert_eq!(stats.total_delivered, 3);
        assert_eq!(stats.subscriber_count, 2);
    }

    #[test]
    fn test_event_history_bounded() {
        let bus = EventBus::with_capacity(16, 3);
        for i in 0..5 {
            bus.publish(make_event("hist", i));
        }

        let history = bus.get_recent_events(Some("hist"), None);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].timestamp, 4);
        assert_eq!(history[2].timestamp, 2);
        assert_eq!(bus.get_stats().history_size, 3);
    }

    #[test]
    fn test_broadcast_channel() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe_channel();
        bus.publish(make_event(LIQUIDITY_SNAPSHOT, 7));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event_type, LIQUIDITY_SNAPSHOT);
        assert_eq!(event.timestamp, 7);
    }
}
