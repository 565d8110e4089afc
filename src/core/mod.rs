// Core Module - Foundational types, config, logging, events

pub mod types;
pub mod config;
pub mod logger;
pub mod events;

pub use types::*;
pub use config::{
    CompassConfig, MonitoringConfig, ConfigManager, ConfigSummary, ConfigError,
    STALE_CLEAR_WINDOW_MS,
};
pub use logger::{setup_logging, setup_logging_from_config};
pub use events::{Event, EventPriority, EventBus, EventBusStatsSnapshot, get_event_bus};
