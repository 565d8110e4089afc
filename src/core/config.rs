// Configuration Management for Liquidity Compass
// JSON file + environment overrides, validated before an aggregator is built

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

/// A removed or zeroed level keeps counting for this long
pub const STALE_CLEAR_WINDOW_MS: i64 = 200;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassConfig {
    /// Subject instrument, e.g. "ES 06-25". Only the root symbol is matched.
    pub instrument: String,
    pub depth_levels: usize,
    pub thin_threshold: u32,
    pub thick_threshold: u32,

    // Display toggles, no effect on the aggregates
    pub show_debug: bool,
    pub enable_logging: bool,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            instrument: "ES 06-25".to_string(),
            depth_levels: 10,
            thin_threshold: 40,
            thick_threshold: 80,
            show_debug: true,
            enable_logging: false,
        }
    }
}

impl CompassConfig {
    /// Root symbol of the configured instrument ("ES 06-25" -> "ES")
    pub fn instrument_root(&self) -> &str {
        instrument_root(&self.instrument)
    }

    pub fn stale_clear_window_ms(&self) -> i64 {
        STALE_CLEAR_WINDOW_MS
    }

    /// Collect every problem instead of stopping at the first one
    pub fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.instrument_root().is_empty() {
            errors.push("instrument must not be empty".to_string());
        }
        if self.depth_levels == 0 {
            errors.push("depth_levels must be at least 1".to_string());
        }
        if self.thin_threshold == 0 {
            errors.push("thin_threshold must be at least 1".to_string());
        }
        if self.thick_threshold == 0 {
            errors.push("thick_threshold must be at least 1".to_string());
        }
        if self.thin_threshold >= self.thick_threshold {
            errors.push(format!(
                "thin_threshold ({}) must be below thick_threshold ({})",
                self.thin_threshold, self.thick_threshold
            ));
        }

        errors
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = self.validation_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }
}

/// Text before the first whitespace, trimmed
pub fn instrument_root(instrument: &str) -> &str {
    instrument.split_whitespace().next().unwrap_or("")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_format: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_format: false,
        }
    }
}

// ============================================================================
// Configuration Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub instrument: String,
    pub depth_levels: usize,
    pub thin_threshold: u32,
    pub thick_threshold: u32,
    pub stale_clear_window_ms: i64,
    pub log_level: String,
}

// ============================================================================
// Configuration Manager
// ============================================================================

pub struct ConfigManager {
    compass: Arc<RwLock<CompassConfig>>,
    monitoring: Arc<RwLock<MonitoringConfig>>,
}

impl ConfigManager {
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut manager = Self {
            compass: Arc::new(RwLock::new(CompassConfig::default())),
            monitoring: Arc::new(RwLock::new(MonitoringConfig::default())),
        };

        if let Some(path) = config_path {
            manager.load_from_file(path)?;
        }

        manager.load_from_env();

        info!("Configuration initialized");
        Ok(manager)
    }

    /// Load configuration from JSON file. A missing file keeps the defaults.
    pub fn load_from_file(&mut self, config_path: &str) -> Result<(), ConfigError> {
        let path = Path::new(config_path);
        if !path.exists() {
            warn!(path = config_path, "Config file not found");
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        let config_data: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;

        if let Some(compass_data) = config_data.get("compass") {
            let compass = serde_json::from_value::<CompassConfig>(compass_data.clone())?;
            *self.compass.write() = compass;
        }

        if let Some(monitoring_data) = config_data.get("monitoring") {
            let monitoring = serde_json::from_value::<MonitoringConfig>(monitoring_data.clone())?;
            *self.monitoring.write() = monitoring;
        }

        info!(path = config_path, "Configuration loaded");
        Ok(())
    }

    /// Environment overrides. Unparseable values are reported and skipped.
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut compass = self.compass.write();

        if let Some(instrument) = lookup("COMPASS_INSTRUMENT") {
            compass.instrument = instrument;
        }
        if let Some(raw) = lookup("COMPASS_DEPTH_LEVELS") {
            match raw.trim().parse() {
                Ok(v) => compass.depth_levels = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid COMPASS_DEPTH_LEVELS"),
            }
        }
        if let Some(raw) = lookup("COMPASS_THIN_THRESHOLD") {
            match raw.trim().parse() {
                Ok(v) => compass.thin_threshold = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid COMPASS_THIN_THRESHOLD"),
            }
        }
        if let Some(raw) = lookup("COMPASS_THICK_THRESHOLD") {
            match raw.trim().parse() {
                Ok(v) => compass.thick_threshold = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid COMPASS_THICK_THRESHOLD"),
            }
        }
        if let Some(raw) = lookup("COMPASS_SHOW_DEBUG") {
            compass.show_debug = raw.to_lowercase() == "true";
        }
        if let Some(raw) = lookup("COMPASS_ENABLE_LOGGING") {
            compass.enable_logging = raw.to_lowercase() == "true";
        }
        drop(compass);

        if let Some(level) = lookup("COMPASS_LOG_LEVEL") {
            self.monitoring.write().log_level = level;
        }
    }

    /// Save configuration to JSON file
    pub fn save_to_file(&self, config_path: &str) -> Result<(), ConfigError> {
        let mut config_map = HashMap::new();
        config_map.insert("compass", serde_json::to_value(&*self.compass.read())?);
        config_map.insert("monitoring", serde_json::to_value(&*self.monitoring.read())?);

        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&config_map)?;
        fs::write(config_path, json)?;

        info!(path = config_path, "Configuration saved");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<bool, ConfigError> {
        let errors = self.compass.read().validation_errors();

        if !errors.is_empty() {
            for error in &errors {
                warn!(error = %error, "Config validation error");
            }
            return Ok(false);
        }

        info!("Configuration validated successfully");
        Ok(true)
    }

    pub fn get_summary(&self) -> ConfigSummary {
        let compass = self.compass.read();
        let monitoring = self.monitoring.read();

        ConfigSummary {
            instrument: compass.instrument.clone(),
            depth_levels: compass.depth_levels,
            thin_threshold: compass.thin_threshold,
            thick_threshold: compass.thick_threshold,
            stale_clear_window_ms: compass.stale_clear_window_ms(),
            log_level: monitoring.log_level.clone(),
        }
    }

    pub fn compass(&self) -> CompassConfig {
        self.compass.read().clone()
    }

    pub fn monitoring(&self) -> MonitoringConfig {
        self.monitoring.read().clone()
    }
}
