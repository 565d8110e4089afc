// Core Type Definitions for Liquidity Compass
// Depth events in, liquidity snapshots out

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[serde(alias = "Bid", alias = "BID")]
    Bid,
    #[serde(alias = "Ask", alias = "ASK")]
    Ask,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "BID"),
            Side::Ask => write!(f, "ASK"),
        }
    }
}

/// Operation carried by a depth update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthOperation {
    #[serde(alias = "Add", alias = "ADD")]
    Add,
    #[serde(alias = "Update", alias = "UPDATE")]
    Update,
    #[serde(alias = "Remove", alias = "REMOVE")]
    Remove,
}

impl DepthOperation {
    pub fn is_remove(&self) -> bool {
        matches!(self, DepthOperation::Remove)
    }
}

impl fmt::Display for DepthOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LiquidityLabel {
    Thin,
    Medium,
    Thick,
}

impl LiquidityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LiquidityLabel::Thin => "THIN",
            LiquidityLabel::Medium => "MEDIUM",
            LiquidityLabel::Thick => "THICK",
        }
    }

    /// Display color for this label
    pub fn color(&self) -> ColorToken {
        match self {
            LiquidityLabel::Thick => ColorToken::Green,
            LiquidityLabel::Medium => ColorToken::Amber,
            LiquidityLabel::Thin => ColorToken::Red,
        }
    }
}

impl fmt::Display for LiquidityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Amber,
    Red,
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl From<LiquidityLabel> for ColorToken {
    fn from(label: LiquidityLabel) -> Self {
        label.color()
    }
}

// ============================================================================
// Depth Event
// ============================================================================

/// One per-level update from the market-data feed.
///
/// `position` and `volume` are signed because the feed is not trusted to stay
/// in domain: negative positions are ignored and negative volumes are clamped
/// by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthEvent {
    pub instrument: String,
    pub side: Side,
    pub position: i64,
    pub operation: DepthOperation,
    pub volume: i64,
    /// Arrival time in milliseconds
    pub timestamp: i64,
}

impl DepthEvent {
    pub fn new(
        instrument: &str,
        side: Side,
        position: i64,
        operation: DepthOperation,
        volume: i64,
        timestamp: i64,
    ) -> Self {
        Self {
            instrument: instrument.to_string(),
            side,
            position,
            operation,
            volume,
            timestamp,
        }
    }

    /// Removal or zero volume both start the stale-clear window
    pub fn is_clear(&self) -> bool {
        self.operation.is_remove() || self.volume <= 0
    }
}

impl fmt::Display for DepthEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DepthEvent({} {} L{} {} vol={} t={})",
            self.instrument, self.side, self.position, self.operation, self.volume, self.timestamp
        )
    }
}

// ============================================================================
// Liquidity Snapshot
// ============================================================================

/// Published aggregates and classification, the only state a display reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquiditySnapshot {
    pub instrument: String,
    pub timestamp: i64,
    pub bid_total: f64,
    pub ask_total: f64,
    /// Average volume per level across both sides
    pub average: f64,
    pub label: LiquidityLabel,
    pub color: ColorToken,
}

impl fmt::Display for LiquiditySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LiquiditySnapshot({} bid={:.0} ask={:.0} avg={:.2} {})",
            self.instrument, self.bid_total, self.ask_total, self.average, self.label
        )
    }
}
