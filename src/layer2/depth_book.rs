// Depth Book - fixed top-N level storage with debounced clears
// Removals are trusted only after the stale-clear window; expiry is evaluated lazily

use std::fmt;
use tracing::trace;

use crate::core::types::Side;

/// Lifecycle of one level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelState {
    /// Has a trusted volume
    Fresh,
    /// Clear recorded, volume still counted
    PendingClear,
    /// Window elapsed, counts as zero until the next add/update
    Expired,
}

impl fmt::Display for LevelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One price rung
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DepthLevel {
    pub volume: u64,
    pub cleared_at: Option<i64>,
}

impl DepthLevel {
    fn is_expired(&self, now: i64, window_ms: i64) -> bool {
        matches!(self.cleared_at, Some(cleared) if now.saturating_sub(cleared) > window_ms)
    }

    pub fn state(&self, now: i64, window_ms: i64) -> LevelState {
        match self.cleared_at {
            None => LevelState::Fresh,
            Some(_) if self.is_expired(now, window_ms) => LevelState::Expired,
            Some(_) => LevelState::PendingClear,
        }
    }
}

/// Ordered levels for one side, best price first
#[derive(Debug, Clone)]
pub struct BookSide {
    levels: Vec<DepthLevel>,
}

impl BookSide {
    pub fn new(depth_levels: usize) -> Self {
        Self {
            levels: vec![DepthLevel::default(); depth_levels],
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, position: usize) -> Option<&DepthLevel> {
        self.levels.get(position)
    }

    /// Store a trusted volume and drop any pending clear
    pub fn record_volume(&mut self, position: usize, volume: u64) -> bool {
        match self.levels.get_mut(position) {
            Some(level) => {
                level.volume = volume;
                level.cleared_at = None;
                true
            }
            None => false,
        }
    }

    /// Start (or restart) the stale-clear window, keeping the volume
    pub fn mark_cleared(&mut self, position: usize, timestamp: i64) -> bool {
        match self.levels.get_mut(position) {
            Some(level) => {
                level.cleared_at = Some(timestamp);
                true
            }
            None => false,
        }
    }

    /// Zero every expired level and return (sum, levels newly zeroed)
    pub fn expire_and_sum(&mut self, now: i64, window_ms: i64) -> (u64, usize) {
        let mut total = 0u64;
        let mut zeroed = 0usize;

        for level in self.levels.iter_mut() {
            if level.is_expired(now, window_ms) && level.volume != 0 {
                level.volume = 0;
                zeroed += 1;
            }
            total = total.saturating_add(level.volume);
        }

        (total, zeroed)
    }

    pub fn volumes(&self) -> Vec<u64> {
        self.levels.iter().map(|l| l.volume).collect()
    }

    pub fn reset(&mut self) {
        self.levels.iter_mut().for_each(|l| *l = DepthLevel::default());
    }
}

/// Per-side raw totals after expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideTotals {
    pub bid: u64,
    pub ask: u64,
    /// Levels zeroed by this pass
    pub expired: usize,
}

/// Bid and ask ladders sharing one stale-clear window
#[derive(Debug, Clone)]
pub struct DepthBook {
    bids: BookSide,
    asks: BookSide,
    stale_clear_window_ms: i64,
}

impl DepthBook {
    pub fn new(depth_levels: usize, stale_clear_window_ms: i64) -> Self {
        Self {
            bids: BookSide::new(depth_levels),
            asks: BookSide::new(depth_levels),
            stale_clear_window_ms,
        }
    }

    pub fn depth_levels(&self) -> usize {
        self.bids.len()
    }

    pub fn stale_clear_window_ms(&self) -> i64 {
        self.stale_clear_window_ms
    }

    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        }
    }

    /// Apply one update. Returns false when the position is outside the book.
    pub fn apply(&mut self, side: Side, position: usize, volume: u64, remove: bool, timestamp: i64) -> bool {
        let book_side = self.side_mut(side);
        let applied = if remove || volume == 0 {
            book_side.mark_cleared(position, timestamp)
        } else {
            book_side.record_volume(position, volume)
        };

        if !applied {
            trace!(side = %side, position, "Position outside tracked depth");
        }
        applied
    }

    /// Recompute both side sums from scratch at `now`
    pub fn totals(&mut self, now: i64) -> SideTotals {
        let window = self.stale_clear_window_ms;
        let (bid, bid_expired) = self.bids.expire_and_sum(now, window);
        let (ask, ask_expired) = self.asks.expire_and_sum(now, window);

        SideTotals {
            bid,
            ask,
            expired: bid_expired + ask_expired,
        }
    }

    pub fn level_state(&self, side: Side, position: usize, now: i64) -> Option<LevelState> {
        self.side(side)
            .level(position)
            .map(|level| level.state(now, self.stale_clear_window_ms))
    }

    pub fn reset(&mut self) {
        self.bids.reset();
        self.asks.reset();
    }
}
