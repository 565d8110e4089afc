// Overlay Text - chart overlay lines for a display host
// Holds the latest formatted text; the host reads it on its own redraw tick

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::config::CompassConfig;
use crate::core::types::{ColorToken, LiquiditySnapshot};

use super::sink::{SinkError, SnapshotSink};

/// Rounded, thousands-separated integer ("1234.6" -> "1,235")
pub fn format_whole(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    if negative && out != "0" {
        format!("-{}", out)
    } else {
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub headline: String,
    pub debug_line: Option<String>,
    pub color: ColorToken,
}

impl OverlayText {
    pub fn render(snapshot: &LiquiditySnapshot, instrument: &str, show_debug: bool) -> Self {
        let average = format_whole(snapshot.average);
        let headline = format!("DOM ({}): {} ({})", instrument, snapshot.label, average);

        let debug_line = show_debug.then(|| {
            format!(
                "[DEBUG] Bid: {} | Ask: {} | Avg: {}",
                format_whole(snapshot.bid_total),
                format_whole(snapshot.ask_total),
                average
            )
        });

        Self {
            headline,
            debug_line,
            color: snapshot.color,
        }
    }
}

impl fmt::Display for OverlayText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        if let Some(debug) = &self.debug_line {
            write!(f, "\n{}", debug)?;
        }
        Ok(())
    }
}

/// Overlay collaborator. Publishing before `attach` fails with `Detached`.
pub struct OverlaySink {
    instrument: String,
    show_debug: bool,
    attached: AtomicBool,
    latest: RwLock<Option<OverlayText>>,
}

impl OverlaySink {
    pub fn new(instrument: &str, show_debug: bool) -> Self {
        Self {
            instrument: instrument.to_string(),
            show_debug,
            attached: AtomicBool::new(false),
            latest: RwLock::new(None),
        }
    }

    pub fn from_config(config: &CompassConfig) -> Self {
        Self::new(&config.instrument, config.show_debug)
    }

    pub fn attach(&self) {
        self.attached.store(true, Ordering::Release);
    }

    /// Detach and drop the displayed text
    pub fn detach(&self) {
        self.attached.store(false, Ordering::Release);
        *self.latest.write() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub fn latest(&self) -> Option<OverlayText> {
        self.latest.read().clone()
    }
}

impl SnapshotSink for OverlaySink {
    fn publish(&self, snapshot: &LiquiditySnapshot) -> Result<(), SinkError> {
        if !self.is_attached() {
            return Err(SinkError::Detached);
        }

        let text = OverlayText::render(snapshot, &self.instrument, self.show_debug);
        *self.latest.write() = Some(text);
        Ok(())
    }

    fn name(&self) -> &str {
        "overlay"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::LiquidityLabel;

    fn make_snapshot(bid: f64, ask: f64, average: f64, label: LiquidityLabel) -> LiquiditySnapshot {
        LiquiditySnapshot {
            instrument: "ES 06-25".to_string(),
            timestamp: 0,
            bid_total: bid,
            ask_total: ask,
            average,
            label,
            color: label.color(),
        }
    }

    #[test]
    fn test_format_whole() {
        assert_eq!(format_whole(0.0), "0");
        assert_eq!(format_whole(7.5), "8");
        assert_eq!(format_whole(999.4), "999");
        assert_eq!(format_whole(1234.6), "1,235");
        assert_eq!(format_whole(1_000_000.0), "1,000,000");
        assert_eq!(format_whole(-0.2), "0");
        assert_eq!(format_whole(-12345.0), "-12,345");
    }

    #[test]
    fn test_render_with_debug() {
        let snapshot = make_snapshot(1250.0, 430.0, 84.0, LiquidityLabel::Thick);
        let text = OverlayText::render(&snapshot, "ES 06-25", true);

        assert_eq!(text.headline, "DOM (ES 06-25): THICK (84)");
        assert_eq!(text.debug_line.as_deref(), Some("[DEBUG] Bid: 1,250 | Ask: 430 | Avg: 84"));
        assert_eq!(text.color, ColorToken::Green);
        assert_eq!(text.to_string().lines().count(), 2);
    }

    #[test]
    fn test_render_without_debug() {
        let snapshot = make_snapshot(30.0, 15.0, 7.5, LiquidityLabel::Thin);
        let text = OverlayText::render(&snapshot, "ES 06-25", false);

        assert_eq!(text.headline, "DOM (ES 06-25): THIN (8)");
        assert!(text.debug_line.is_none());
    }

    #[test]
    fn test_sink_requires_attach() {
        let sink = OverlaySink::new("ES 06-25", false);
        let snapshot = make_snapshot(45.0, 15.0, 10.0, LiquidityLabel::Medium);

        assert!(matches!(sink.publish(&snapshot), Err(SinkError::Detached)));
        assert!(sink.latest().is_none());

        sink.attach();
        sink.publish(&snapshot).unwrap();
        assert_eq!(sink.latest().unwrap().headline, "DOM (ES 06-25): MEDIUM (10)");

        sink.detach();
        assert!(!sink.is_attached());
        assert!(sink.latest().is_none());
    }
}
