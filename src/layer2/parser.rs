// Depth Record Parser - decodes feed records into DepthEvent
// One JSON object per record; instrument filtering is left to the aggregator

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::core::types::{DepthEvent, DepthOperation, Side};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Deserialize)]
struct RawDepthRecord {
    #[serde(alias = "symbol")]
    instrument: Option<String>,
    side: Option<Side>,
    #[serde(alias = "level")]
    position: Option<i64>,
    #[serde(alias = "op")]
    operation: Option<DepthOperation>,
    #[serde(default)]
    volume: i64,
    #[serde(alias = "time")]
    timestamp: Option<i64>,
}

/// Parser statistics
#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub messages_parsed: u64,
    pub parse_errors: u64,
    pub bid_count: u64,
    pub ask_count: u64,
    /// Removals and zero-volume records
    pub clear_count: u64,
}

impl ParserStats {
    pub fn error_rate(&self) -> f64 {
        let total = self.messages_parsed + self.parse_errors;
        if total > 0 {
            self.parse_errors as f64 / total as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Default)]
pub struct DepthEventParser {
    pub stats: ParserStats,
}

impl DepthEventParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, raw_json: &str) -> Result<DepthEvent, ParseError> {
        match Self::decode(raw_json) {
            Ok(event) => {
                self.stats.messages_parsed += 1;
                match event.side {
                    Side::Bid => self.stats.bid_count += 1,
                    Side::Ask => self.stats.ask_count += 1,
                }
                if event.is_clear() {
                    self.stats.clear_count += 1;
                }
                Ok(event)
            }
            Err(e) => {
                self.stats.parse_errors += 1;
                warn!(error = %e, "Failed to parse depth record");
                Err(e)
            }
        }
    }

    fn decode(raw_json: &str) -> Result<DepthEvent, ParseError> {
        let raw: RawDepthRecord = serde_json::from_str(raw_json)
            .map_err(|e| ParseError::InvalidJson(e.to_string()))?;

        Ok(DepthEvent {
            instrument: raw.instrument.ok_or(ParseError::MissingField("instrument"))?,
            side: raw.side.ok_or(ParseError::MissingField("side"))?,
            position: raw.position.ok_or(ParseError::MissingField("position"))?,
            operation: raw.operation.ok_or(ParseError::MissingField("operation"))?,
            volume: raw.volume,
            timestamp: raw.timestamp.ok_or(ParseError::MissingField("timestamp"))?,
        })
    }

    /// Parse newline-separated records, skipping blank and invalid lines
    pub fn parse_lines(&mut self, raw: &str) -> Vec<DepthEvent> {
        let errors_before = self.stats.parse_errors;
        let events: Vec<DepthEvent> = raw
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| self.parse(line).ok())
            .collect();

        let skipped = self.stats.parse_errors - errors_before;
        if skipped > 0 {
            warn!(
                skipped,
                parsed = events.len(),
                error_rate = self.stats.error_rate(),
                "Skipped invalid depth records"
            );
        }
        events
    }

    pub fn reset_stats(&mut self) {
        self.stats = ParserStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update() {
        let mut parser = DepthEventParser::new();
        let json = r#"{"instrument":"ES 06-25","side":"bid","position":1,"operation":"update","volume":25,"timestamp":1000}"#;

        let event = parser.parse(json).unwrap();
        assert_eq!(event.instrument, "ES 06-25");
        assert_eq!(event.side, Side::Bid);
        assert_eq!(event.position, 1);
        assert_eq!(event.operation, DepthOperation::Update);
        assert_eq!(event.volume, 25);
        assert_eq!(event.timestamp, 1000);
        assert_eq!(parser.stats.messages_parsed, 1);
        assert_eq!(parser.stats.bid_count, 1);
    }

    #[test]
    fn test_parse_remove_without_volume() {
        let mut parser = DepthEventParser::new();
        let json = r#"{"symbol":"ES","side":"Ask","level":0,"op":"Remove","time":5}"#;

        let event = parser.parse(json).unwrap();
        assert_eq!(event.side, Side::Ask);
        assert_eq!(event.volume, 0);
        assert!(event.is_clear());
        assert_eq!(parser.stats.clear_count, 1);

        let zero = r#"{"instrument":"ES","side":"bid","position":1,"operation":"update","volume":0,"timestamp":6}"#;
        parser.parse(zero).unwrap();
        assert_eq!(parser.stats.clear_count, 2);
    }

    #[test]
    fn test_missing_field() {
        let mut parser = DepthEventParser::new();
        let json = r#"{"instrument":"ES","side":"bid","operation":"add","volume":1,"timestamp":0}"#;

        match parser.parse(json) {
            Err(ParseError::MissingField(field)) => assert_eq!(field, "position"),
            other => panic!("expected missing field, got {:?}", other),
        }
        assert_eq!(parser.stats.parse_errors, 1);
    }

    #[test]
    fn test_invalid_json_and_unknown_side() {
        let mut parser = DepthEventParser::new();
        assert!(matches!(parser.parse("{not json"), Err(ParseError::InvalidJson(_))));

        let json = r#"{"instrument":"ES","side":"mid","position":0,"operation":"add","volume":1,"timestamp":0}"#;
        assert!(matches!(parser.parse(json), Err(ParseError::InvalidJson(_))));
        assert_eq!(parser.stats.parse_errors, 2);
        assert!((parser.stats.error_rate() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_lines() {
        let mut parser = DepthEventParser::new();
        let raw = concat!(
            r#"{"instrument":"ES","side":"bid","position":0,"operation":"add","volume":3,"timestamp":1}"#,
            "\n\n",
            "garbage\n",
            r#"{"instrument":"ES","side":"ask","position":0,"operation":"add","volume":4,"timestamp":2}"#,
        );

        let events = parser.parse_lines(raw);
        assert_eq!(events.len(), 2);
        assert_eq!(parser.stats.messages_parsed, 2);
        assert_eq!(parser.stats.parse_errors, 1);
        assert!((parser.stats.error_rate() - 1.0 / 3.0).abs() < 1e-9);

        parser.reset_stats();
        assert_eq!(parser.stats.messages_parsed, 0);
    }
}
