// Layer 2 - Feed decoding and depth state
// Turns raw records into DepthEvents and keeps the per-level ladder

pub mod depth_book;
pub mod parser;

pub use depth_book::{DepthBook, BookSide, DepthLevel, LevelState, SideTotals};
pub use parser::{DepthEventParser, ParseError, ParserStats};
