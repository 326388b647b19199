//! Script markup: speech text interleaved with `[PAUSE ...]` markers.

pub mod parser;
pub mod segment;

pub use parser::{ParserOptions, PauseGrammar, ScriptParser, parse, split_sentences};
pub use segment::Segment;
