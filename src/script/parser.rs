//! Tokenizes a marked-up script into an ordered list of segments.
//!
//! Pause markers come in two encodings depending on which script generator
//! produced the text: `[PAUSE 2]` / `[PAUSE 0.5]` (fractional minutes) and
//! `[PAUSE 01:30]` (minutes and seconds). Both are case-insensitive.

use crate::defaults;
use crate::error::{Result, StillwaveError};
use crate::script::segment::Segment;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// SAFETY: hardcoded pattern, always valid
#[allow(clippy::expect_used)]
static PAUSE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[PAUSE (\d+:\d{2}|\d+(?:\.\d+)?)\]").expect("hardcoded pause marker regex")
});

/// Which pause marker encoding the parser accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PauseGrammar {
    /// Accept both encodings.
    #[default]
    Auto,
    /// Only `[PAUSE <minutes>]`.
    Minutes,
    /// Only `[PAUSE MM:SS]`.
    MinutesSeconds,
}

impl PauseGrammar {
    fn name(self) -> &'static str {
        match self {
            PauseGrammar::Auto => "auto",
            PauseGrammar::Minutes => "minutes",
            PauseGrammar::MinutesSeconds => "minutes-seconds",
        }
    }
}

/// Parser behaviour knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserOptions {
    pub grammar: PauseGrammar,
    /// Split text blocks into one speech segment per sentence.
    pub split_sentences: bool,
    /// Silence inserted between sentences of the same block.
    pub sentence_gap_secs: f64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            grammar: PauseGrammar::Auto,
            split_sentences: true,
            sentence_gap_secs: defaults::SENTENCE_GAP_SECS,
        }
    }
}

/// Script parser with fixed options.
#[derive(Debug, Clone, Default)]
pub struct ScriptParser {
    options: ParserOptions,
}

impl ScriptParser {
    pub fn new(options: ParserOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Parse a script into segments in script order.
    ///
    /// Whitespace-only text between markers yields nothing, and pause markers
    /// after the last spoken text are dropped so a timeline never ends on
    /// silence.
    ///
    /// # Errors
    /// `StillwaveError::Parse` if the script is blank, or if a marker uses an
    /// encoding the configured grammar does not accept.
    pub fn parse(&self, script: &str) -> Result<Vec<Segment>> {
        if script.trim().is_empty() {
            return Err(StillwaveError::Parse {
                message: "script is empty".to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in PAUSE_MARKER.captures_iter(script) {
            let Some(marker) = caps.get(0) else {
                continue;
            };
            self.push_text(&script[cursor..marker.start()], &mut segments);
            segments.push(Segment::pause(self.marker_duration(&caps)?));
            cursor = marker.end();
        }
        self.push_text(&script[cursor..], &mut segments);

        let mut dropped = 0;
        while matches!(segments.last(), Some(Segment::Pause { .. })) {
            segments.pop();
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!(dropped, "dropped trailing pause markers");
        }

        tracing::debug!(
            segments = segments.len(),
            speech = segments.iter().filter(|s| s.is_speech()).count(),
            "parsed script"
        );
        Ok(segments)
    }

    fn push_text(&self, block: &str, segments: &mut Vec<Segment>) {
        let block = block.trim();
        if block.is_empty() {
            return;
        }

        if !self.options.split_sentences {
            segments.push(Segment::speech(block));
            return;
        }

        let sentences = split_sentences(block);
        let last = sentences.len().saturating_sub(1);
        for (i, sentence) in sentences.into_iter().enumerate() {
            segments.push(Segment::speech(sentence));
            if i < last {
                segments.push(Segment::pause(self.options.sentence_gap_secs));
            }
        }
    }

    fn marker_duration(&self, caps: &Captures<'_>) -> Result<f64> {
        let marker = caps.get(0).map_or("", |m| m.as_str());
        let value = caps.get(1).map_or("", |m| m.as_str());
        let is_clock = value.contains(':');

        let accepted = match self.options.grammar {
            PauseGrammar::Auto => true,
            PauseGrammar::Minutes => !is_clock,
            PauseGrammar::MinutesSeconds => is_clock,
        };
        if !accepted {
            return Err(StillwaveError::Parse {
                message: format!(
                    "pause marker {} does not match the '{}' grammar",
                    marker,
                    self.options.grammar.name()
                ),
            });
        }

        let invalid = || StillwaveError::Parse {
            message: format!("invalid pause marker {}", marker),
        };

        let secs = if let Some((minutes, seconds)) = value.split_once(':') {
            let minutes: f64 = minutes.parse().map_err(|_| invalid())?;
            let seconds: f64 = seconds.parse().map_err(|_| invalid())?;
            minutes * 60.0 + seconds
        } else {
            let minutes: f64 = value.parse().map_err(|_| invalid())?;
            minutes * 60.0
        };

        if !secs.is_finite() || secs > defaults::MAX_PAUSE_SECS {
            return Err(StillwaveError::Parse {
                message: format!(
                    "pause marker {} exceeds the {}s limit",
                    marker,
                    defaults::MAX_PAUSE_SECS
                ),
            });
        }
        Ok(secs)
    }
}

/// Parse with default options (both grammars, sentence splitting on).
pub fn parse(script: &str) -> Result<Vec<Segment>> {
    ScriptParser::default().parse(script)
}

/// Split text at `.`, `!` or `?` followed by whitespace.
///
/// Punctuation stays with its sentence; empty pieces are discarded.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?')
            && let Some(&(next_idx, next)) = chars.peek()
            && next.is_whitespace()
        {
            pieces.push(&text[start..next_idx]);
            start = next_idx;
        }
    }
    pieces.push(&text[start..]);

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_split() -> ScriptParser {
        ScriptParser::new(ParserOptions {
            split_sentences: false,
            ..ParserOptions::default()
        })
    }

    fn with_grammar(grammar: PauseGrammar) -> ScriptParser {
        ScriptParser::new(ParserOptions {
            grammar,
            ..ParserOptions::default()
        })
    }

    #[test]
    fn parses_minutes_seconds_marker() {
        let segments = parse("Breathe in.[PAUSE 00:02]Breathe out.").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::speech("Breathe in."),
                Segment::pause(2.0),
                Segment::speech("Breathe out."),
            ]
        );
    }

    #[test]
    fn parses_fractional_minutes_marker() {
        let segments = parse("Sit. [PAUSE 0.5] Stand. [PAUSE 2] Done.").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::speech("Sit."),
                Segment::pause(30.0),
                Segment::speech("Stand."),
                Segment::pause(120.0),
                Segment::speech("Done."),
            ]
        );
    }

    #[test]
    fn marker_is_case_insensitive() {
        let segments = parse("One.[pause 01:05]Two.").unwrap();
        assert_eq!(segments[1], Segment::pause(65.0));
    }

    #[test]
    fn k_markers_yield_k_pauses_in_order() {
        let script = "a [PAUSE 1] b [PAUSE 00:10] c [PAUSE 0.25] d";
        let segments = no_split().parse(script).unwrap();

        let pauses: Vec<f64> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Pause { duration_secs } => Some(*duration_secs),
                _ => None,
            })
            .collect();
        assert_eq!(pauses, vec![60.0, 10.0, 15.0]);

        let texts: Vec<&str> = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Speech { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn consecutive_markers_are_both_kept() {
        let segments = no_split().parse("a [PAUSE 1][PAUSE 2] b").unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::speech("a"),
                Segment::pause(60.0),
                Segment::pause(120.0),
                Segment::speech("b"),
            ]
        );
    }

    #[test]
    fn trailing_marker_is_dropped() {
        let segments = parse("Settle in. [PAUSE 3]   \n").unwrap();
        assert_eq!(segments, vec![Segment::speech("Settle in.")]);
    }

    #[test]
    fn all_trailing_markers_are_dropped() {
        let segments = parse("Settle in. [PAUSE 3] [PAUSE 00:30]").unwrap();
        assert_eq!(segments, vec![Segment::speech("Settle in.")]);
    }

    #[test]
    fn leading_marker_is_kept() {
        let segments = parse("[PAUSE 00:05] Begin.").unwrap();
        assert_eq!(segments, vec![Segment::pause(5.0), Segment::speech("Begin.")]);
    }

    #[test]
    fn whitespace_between_markers_produces_no_speech() {
        let segments = parse("a [PAUSE 00:01]  \n\t [PAUSE 00:02] b").unwrap();
        assert_eq!(segments.iter().filter(|s| s.is_speech()).count(), 2);
    }

    #[test]
    fn empty_script_fails() {
        assert!(matches!(parse(""), Err(StillwaveError::Parse { .. })));
        assert!(matches!(parse("  \n\t "), Err(StillwaveError::Parse { .. })));
    }

    #[test]
    fn marker_only_script_yields_no_segments() {
        assert!(parse("[PAUSE 1]").unwrap().is_empty());
    }

    #[test]
    fn splits_sentences_with_gap_pauses() {
        let segments =
            parse("Notice the breath. Feel the body! Where is attention? [PAUSE 00:30] Rest.")
                .unwrap();
        assert_eq!(
            segments,
            vec![
                Segment::speech("Notice the breath."),
                Segment::pause(1.0),
                Segment::speech("Feel the body!"),
                Segment::pause(1.0),
                Segment::speech("Where is attention?"),
                Segment::pause(30.0),
                Segment::speech("Rest."),
            ]
        );
    }

    #[test]
    fn custom_sentence_gap() {
        let parser = ScriptParser::new(ParserOptions {
            sentence_gap_secs: 2.5,
            ..ParserOptions::default()
        });
        let segments = parser.parse("One. Two.").unwrap();
        assert_eq!(segments[1], Segment::pause(2.5));
    }

    #[test]
    fn no_split_keeps_block_whole() {
        let segments = no_split().parse("One. Two. Three.").unwrap();
        assert_eq!(segments, vec![Segment::speech("One. Two. Three.")]);
    }

    #[test]
    fn minutes_grammar_rejects_clock_marker() {
        let err = with_grammar(PauseGrammar::Minutes)
            .parse("a [PAUSE 00:02] b")
            .unwrap_err();
        assert!(err.to_string().contains("[PAUSE 00:02]"));
    }

    #[test]
    fn minutes_seconds_grammar_rejects_minutes_marker() {
        let result = with_grammar(PauseGrammar::MinutesSeconds).parse("a [PAUSE 2] b");
        assert!(matches!(result, Err(StillwaveError::Parse { .. })));
    }

    #[test]
    fn strict_grammar_accepts_its_own_marker() {
        let segments = with_grammar(PauseGrammar::MinutesSeconds)
            .parse("a [PAUSE 01:00] b")
            .unwrap();
        assert_eq!(segments[1], Segment::pause(60.0));
    }

    #[test]
    fn oversized_pause_is_rejected() {
        let err = parse("Rest. [PAUSE 999999999999999] Wake.").unwrap_err();
        assert!(matches!(err, StillwaveError::Parse { .. }));
        assert!(err.to_string().contains("limit"));

        let err = parse("Rest. [PAUSE 1441] Wake.").unwrap_err();
        assert!(matches!(err, StillwaveError::Parse { .. }));
    }

    #[test]
    fn day_long_pause_is_accepted() {
        let segments = parse("Rest. [PAUSE 1440] Wake.").unwrap();
        assert_eq!(segments[1], Segment::pause(defaults::MAX_PAUSE_SECS));
    }

    #[test]
    fn malformed_marker_stays_text() {
        let segments = no_split().parse("a [PAUSE soon] b").unwrap();
        assert_eq!(segments, vec![Segment::speech("a [PAUSE soon] b")]);
    }

    #[test]
    fn split_sentences_keeps_punctuation() {
        assert_eq!(
            split_sentences("One. Two!  Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
    }

    #[test]
    fn split_sentences_ignores_inner_dots() {
        assert_eq!(split_sentences("Version 1.5 is here."), vec!["Version 1.5 is here."]);
    }

    #[test]
    fn split_sentences_handles_blank() {
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn grammar_deserializes_kebab_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            grammar: PauseGrammar,
        }
        let w: Wrapper = toml::from_str(r#"grammar = "minutes-seconds""#).unwrap();
        assert_eq!(w.grammar, PauseGrammar::MinutesSeconds);
    }
}
