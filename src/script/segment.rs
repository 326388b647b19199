use serde::Serialize;
use std::fmt;

/// One atomic unit of a parsed script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    /// Text to be spoken.
    Speech { text: String },
    /// Silence of the given length.
    Pause { duration_secs: f64 },
}

impl Segment {
    pub fn speech(text: impl Into<String>) -> Self {
        Segment::Speech { text: text.into() }
    }

    pub fn pause(duration_secs: f64) -> Self {
        Segment::Pause { duration_secs }
    }

    pub fn is_speech(&self) -> bool {
        matches!(self, Segment::Speech { .. })
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, Segment::Pause { .. })
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Speech { text } => write!(f, "speech: {}", text),
            Segment::Pause { duration_secs } => write!(f, "pause: {}s", duration_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_build_expected_variants() {
        assert_eq!(
            Segment::speech("Breathe in."),
            Segment::Speech {
                text: "Breathe in.".to_string()
            }
        );
        assert_eq!(Segment::pause(2.0), Segment::Pause { duration_secs: 2.0 });
        assert!(Segment::speech("x").is_speech());
        assert!(Segment::pause(1.0).is_pause());
    }

    #[test]
    fn display_is_human_readable() {
        assert_eq!(Segment::speech("Notice.").to_string(), "speech: Notice.");
        assert_eq!(Segment::pause(1.5).to_string(), "pause: 1.5s");
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&Segment::pause(2.0)).unwrap();
        assert_eq!(json, r#"{"type":"pause","duration_secs":2.0}"#);

        let json = serde_json::to_string(&Segment::speech("Rest.")).unwrap();
        assert_eq!(json, r#"{"type":"speech","text":"Rest."}"#);
    }
}
