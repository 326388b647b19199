use crate::audio::buffer::DecodedBuffer;
use crate::script::Segment;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// What starts at a timing mark.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarkKind {
    Bell,
    Speech { text: String },
    Pause { duration_secs: f64 },
}

impl From<&Segment> for MarkKind {
    fn from(segment: &Segment) -> Self {
        match segment {
            Segment::Speech { text } => MarkKind::Speech { text: text.clone() },
            Segment::Pause { duration_secs } => MarkKind::Pause {
                duration_secs: *duration_secs,
            },
        }
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkKind::Bell => f.write_str("Bell"),
            MarkKind::Speech { text } => f.write_str(text),
            MarkKind::Pause { duration_secs } => write!(f, "Pause ({}s)", duration_secs),
        }
    }
}

/// Where one segment starts in the assembled buffer.
///
/// Sample positions are authoritative; the second values are derived from
/// them, so `marks[i].end_secs == marks[i + 1].offset_secs` holds exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingMark {
    pub offset_secs: f64,
    pub duration_secs: f64,
    pub end_secs: f64,
    pub offset_samples: usize,
    pub length_samples: usize,
    pub kind: MarkKind,
}

/// A fully assembled, immutable playable buffer with its timing marks.
#[derive(Debug, Clone)]
pub struct Timeline {
    buffer: Arc<DecodedBuffer>,
    total_duration_secs: f64,
    marks: Vec<TimingMark>,
}

impl Timeline {
    pub(crate) fn new(buffer: DecodedBuffer, marks: Vec<TimingMark>) -> Self {
        let total_duration_secs = buffer.duration_secs();
        Self {
            buffer: Arc::new(buffer),
            total_duration_secs,
            marks,
        }
    }

    pub fn buffer(&self) -> &Arc<DecodedBuffer> {
        &self.buffer
    }

    pub fn total_duration_secs(&self) -> f64 {
        self.total_duration_secs
    }

    pub fn marks(&self) -> &[TimingMark] {
        &self.marks
    }

    pub fn sample_rate(&self) -> u32 {
        self.buffer.sample_rate()
    }

    /// Mark covering `position_secs`. Positions past the end map to the last mark.
    pub fn mark_at(&self, position_secs: f64) -> Option<&TimingMark> {
        let idx = self
            .marks
            .partition_point(|m| m.offset_secs <= position_secs);
        self.marks.get(idx.saturating_sub(1))
    }

    /// Sample offset for `position_secs`, clamped to the buffer.
    pub fn samples_at(&self, position_secs: f64) -> usize {
        crate::audio::buffer::samples_for(self.sample_rate(), position_secs).min(self.buffer.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_kind_from_segment() {
        assert_eq!(
            MarkKind::from(&Segment::speech("Rest.")),
            MarkKind::Speech {
                text: "Rest.".to_string()
            }
        );
        assert_eq!(
            MarkKind::from(&Segment::pause(2.0)),
            MarkKind::Pause { duration_secs: 2.0 }
        );
    }

    #[test]
    fn mark_kind_display() {
        assert_eq!(MarkKind::Bell.to_string(), "Bell");
        assert_eq!(
            MarkKind::Speech {
                text: "Breathe in.".to_string()
            }
            .to_string(),
            "Breathe in."
        );
        assert_eq!(MarkKind::Pause { duration_secs: 2.0 }.to_string(), "Pause (2s)");
    }
}
