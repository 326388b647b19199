use serde::Serialize;
use std::fmt;

/// Transport phase. There is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Playing,
    Paused,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Playing => "playing",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Snapshot of the transport.
///
/// `position_secs` is the resume offset while not playing. While playing,
/// elapsed time is `device clock - started_at_clock`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TransportState {
    pub phase: Phase,
    pub position_secs: f64,
    pub started_at_clock: f64,
}

impl TransportState {
    pub fn is_playing(&self) -> bool {
        self.phase == Phase::Playing
    }
}
