//! stillwave - guided meditation timelines
//!
//! Parses a marked-up script, synthesizes each segment, assembles one
//! contiguous buffer between two bells and plays it back under a transport.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod asset;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod progress;
pub mod script;
pub mod session;
pub mod timeline;
pub mod transport;
pub mod tts;

// Composition root - needs everything
#[cfg(all(feature = "cpal-audio", feature = "openai", feature = "cli"))]
pub mod app;

// Collaborator seams
pub use asset::{AssetLoader, FileAssetLoader, StaticAssetLoader, SynthesizedBell};
pub use audio::{DecodedBuffer, PlaybackDevice};
pub use progress::ProgressSink;
pub use transport::WakeLock;
pub use tts::SpeechSynthesizer;

// Engine
pub use script::{ScriptParser, Segment};
pub use session::BuildSession;
pub use timeline::{MarkKind, SegmentSynthesizer, Timeline, TimelineBuilder, TimingMark};
pub use transport::{Phase, Transport, TransportState};

// Error handling
pub use error::{ErrorKind, Result, StillwaveError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_cargo_version() {
        let ver = version_string();
        assert!(
            ver.starts_with(env!("CARGO_PKG_VERSION")),
            "version_string should start with CARGO_PKG_VERSION, got: {}",
            ver
        );
    }
}
