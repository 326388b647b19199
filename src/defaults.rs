//! Default configuration constants for stillwave.
//!
//! Shared by the config layer, the CLI and the library constructors so every
//! entry point agrees on the same values.

/// Default engine sample rate in Hz.
///
/// Matches the native output rate of the default speech endpoint, so speech
/// payloads decode without resampling.
pub const SAMPLE_RATE: u32 = 24000;

/// Default speech synthesis endpoint.
pub const SPEECH_ENDPOINT: &str = "https://api.openai.com/v1/audio/speech";

/// Default speech model.
pub const SPEECH_MODEL: &str = "tts-1";

/// Default voice.
pub const DEFAULT_VOICE: &str = "onyx";

/// Environment variable holding the speech API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Per-request timeout for the speech endpoint, in seconds.
pub const SPEECH_TIMEOUT_SECS: u64 = 60;

/// Speech requests allowed in flight at once. 1 means strictly sequential.
pub const MAX_CONCURRENT_REQUESTS: usize = 1;

/// Silence inserted between sentences of the same text block, in seconds.
pub const SENTENCE_GAP_SECS: f64 = 1.0;

/// Longest pause a script may request, in seconds (24 hours).
pub const MAX_PAUSE_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Transport polling cadence in milliseconds.
pub const PROGRESS_INTERVAL_MS: u64 = 100;

/// Build progress reserved for the work before speech synthesis starts.
///
/// Speech completion maps onto the remaining 80%.
pub const BUILD_PROGRESS_BASE: f64 = 20.0;

/// Length of the synthesized offline bell, in seconds.
pub const SYNTH_BELL_SECS: f64 = 2.5;
