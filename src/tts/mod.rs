//! Text-to-speech backends.

#[cfg(feature = "openai")]
pub mod openai;
pub mod speaker;
pub mod voice;

pub use speaker::{MockSpeechSynthesizer, SpeechSynthesizer};
