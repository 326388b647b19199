//! Audio buffers, WAV codec and playback devices.

pub mod buffer;
#[cfg(feature = "cpal-audio")]
pub mod output;
pub mod playback;
pub mod wav;

pub use buffer::DecodedBuffer;
pub use playback::{ManualClock, MockPlaybackDevice, PlaybackDevice};
