//! Playback transport: play/pause/resume/stop/seek over a built timeline.

pub mod controller;
pub mod driver;
pub mod state;
pub mod wake_lock;

pub use controller::Transport;
pub use driver::{SharedTransport, spawn_progress_loop};
pub use state::{Phase, TransportState};
pub use wake_lock::{InhibitWakeLock, NoopWakeLock, RecordingWakeLock, WakeEvent, WakeLock};
