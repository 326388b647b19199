use crate::audio::buffer::DecodedBuffer;
use crate::error::{Result, StillwaveError};
use std::sync::{Arc, Mutex};

/// Trait for audio output devices.
///
/// This trait allows swapping implementations (real output device vs mock).
/// The device owns the clock the transport measures elapsed time against,
/// so position tracking follows the samples actually rendered rather than
/// wall-clock time.
pub trait PlaybackDevice: Send {
    /// Begin emitting `buffer` from `offset` samples in.
    ///
    /// Any playback already in progress is replaced.
    fn start(&mut self, buffer: Arc<DecodedBuffer>, offset: usize) -> Result<()>;

    /// Stop emitting samples immediately. Idempotent.
    fn stop(&mut self);

    /// Device clock in seconds. Monotonic, advances only while rendering.
    fn clock(&self) -> f64;

    /// True once after the buffer has been played to its end.
    ///
    /// Consumes the notification.
    fn take_finished(&mut self) -> bool;
}

impl<T: PlaybackDevice + ?Sized> PlaybackDevice for Box<T> {
    fn start(&mut self, buffer: Arc<DecodedBuffer>, offset: usize) -> Result<()> {
        (**self).start(buffer, offset)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn clock(&self) -> f64 {
        (**self).clock()
    }

    fn take_finished(&mut self) -> bool {
        (**self).take_finished()
    }
}

/// Hand-driven clock shared between a test and a mock device.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now.lock().map(|t| *t).unwrap_or(0.0)
    }

    pub fn advance(&self, secs: f64) {
        if let Ok(mut now) = self.now.lock() {
            *now += secs;
        }
    }

    pub fn set(&self, secs: f64) {
        if let Ok(mut now) = self.now.lock() {
            *now = secs;
        }
    }
}

/// One `start` call seen by the mock device.
#[derive(Debug, Clone, PartialEq)]
pub struct StartCall {
    pub offset: usize,
    pub clock: f64,
}

/// Mock playback device for testing
#[derive(Debug, Clone, Default)]
pub struct MockPlaybackDevice {
    clock: ManualClock,
    starts: Arc<Mutex<Vec<StartCall>>>,
    playing: Arc<Mutex<bool>>,
    finished: Arc<Mutex<bool>>,
    fail_start: Arc<Mutex<bool>>,
    stop_on_failed_start: bool,
}

impl MockPlaybackDevice {
    /// Create a new mock device with its own clock
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an externally driven clock
    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = clock;
        self
    }

    /// Configure the mock to reject every start
    pub fn with_start_failure(self) -> Self {
        if let Ok(mut fail) = self.fail_start.lock() {
            *fail = true;
        }
        self
    }

    /// Tear down current playback before a failing start, the way a device
    /// that drops its old stream before building the new one behaves
    pub fn with_stop_on_failed_start(mut self) -> Self {
        self.stop_on_failed_start = true;
        self
    }

    /// Handle for switching start failures on or off after the device was moved
    pub fn start_failure_handle(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.fail_start)
    }

    /// Handle for simulating the "playback ended" notification
    pub fn finish_handle(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.finished)
    }

    /// Handle for inspecting start calls after the device was moved
    pub fn starts_handle(&self) -> Arc<Mutex<Vec<StartCall>>> {
        Arc::clone(&self.starts)
    }

    /// Handle reporting whether the device is currently emitting
    pub fn playing_handle(&self) -> Arc<Mutex<bool>> {
        Arc::clone(&self.playing)
    }
}

impl PlaybackDevice for MockPlaybackDevice {
    fn start(&mut self, _buffer: Arc<DecodedBuffer>, offset: usize) -> Result<()> {
        if self.fail_start.lock().map(|f| *f).unwrap_or(false) {
            if self.stop_on_failed_start {
                self.stop();
            }
            return Err(StillwaveError::Device {
                message: "mock device refused to start".to_string(),
            });
        }
        if let Ok(mut starts) = self.starts.lock() {
            starts.push(StartCall {
                offset,
                clock: self.clock.now(),
            });
        }
        if let Ok(mut playing) = self.playing.lock() {
            *playing = true;
        }
        Ok(())
    }

    fn stop(&mut self) {
        if let Ok(mut playing) = self.playing.lock() {
            *playing = false;
        }
    }

    fn clock(&self) -> f64 {
        self.clock.now()
    }

    fn take_finished(&mut self) -> bool {
        self.finished
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or(false)
    }
}
