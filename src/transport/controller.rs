//! Transport state machine over one timeline.

use crate::audio::playback::PlaybackDevice;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::timeline::{Timeline, TimingMark};
use crate::transport::state::{Phase, TransportState};
use crate::transport::wake_lock::{NoopWakeLock, WakeLock};
use std::sync::Arc;

/// Drives a playback device through `Idle | Playing | Paused | Stopped`.
///
/// Elapsed time is measured against the device clock, never the wall clock.
/// Every transition either completes or leaves the state as it was: the
/// device is asked to start before any field is updated. The one exception
/// is a failed seek while playing, which may already have cost the old
/// stream; the transport then parks in `Paused` at the pre-seek position.
pub struct Transport {
    timeline: Arc<Timeline>,
    device: Box<dyn PlaybackDevice>,
    wake_lock: Box<dyn WakeLock>,
    sinks: Vec<Arc<dyn ProgressSink>>,
    state: TransportState,
}

impl Transport {
    pub fn new(timeline: Arc<Timeline>, device: Box<dyn PlaybackDevice>) -> Self {
        Self {
            timeline,
            device,
            wake_lock: Box::new(NoopWakeLock),
            sinks: Vec::new(),
            state: TransportState::default(),
        }
    }

    pub fn with_wake_lock(mut self, wake_lock: Box<dyn WakeLock>) -> Self {
        self.wake_lock = wake_lock;
        self
    }

    /// Subscribe to `(percentage, current mark)` reports.
    pub fn on_progress(&mut self, sink: Arc<dyn ProgressSink>) {
        self.sinks.push(sink);
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    fn total(&self) -> f64 {
        self.timeline.total_duration_secs()
    }

    fn raw_elapsed(&self) -> f64 {
        self.device.clock() - self.state.started_at_clock
    }

    /// Seconds into the timeline, clamped to `[0, total]`.
    pub fn elapsed_secs(&self) -> f64 {
        let elapsed = match self.state.phase {
            Phase::Playing => self.raw_elapsed(),
            _ => self.state.position_secs,
        };
        elapsed.clamp(0.0, self.total())
    }

    /// Progress through the timeline in `[0, 100]`.
    pub fn percentage(&self) -> f64 {
        let total = self.total();
        if total <= 0.0 {
            return 0.0;
        }
        (100.0 * self.elapsed_secs() / total).clamp(0.0, 100.0)
    }

    pub fn current_mark(&self) -> Option<&TimingMark> {
        self.timeline.mark_at(self.elapsed_secs())
    }

    /// Start playback. Resumes when paused; no-op while already playing.
    ///
    /// # Errors
    /// `StillwaveError::Device` if the device refuses to start. The state is
    /// left untouched.
    pub fn play(&mut self) -> Result<()> {
        match self.state.phase {
            Phase::Playing => Ok(()),
            Phase::Paused => self.resume(),
            Phase::Idle | Phase::Stopped => self.start_at(0.0),
        }
    }

    /// Stop the device and remember where playback was. No-op unless playing.
    pub fn pause(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        let position = self.elapsed_secs();
        self.device.stop();
        self.state.phase = Phase::Paused;
        self.state.position_secs = position;
        self.release_wake_lock();
        tracing::info!(position_secs = position, "paused");
    }

    /// Continue from the paused position. No-op unless paused.
    ///
    /// A position at the very end restarts from the beginning.
    ///
    /// # Errors
    /// `StillwaveError::Device` if the device refuses to start.
    pub fn resume(&mut self) -> Result<()> {
        if self.state.phase != Phase::Paused {
            return Ok(());
        }
        let position = if self.state.position_secs >= self.total() {
            0.0
        } else {
            self.state.position_secs
        };
        self.start_at(position)
    }

    /// Stop and rewind to the start. Valid from every phase.
    pub fn stop(&mut self) {
        let was_playing = self.state.phase == Phase::Playing;
        self.device.stop();
        self.state = TransportState {
            phase: Phase::Stopped,
            position_secs: 0.0,
            started_at_clock: 0.0,
        };
        if was_playing {
            self.release_wake_lock();
        }
        tracing::info!("stopped");
    }

    /// `Idle | Stopped` plays, `Paused` resumes, `Playing` pauses.
    ///
    /// # Errors
    /// `StillwaveError::Device` if starting the device fails.
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.state.phase {
            Phase::Idle | Phase::Stopped => self.play(),
            Phase::Paused => self.resume(),
            Phase::Playing => {
                self.pause();
                Ok(())
            }
        }
    }

    /// Move to `position_secs`, clamped to the timeline.
    ///
    /// While playing the device restarts at the new offset. Otherwise the
    /// transport parks in `Paused` there so `resume` continues from it.
    ///
    /// # Errors
    /// `StillwaveError::Device` if restarting the device fails.
    pub fn seek_to(&mut self, position_secs: f64) -> Result<()> {
        let target = position_secs.clamp(0.0, self.total());
        match self.state.phase {
            Phase::Playing => {
                let offset = self.timeline.samples_at(target);
                if let Err(e) = self.device.start(Arc::clone(self.timeline.buffer()), offset) {
                    let position = self.elapsed_secs();
                    self.device.stop();
                    self.state = TransportState {
                        phase: Phase::Paused,
                        position_secs: position,
                        started_at_clock: 0.0,
                    };
                    self.release_wake_lock();
                    tracing::warn!(error = %e, position_secs = position, "seek failed, paused");
                    return Err(e);
                }
                self.state.position_secs = target;
                self.state.started_at_clock = self.device.clock() - target;
            }
            Phase::Idle | Phase::Paused | Phase::Stopped => {
                self.state.phase = Phase::Paused;
                self.state.position_secs = target;
            }
        }
        tracing::info!(position_secs = target, phase = %self.state.phase, "seeked");
        Ok(())
    }

    /// Move by `delta_secs` relative to the current position.
    ///
    /// # Errors
    /// See [`Transport::seek_to`].
    pub fn seek_by(&mut self, delta_secs: f64) -> Result<()> {
        self.seek_to(self.elapsed_secs() + delta_secs)
    }

    /// Poll the device. Detects the natural end of the timeline and reports
    /// progress to subscribers. Call at the progress cadence.
    pub fn tick(&mut self) -> Phase {
        if self.state.phase != Phase::Playing {
            return self.state.phase;
        }

        let finished = self.device.take_finished();
        if finished || self.raw_elapsed() >= self.total() {
            self.device.stop();
            self.state = TransportState {
                phase: Phase::Stopped,
                position_secs: 0.0,
                started_at_clock: 0.0,
            };
            self.release_wake_lock();
            tracing::info!("timeline finished");
            self.emit(100.0, "Finished");
            return self.state.phase;
        }

        let percentage = self.percentage();
        let description = self
            .current_mark()
            .map(|m| m.kind.to_string())
            .unwrap_or_default();
        self.emit(percentage, &description);
        self.state.phase
    }

    fn start_at(&mut self, position_secs: f64) -> Result<()> {
        let offset = self.timeline.samples_at(position_secs);
        self.device
            .start(Arc::clone(self.timeline.buffer()), offset)?;

        self.state = TransportState {
            phase: Phase::Playing,
            position_secs,
            started_at_clock: self.device.clock() - position_secs,
        };
        if let Err(e) = self.wake_lock.enable() {
            tracing::warn!(error = %e, "could not keep the system awake");
        }
        tracing::info!(position_secs, "playing");
        Ok(())
    }

    fn release_wake_lock(&mut self) {
        if let Err(e) = self.wake_lock.disable() {
            tracing::warn!(error = %e, "could not release wake lock");
        }
    }

    fn emit(&self, percentage: f64, description: &str) {
        for sink in &self.sinks {
            sink.report(percentage, description);
        }
    }
}
