//! Keep-awake requests held while the transport is playing.

use crate::error::{Result, StillwaveError};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};

/// Collaborator asked to keep the machine awake during playback.
///
/// Calls arrive in step with transitions into and out of `Playing`.
/// Failures are reported to the caller, which logs them and carries on.
pub trait WakeLock: Send {
    fn enable(&mut self) -> Result<()>;
    fn disable(&mut self) -> Result<()>;
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopWakeLock;

impl WakeLock for NoopWakeLock {
    fn enable(&mut self) -> Result<()> {
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeEvent {
    Enabled,
    Disabled,
}

/// Records every call. Optionally fails them all.
#[derive(Debug, Clone, Default)]
pub struct RecordingWakeLock {
    events: Arc<Mutex<Vec<WakeEvent>>>,
    fail: bool,
}

impl RecordingWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<WakeEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: WakeEvent) -> Result<()> {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
        if self.fail {
            return Err(StillwaveError::Other("wake lock unavailable".to_string()));
        }
        Ok(())
    }
}

impl WakeLock for RecordingWakeLock {
    fn enable(&mut self) -> Result<()> {
        self.record(WakeEvent::Enabled)
    }

    fn disable(&mut self) -> Result<()> {
        self.record(WakeEvent::Disabled)
    }
}

/// Holds a `systemd-inhibit` child process for as long as the lock is on.
#[derive(Debug, Default)]
pub struct InhibitWakeLock {
    child: Option<Child>,
}

impl InhibitWakeLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.child.is_some()
    }
}

impl WakeLock for InhibitWakeLock {
    fn enable(&mut self) -> Result<()> {
        if self.child.is_some() {
            return Ok(());
        }
        let child = Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=stillwave",
                "--why=Meditation playing",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| StillwaveError::Other(format!("failed to run systemd-inhibit: {}", e)))?;
        tracing::debug!(pid = child.id(), "wake lock acquired");
        self.child = Some(child);
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        child
            .kill()
            .map_err(|e| StillwaveError::Other(format!("failed to release wake lock: {}", e)))?;
        if let Err(e) = child.wait() {
            tracing::debug!(error = %e, "failed to reap systemd-inhibit");
        }
        tracing::debug!("wake lock released");
        Ok(())
    }
}

impl Drop for InhibitWakeLock {
    fn drop(&mut self) {
        if let Err(e) = self.disable() {
            tracing::warn!(error = %e, "wake lock not released on drop");
        }
    }
}
