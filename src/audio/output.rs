//! Real audio output using CPAL (Cross-Platform Audio Library).

use crate::audio::buffer::DecodedBuffer;
use crate::audio::playback::PlaybackDevice;
use crate::error::{Result, StillwaveError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Run a closure with stderr temporarily redirected to /dev/null.
///
/// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
/// when probing audio backends.
///
/// # Safety
/// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2 (stderr).
/// Safe as long as no other thread is concurrently manipulating fd 2.
fn with_suppressed_stderr<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    // SAFETY: Safe as long as no other thread is concurrently manipulating fd 2.
    unsafe {
        let saved_fd = libc::dup(2);
        let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
        if saved_fd >= 0 && devnull >= 0 {
            libc::dup2(devnull, 2);
            libc::close(devnull);
        }

        let result = f();

        if saved_fd >= 0 {
            libc::dup2(saved_fd, 2);
            libc::close(saved_fd);
        }

        result
    }
}

/// List the names of all available output devices.
///
/// # Errors
/// Returns `StillwaveError::Device` if device enumeration fails.
pub fn list_output_devices() -> Result<Vec<String>> {
    let (host, devices) = with_suppressed_stderr(|| {
        let host = cpal::default_host();
        let devices = host.output_devices();
        (host, devices)
    });
    let _host = host;
    let devices = devices.map_err(|e| StillwaveError::Device {
        message: format!("Failed to enumerate output devices: {}", e),
    })?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Wrapper for cpal::Stream to make it Send.
///
/// SAFETY: The stream is only touched by the owning `CpalPlaybackDevice`,
/// which the transport drives from one task at a time behind its mutex.
struct SendableStream(cpal::Stream);

unsafe impl Send for SendableStream {}

/// Playback device backed by a CPAL output stream.
///
/// The clock counts frames handed to the audio callback, so it follows the
/// device rather than the wall clock and stands still while stopped.
pub struct CpalPlaybackDevice {
    device: cpal::Device,
    stream: Option<SendableStream>,
    frames: Arc<AtomicU64>,
    clock_base: f64,
    rate: u32,
    finished_tx: Sender<()>,
    finished_rx: Receiver<()>,
}

impl CpalPlaybackDevice {
    /// Open an output device by name, or the system default.
    ///
    /// # Errors
    /// Returns `StillwaveError::Device` if no matching device exists.
    pub fn new(device_name: Option<&str>) -> Result<Self> {
        let device = with_suppressed_stderr(|| {
            let host = cpal::default_host();

            if let Some(name) = device_name {
                let devices = host.output_devices().map_err(|e| StillwaveError::Device {
                    message: format!("Failed to enumerate devices: {}", e),
                })?;

                for dev in devices {
                    if let Ok(dev_name) = dev.name()
                        && dev_name == name
                    {
                        return Ok(dev);
                    }
                }
                Err(StillwaveError::Device {
                    message: format!("output device not found: {}", name),
                })
            } else {
                host.default_output_device()
                    .ok_or_else(|| StillwaveError::Device {
                        message: "no default output device".to_string(),
                    })
            }
        })?;

        if let Ok(name) = device.name() {
            tracing::info!(device = %name, "opened output device");
        }

        let (finished_tx, finished_rx) = crossbeam_channel::bounded(1);
        Ok(Self {
            device,
            stream: None,
            frames: Arc::new(AtomicU64::new(0)),
            clock_base: 0.0,
            rate: 0,
            finished_tx,
            finished_rx,
        })
    }

    /// Build a stream rendering `buffer` from `offset` with `channels` outputs.
    fn build_stream(
        &self,
        buffer: &Arc<DecodedBuffer>,
        offset: usize,
        channels: u16,
    ) -> std::result::Result<cpal::Stream, cpal::BuildStreamError> {
        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(buffer.sample_rate()),
            buffer_size: cpal::BufferSize::Default,
        };

        let buffer = Arc::clone(buffer);
        let frames = Arc::clone(&self.frames);
        let finished_tx = self.finished_tx.clone();
        let out_channels = channels as usize;
        let mut position = offset;
        let mut signalled = false;

        self.device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let copied = buffer.write_interleaved(position, data, out_channels);
                position += copied;
                frames.fetch_add(copied as u64, Ordering::Relaxed);

                if !signalled && copied * out_channels < data.len() {
                    signalled = true;
                    if finished_tx.try_send(()).is_err() {
                        // A previous notification is still pending
                    }
                }
            },
            |err| tracing::error!("Audio output stream error: {}", err),
            None,
        )
    }
}

impl PlaybackDevice for CpalPlaybackDevice {
    fn start(&mut self, buffer: Arc<DecodedBuffer>, offset: usize) -> Result<()> {
        self.stop();
        while self.finished_rx.try_recv().is_ok() {}

        // Rebase the clock before the callback can render anything
        self.clock_base = self.clock();
        self.frames.store(0, Ordering::Relaxed);
        self.rate = buffer.sample_rate();

        let native = buffer.channel_count().clamp(1, u16::MAX as usize) as u16;
        let stream = match self.build_stream(&buffer, offset, native) {
            Ok(stream) => stream,
            Err(first) => {
                tracing::debug!(
                    channels = native,
                    "output config rejected ({}), retrying as stereo",
                    first
                );
                self.build_stream(&buffer, offset, 2)
                    .map_err(|e| StillwaveError::Device {
                        message: format!("Failed to build output stream: {}", e),
                    })?
            }
        };

        stream.play().map_err(|e| StillwaveError::Device {
            message: format!("Failed to start output stream: {}", e),
        })?;

        self.stream = Some(SendableStream(stream));
        tracing::debug!(offset, rate = self.rate, "output stream started");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(SendableStream(stream)) = self.stream.take() {
            if let Err(e) = stream.pause() {
                tracing::debug!("Failed to pause output stream: {}", e);
            }
            drop(stream);
        }
    }

    fn clock(&self) -> f64 {
        if self.rate == 0 {
            return self.clock_base;
        }
        self.clock_base + self.frames.load(Ordering::Relaxed) as f64 / self.rate as f64
    }

    fn take_finished(&mut self) -> bool {
        self.finished_rx.try_recv().is_ok()
    }
}
