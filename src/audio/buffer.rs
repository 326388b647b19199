//! Decoded multi-channel sample buffers.

use crate::error::{Result, StillwaveError};

/// Immutable planar f32 audio.
///
/// Every channel holds the same number of samples. Buffers are shared behind
/// `Arc` once decoded and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl DecodedBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// # Errors
    /// `StillwaveError::Decode` if there are no channels, the sample rate is
    /// zero, or the channels differ in length.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(StillwaveError::Decode {
                message: "sample rate must be positive".to_string(),
            });
        }
        let Some(first) = channels.first() else {
            return Err(StillwaveError::Decode {
                message: "buffer has no channels".to_string(),
            });
        };
        let len = first.len();
        if let Some(bad) = channels.iter().position(|c| c.len() != len) {
            return Err(StillwaveError::Decode {
                message: format!(
                    "channel {} has {} samples, expected {}",
                    bad,
                    channels[bad].len(),
                    len
                ),
            });
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Mono buffer from a single channel of samples.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    /// Deinterleave `L R L R ...` data into a planar buffer.
    ///
    /// A trailing partial frame is discarded.
    pub fn from_interleaved(sample_rate: u32, channel_count: usize, data: &[f32]) -> Result<Self> {
        if channel_count == 0 {
            return Err(StillwaveError::Decode {
                message: "channel count must be at least 1".to_string(),
            });
        }
        let frames = data.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in data.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    /// All-zero buffer of `length` samples per channel.
    pub fn silence(sample_rate: u32, channel_count: usize, length: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; length]; channel_count.max(1)])
    }

    /// Mono silence lasting `duration_secs`, rounded to the nearest sample.
    ///
    /// Negative or non-finite durations yield an empty buffer.
    pub fn silence_for(sample_rate: u32, duration_secs: f64) -> Result<Self> {
        Self::silence(sample_rate, 1, samples_for(sample_rate, duration_secs))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Length in samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds (`len / sample_rate`).
    pub fn duration_secs(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Write interleaved frames starting at `frame` into `out`.
    ///
    /// `out` is laid out with `out_channels` samples per frame. Missing source
    /// channels repeat the last one; frames past the end are zero-filled.
    /// Returns the number of frames copied from the buffer.
    pub fn write_interleaved(&self, frame: usize, out: &mut [f32], out_channels: usize) -> usize {
        if out_channels == 0 {
            return 0;
        }
        let len = self.len();
        let last_channel = self.channel_count().saturating_sub(1);
        let mut copied = 0;
        for (i, out_frame) in out.chunks_mut(out_channels).enumerate() {
            let pos = frame + i;
            if pos >= len {
                out_frame.fill(0.0);
                continue;
            }
            for (ch, sample) in out_frame.iter_mut().enumerate() {
                *sample = self.channels[ch.min(last_channel)][pos];
            }
            copied += 1;
        }
        copied
    }
}

/// Number of samples covering `duration_secs` at `sample_rate`.
pub fn samples_for(sample_rate: u32, duration_secs: f64) -> usize {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs * sample_rate as f64).round() as usize
}
