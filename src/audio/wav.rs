//! WAV decoding and encoding.
//!
//! Speech payloads and the bell asset arrive as WAV bytes. Decoding yields a
//! planar f32 [`DecodedBuffer`] at the engine sample rate, resampling when the
//! payload was recorded at a different rate.

use crate::audio::buffer::DecodedBuffer;
use crate::error::{Result, StillwaveError};
use std::f32::consts::TAU;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Decode WAV bytes into a buffer at `target_rate`.
///
/// Accepts integer PCM up to 32 bits and 32-bit float, any channel count.
///
/// # Errors
/// `StillwaveError::Decode` if the payload is not a readable WAV stream.
pub fn decode(bytes: &[u8], target_rate: u32) -> Result<DecodedBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        StillwaveError::Decode {
            message: format!("Failed to parse WAV data: {}", e),
        }
    })?;

    let spec = reader.spec();
    let channel_count = spec.channels as usize;
    if channel_count == 0 {
        return Err(StillwaveError::Decode {
            message: "WAV header declares zero channels".to_string(),
        });
    }

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>(),
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1u64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<_>, _>>()
        }
    }
    .map_err(|e| StillwaveError::Decode {
        message: format!("Failed to read WAV samples: {}", e),
    })?;

    let decoded = DecodedBuffer::from_interleaved(spec.sample_rate, channel_count, &interleaved)?;
    if spec.sample_rate == target_rate {
        return Ok(decoded);
    }

    tracing::debug!(
        from = spec.sample_rate,
        to = target_rate,
        "resampling decoded audio"
    );
    let channels = decoded
        .channels()
        .iter()
        .map(|c| resample(c, spec.sample_rate, target_rate))
        .collect();
    DecodedBuffer::new(target_rate, channels)
}

/// Write a buffer as 16-bit PCM WAV.
pub fn encode<W: Write + Seek>(buffer: &DecodedBuffer, writer: W) -> Result<()> {
    let spec = hound::WavSpec {
        channels: buffer.channel_count() as u16,
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let encode_err = |e: hound::Error| StillwaveError::Other(format!("Failed to write WAV: {}", e));

    let mut wav = hound::WavWriter::new(writer, spec).map_err(encode_err)?;
    for pos in 0..buffer.len() {
        for channel in buffer.channels() {
            let sample = (channel[pos].clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            wav.write_sample(sample).map_err(encode_err)?;
        }
    }
    wav.finalize().map_err(encode_err)
}

/// Encode into an in-memory WAV payload.
pub fn to_wav_bytes(buffer: &DecodedBuffer) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    encode(buffer, &mut cursor)?;
    Ok(cursor.into_inner())
}

/// Encode into a WAV file at `path`.
pub fn write_file(buffer: &DecodedBuffer, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    encode(buffer, std::io::BufWriter::new(file))
}

/// A sine tone with a linear fade in/out, as a mono buffer.
pub fn tone(sample_rate: u32, frequency: f32, duration_secs: f64, amplitude: f32) -> Result<DecodedBuffer> {
    let len = crate::audio::buffer::samples_for(sample_rate, duration_secs);
    let fade = (sample_rate as usize / 100).min(len / 2).max(1);
    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let edge = i.min(len - 1 - i);
            let envelope = (edge as f32 / fade as f32).min(1.0);
            (TAU * frequency * t).sin() * amplitude * envelope
        })
        .collect();
    DecodedBuffer::mono(sample_rate, samples)
}

/// A struck-bell sound: a few inharmonic partials under an exponential decay.
pub fn bell(sample_rate: u32, duration_secs: f64) -> Result<DecodedBuffer> {
    const PARTIALS: [(f32, f32); 4] = [(1.0, 0.5), (2.76, 0.25), (5.4, 0.12), (8.93, 0.06)];
    const FUNDAMENTAL: f32 = 528.0;

    let len = crate::audio::buffer::samples_for(sample_rate, duration_secs);
    let samples = (0..len)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let decay = (-3.0 * t).exp();
            let strike = (t * 200.0).min(1.0);
            PARTIALS
                .iter()
                .map(|&(ratio, gain)| (TAU * FUNDAMENTAL * ratio * t).sin() * gain)
                .sum::<f32>()
                * decay
                * strike
                * 0.6
        })
        .collect();
    DecodedBuffer::mono(sample_rate, samples)
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = (source_pos.floor() as usize).min(samples.len() - 1);
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_wav_data(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn decode_mono_at_target_rate() {
        let wav = make_wav_data(24000, 1, &[0, 16384, -16384, i16::MAX]);
        let buffer = decode(&wav, 24000).unwrap();

        assert_eq!(buffer.channel_count(), 1);
        assert_eq!(buffer.sample_rate(), 24000);
        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -0.5);
    }

    #[test]
    fn decode_stereo_keeps_channels() {
        let wav = make_wav_data(24000, 2, &[100, -100, 200, -200]);
        let buffer = decode(&wav, 24000).unwrap();

        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.len(), 2);
        assert!(buffer.channel(0).unwrap()[0] > 0.0);
        assert!(buffer.channel(1).unwrap()[0] < 0.0);
    }

    #[test]
    fn decode_float_wav() {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        writer.write_sample(0.25f32).unwrap();
        writer.write_sample(-0.75f32).unwrap();
        writer.finalize().unwrap();

        let buffer = decode(&cursor.into_inner(), 16000).unwrap();
        assert_eq!(buffer.channel(0).unwrap(), &[0.25, -0.75]);
    }

    #[test]
    fn decode_resamples_to_target_rate() {
        let wav = make_wav_data(48000, 1, &vec![1000i16; 48000]);
        let buffer = decode(&wav, 24000).unwrap();

        assert_eq!(buffer.sample_rate(), 24000);
        assert_eq!(buffer.len(), 24000);
        assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn decode_rejects_garbage() {
        let result = decode(b"definitely not a wav file", 24000);
        assert!(matches!(result, Err(StillwaveError::Decode { .. })));
    }

    #[test]
    fn encode_then_decode_preserves_shape() {
        let buffer = DecodedBuffer::new(22050, vec![vec![0.5; 100], vec![-0.5; 100]]).unwrap();
        let bytes = to_wav_bytes(&buffer).unwrap();
        let decoded = decode(&bytes, 22050).unwrap();

        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.len(), 100);
        assert!((decoded.channel(0).unwrap()[10] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn write_file_creates_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let buffer = DecodedBuffer::silence_for(8000, 0.25).unwrap();

        write_file(&buffer, &path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 8000);
        assert_eq!(reader.duration(), 2000);
    }

    #[test]
    fn tone_has_requested_length_and_fades() {
        let buffer = tone(24000, 440.0, 0.5, 0.3).unwrap();
        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples.len(), 12000);
        assert_eq!(samples[0], 0.0);
        assert!(samples.iter().all(|s| s.abs() <= 0.3 + 1e-6));
    }

    #[test]
    fn bell_decays() {
        let buffer = bell(24000, 2.0).unwrap();
        let samples = buffer.channel(0).unwrap();
        let peak = |range: std::ops::Range<usize>| {
            samples[range].iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
        };
        assert!(peak(0..4800) > peak(43200..48000));
    }

    #[test]
    fn resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000), samples);
    }

    #[test]
    fn resample_upsamples_by_interpolation() {
        let out = resample(&[0.0, 1.0], 8000, 16000);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert_eq!(out[2], 1.0);
    }
}
