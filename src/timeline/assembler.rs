//! Concatenates decoded buffers into one contiguous timeline.
//!
//! Offsets are tracked in samples as a running sum of each input's own
//! length. Seconds are derived from those integers at the end, so rounding
//! never compounds across segments and the final mark ends exactly at the
//! timeline's total duration.

use crate::audio::buffer::DecodedBuffer;
use crate::error::{Result, StillwaveError};
use crate::timeline::types::{MarkKind, Timeline, TimingMark};
use std::sync::Arc;

/// Merge `buffers` in order, tagging each with the matching entry of `kinds`.
///
/// The output has as many channels as the widest input; narrower inputs are
/// upmixed by repeating their last channel (in practice their only one).
///
/// # Errors
/// `StillwaveError::Assembly` if there are no buffers, the two lists differ in
/// length, or the inputs disagree on sample rate.
pub fn assemble(buffers: &[Arc<DecodedBuffer>], kinds: Vec<MarkKind>) -> Result<Timeline> {
    let Some(first) = buffers.first() else {
        return Err(StillwaveError::Assembly {
            message: "no buffers to assemble".to_string(),
        });
    };
    if buffers.len() != kinds.len() {
        return Err(StillwaveError::Assembly {
            message: format!(
                "{} buffers but {} timing marks",
                buffers.len(),
                kinds.len()
            ),
        });
    }

    let sample_rate = first.sample_rate();
    if let Some(odd) = buffers.iter().find(|b| b.sample_rate() != sample_rate) {
        return Err(StillwaveError::Assembly {
            message: format!(
                "sample rate mismatch: {} Hz vs {} Hz",
                odd.sample_rate(),
                sample_rate
            ),
        });
    }

    let channel_count = buffers.iter().map(|b| b.channel_count()).max().unwrap_or(1);
    let total_samples: usize = buffers.iter().map(|b| b.len()).sum();
    let mut output = vec![vec![0.0f32; total_samples]; channel_count];

    let rate = sample_rate as f64;
    let mut marks = Vec::with_capacity(buffers.len());
    let mut offset = 0usize;

    for (buffer, kind) in buffers.iter().zip(kinds) {
        let len = buffer.len();
        let last_source = buffer.channel_count() - 1;

        for (ch, out) in output.iter_mut().enumerate() {
            let source = &buffer.channels()[ch.min(last_source)];
            let end = (offset + len).min(out.len());
            if end > offset {
                out[offset..end].copy_from_slice(&source[..end - offset]);
            }
        }

        marks.push(TimingMark {
            offset_secs: offset as f64 / rate,
            duration_secs: len as f64 / rate,
            end_secs: (offset + len) as f64 / rate,
            offset_samples: offset,
            length_samples: len,
            kind,
        });
        offset += len;
    }

    let merged = DecodedBuffer::new(sample_rate, output)?;
    tracing::debug!(
        buffers = buffers.len(),
        channels = channel_count,
        samples = total_samples,
        duration_secs = merged.duration_secs(),
        "timeline assembled"
    );
    Ok(Timeline::new(merged, marks))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(rate: u32, samples: Vec<f32>) -> Arc<DecodedBuffer> {
        Arc::new(DecodedBuffer::mono(rate, samples).unwrap())
    }

    fn silence(rate: u32, secs: f64) -> Arc<DecodedBuffer> {
        Arc::new(DecodedBuffer::silence_for(rate, secs).unwrap())
    }

    fn pause_kinds(n: usize) -> Vec<MarkKind> {
        (0..n)
            .map(|_| MarkKind::Pause { duration_secs: 0.0 })
            .collect()
    }

    #[test]
    fn total_duration_is_sum_of_inputs() {
        let rate = 24000;
        let durations = [0.1, 1.3333, 2.0, 0.0417, 0.9];
        let buffers: Vec<_> = durations.iter().map(|&d| silence(rate, d)).collect();
        let expected: f64 = buffers.iter().map(|b| b.duration_secs()).sum();

        let timeline = assemble(&buffers, pause_kinds(buffers.len())).unwrap();

        assert!((timeline.total_duration_secs() - expected).abs() <= 1.0 / rate as f64);
        assert_eq!(
            timeline.buffer().len(),
            buffers.iter().map(|b| b.len()).sum::<usize>()
        );
    }

    #[test]
    fn marks_start_at_prefix_sums() {
        let rate = 44100;
        let buffers = vec![silence(rate, 0.25), silence(rate, 1.5), silence(rate, 0.75)];
        let timeline = assemble(&buffers, pause_kinds(3)).unwrap();
        let marks = timeline.marks();

        assert_eq!(marks[0].offset_secs, 0.0);
        assert!((marks[1].offset_secs - 0.25).abs() < 1e-9);
        assert!((marks[2].offset_secs - 1.75).abs() < 1e-9);
    }

    #[test]
    fn marks_are_contiguous_and_end_at_total() {
        let rate = 22050;
        let buffers = vec![silence(rate, 0.1), silence(rate, 0.333), silence(rate, 0.7)];
        let timeline = assemble(&buffers, pause_kinds(3)).unwrap();
        let marks = timeline.marks();

        for pair in marks.windows(2) {
            assert_eq!(pair[0].end_secs, pair[1].offset_secs);
            assert_eq!(
                pair[0].offset_samples + pair[0].length_samples,
                pair[1].offset_samples
            );
        }
        let last = marks.last().unwrap();
        assert_eq!(last.end_secs, timeline.total_duration_secs());
        assert_eq!(timeline.buffer().duration_secs(), timeline.total_duration_secs());
    }

    #[test]
    fn samples_land_at_their_offsets() {
        let buffers = vec![mono(8000, vec![0.1, 0.2]), mono(8000, vec![0.3, 0.4, 0.5])];
        let timeline = assemble(&buffers, pause_kinds(2)).unwrap();

        assert_eq!(
            timeline.buffer().channel(0).unwrap(),
            &[0.1, 0.2, 0.3, 0.4, 0.5]
        );
    }

    #[test]
    fn mono_is_upmixed_next_to_stereo() {
        let stereo = Arc::new(
            DecodedBuffer::new(8000, vec![vec![0.9, 0.8], vec![-0.9, -0.8]]).unwrap(),
        );
        let buffers = vec![mono(8000, vec![0.1, 0.2, 0.3]), stereo];
        let timeline = assemble(&buffers, pause_kinds(2)).unwrap();
        let out = timeline.buffer();

        assert_eq!(out.channel_count(), 2);
        assert_eq!(&out.channel(0).unwrap()[..3], &[0.1, 0.2, 0.3]);
        assert_eq!(&out.channel(1).unwrap()[..3], &[0.1, 0.2, 0.3]);
        assert_eq!(&out.channel(0).unwrap()[3..], &[0.9, 0.8]);
        assert_eq!(&out.channel(1).unwrap()[3..], &[-0.9, -0.8]);
    }

    #[test]
    fn empty_buffers_produce_zero_length_marks() {
        let buffers = vec![mono(8000, vec![0.5]), silence(8000, 0.0), mono(8000, vec![0.25])];
        let timeline = assemble(&buffers, pause_kinds(3)).unwrap();
        let marks = timeline.marks();

        assert_eq!(marks[1].length_samples, 0);
        assert_eq!(marks[1].offset_samples, 1);
        assert_eq!(marks[2].offset_samples, 1);
        assert_eq!(timeline.buffer().channel(0).unwrap(), &[0.5, 0.25]);
    }

    #[test]
    fn kinds_are_attached_in_order() {
        let buffers = vec![silence(8000, 0.1), silence(8000, 0.2), silence(8000, 0.1)];
        let kinds = vec![
            MarkKind::Bell,
            MarkKind::Speech {
                text: "Rest.".to_string(),
            },
            MarkKind::Bell,
        ];
        let timeline = assemble(&buffers, kinds.clone()).unwrap();
        let got: Vec<MarkKind> = timeline.marks().iter().map(|m| m.kind.clone()).collect();
        assert_eq!(got, kinds);
    }

    #[test]
    fn rejects_empty_input() {
        let result = assemble(&[], vec![]);
        assert!(matches!(result, Err(StillwaveError::Assembly { .. })));
    }

    #[test]
    fn rejects_mismatched_kinds() {
        let result = assemble(&[silence(8000, 0.1)], pause_kinds(2));
        assert!(matches!(result, Err(StillwaveError::Assembly { .. })));
    }

    #[test]
    fn rejects_mixed_sample_rates() {
        let result = assemble(&[silence(8000, 0.1), silence(16000, 0.1)], pause_kinds(2));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("sample rate mismatch"));
    }

    #[test]
    fn mark_at_finds_covering_mark() {
        let buffers = vec![silence(1000, 1.0), silence(1000, 2.0), silence(1000, 1.0)];
        let timeline = assemble(&buffers, pause_kinds(3)).unwrap();

        assert_eq!(timeline.mark_at(0.0).unwrap().offset_samples, 0);
        assert_eq!(timeline.mark_at(0.999).unwrap().offset_samples, 0);
        assert_eq!(timeline.mark_at(1.0).unwrap().offset_samples, 1000);
        assert_eq!(timeline.mark_at(3.5).unwrap().offset_samples, 3000);
        assert_eq!(timeline.mark_at(99.0).unwrap().offset_samples, 3000);
        assert_eq!(timeline.samples_at(99.0), 4000);
    }
}
