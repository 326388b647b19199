//! Script to timeline: parse, synthesize in order, assemble.

use crate::defaults;
use crate::error::Result;
use crate::progress::ProgressSink;
use crate::script::{ScriptParser, Segment};
use crate::timeline::assembler::assemble;
use crate::timeline::synthesizer::SegmentSynthesizer;
use crate::timeline::types::{MarkKind, Timeline};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;
use std::time::Instant;

/// Composes the parser, the segment synthesizer and the assembler.
pub struct TimelineBuilder {
    parser: ScriptParser,
    synthesizer: Arc<SegmentSynthesizer>,
    max_concurrent: usize,
}

impl TimelineBuilder {
    pub fn new(parser: ScriptParser, synthesizer: SegmentSynthesizer) -> Self {
        Self {
            parser,
            synthesizer: Arc::new(synthesizer),
            max_concurrent: defaults::MAX_CONCURRENT_REQUESTS,
        }
    }

    /// Allow up to `n` speech requests in flight. Results are still
    /// assembled in script order.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    pub fn parser(&self) -> &ScriptParser {
        &self.parser
    }

    /// Build a complete timeline for `script`.
    ///
    /// The script is parsed before any I/O happens. The bell is placed at
    /// both ends. Any synthesis failure aborts the whole build; requests
    /// still in flight are dropped with it.
    ///
    /// # Errors
    /// `Parse`, `AssetLoad`, `Synthesis` or `Assembly` errors, whichever
    /// stage fails first.
    pub async fn build_timeline(&self, script: &str, progress: &dyn ProgressSink) -> Result<Timeline> {
        let started = Instant::now();
        let segments = self.parser.parse(script)?;
        progress.report(10.0, "Script parsed");

        let bell = self.synthesizer.synthesize_marker().await?;
        progress.report(defaults::BUILD_PROGRESS_BASE, "Bell loaded");

        let speech_total = segments.iter().filter(|s| s.is_speech()).count();
        let mut speech_done = 0usize;

        let mut buffers = Vec::with_capacity(segments.len() + 2);
        let mut kinds = Vec::with_capacity(segments.len() + 2);
        buffers.push(Arc::clone(&bell));
        kinds.push(MarkKind::Bell);

        let synthesizer = Arc::clone(&self.synthesizer);
        let mut results = stream::iter(segments.clone())
            .map(move |segment| {
                let synthesizer = Arc::clone(&synthesizer);
                async move {
                    synthesizer
                        .synthesize(&segment)
                        .await
                        .map(|buffer| (segment, buffer))
                }
            })
            .buffered(self.max_concurrent);

        while let Some((segment, buffer)) = results.try_next().await? {
            if let Segment::Speech { .. } = segment {
                speech_done += 1;
                let percentage = defaults::BUILD_PROGRESS_BASE
                    + (100.0 - defaults::BUILD_PROGRESS_BASE) * speech_done as f64
                        / speech_total as f64;
                progress.report(
                    percentage,
                    &format!(
                        "Generating audio for sentence {} of {}",
                        speech_done, speech_total
                    ),
                );
            }
            kinds.push(MarkKind::from(&segment));
            buffers.push(buffer);
        }
        drop(results);

        buffers.push(bell);
        kinds.push(MarkKind::Bell);

        let timeline = assemble(&buffers, kinds)?;
        tracing::info!(
            segments = segments.len(),
            speech = speech_total,
            duration_secs = timeline.total_duration_secs(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "timeline built"
        );
        progress.report(100.0, "Timeline ready");
        Ok(timeline)
    }
}
