//! Turns segments into decoded buffers at the engine sample rate.

use crate::asset::AssetLoader;
use crate::audio::buffer::DecodedBuffer;
use crate::audio::wav;
use crate::error::{Result, StillwaveError};
use crate::script::Segment;
use crate::tts::SpeechSynthesizer;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Produces one buffer per segment, plus the cached bell.
pub struct SegmentSynthesizer {
    speech: Arc<dyn SpeechSynthesizer>,
    bell: Arc<dyn AssetLoader>,
    sample_rate: u32,
    bell_cache: OnceCell<Arc<DecodedBuffer>>,
}

impl SegmentSynthesizer {
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        bell: Arc<dyn AssetLoader>,
        sample_rate: u32,
    ) -> Self {
        Self {
            speech,
            bell,
            sample_rate,
            bell_cache: OnceCell::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Synthesize one segment.
    ///
    /// Speech goes through the speech backend and is decoded; pauses become
    /// mono silence and never fail.
    ///
    /// # Errors
    /// `StillwaveError::Synthesis` carrying the segment text if the backend
    /// call or the decode fails.
    pub async fn synthesize(&self, segment: &Segment) -> Result<Arc<DecodedBuffer>> {
        match segment {
            Segment::Pause { duration_secs } => Ok(Arc::new(DecodedBuffer::silence_for(
                self.sample_rate,
                *duration_secs,
            )?)),
            Segment::Speech { text } => {
                tracing::debug!(backend = self.speech.name(), %text, "synthesizing speech");
                let bytes = self.speech.speak(text).await.map_err(|e| match e {
                    StillwaveError::Synthesis { .. } => e,
                    other => StillwaveError::Synthesis {
                        text: text.clone(),
                        message: other.to_string(),
                    },
                })?;
                let buffer = wav::decode(&bytes, self.sample_rate).map_err(|e| {
                    StillwaveError::Synthesis {
                        text: text.clone(),
                        message: e.to_string(),
                    }
                })?;
                tracing::debug!(duration_secs = buffer.duration_secs(), "speech decoded");
                Ok(Arc::new(buffer))
            }
        }
    }

    /// The bell buffer, loaded on first use and cached for the lifetime of
    /// this synthesizer.
    ///
    /// # Errors
    /// `StillwaveError::AssetLoad` if the asset can't be loaded or decoded.
    /// A failed load is not cached; the next call tries again.
    pub async fn synthesize_marker(&self) -> Result<Arc<DecodedBuffer>> {
        self.bell_cache
            .get_or_try_init(|| async {
                let bytes = self.bell.load_bell().await?;
                let buffer =
                    wav::decode(&bytes, self.sample_rate).map_err(|e| StillwaveError::AssetLoad {
                        path: self.bell.source(),
                        message: e.to_string(),
                    })?;
                tracing::info!(
                    source = %self.bell.source(),
                    duration_secs = buffer.duration_secs(),
                    "bell loaded"
                );
                Ok(Arc::new(buffer))
            })
            .await
            .cloned()
    }
}
