use crate::audio::wav;
use crate::error::{Result, StillwaveError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Trait for text-to-speech backends.
///
/// Implementations return an encoded audio payload (WAV) for the given text.
/// Any error is fatal to the timeline being built; retries are up to the caller.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` and return the encoded audio bytes.
    async fn speak(&self, text: &str) -> Result<Vec<u8>>;

    /// Name of the backend, for logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for Arc<T> {
    async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        (**self).speak(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock speech backend for testing and offline runs.
///
/// Produces a quiet tone whose length depends on the text: a fixed duration,
/// or a per-word duration when configured.
#[derive(Debug, Clone)]
pub struct MockSpeechSynthesizer {
    sample_rate: u32,
    fixed_secs: Option<f64>,
    secs_per_word: f64,
    delay: Option<Duration>,
    fail_on: Option<String>,
    payload: Option<Vec<u8>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockSpeechSynthesizer {
    /// Create a mock rendering 0.35 s per word at `sample_rate`
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fixed_secs: None,
            secs_per_word: 0.35,
            delay: None,
            fail_on: None,
            payload: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every utterance lasts exactly `secs`
    pub fn with_fixed_duration(mut self, secs: f64) -> Self {
        self.fixed_secs = Some(secs);
        self
    }

    /// Sleep before answering, to simulate network latency
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail when asked to speak text containing `needle`
    pub fn with_failure_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    /// Return these bytes verbatim instead of a generated WAV
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Texts requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Duration this mock renders for `text`
    pub fn duration_for(&self, text: &str) -> f64 {
        self.fixed_secs
            .unwrap_or_else(|| text.split_whitespace().count().max(1) as f64 * self.secs_per_word)
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeechSynthesizer {
    async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(needle) = &self.fail_on
            && text.contains(needle.as_str())
        {
            return Err(StillwaveError::Other(
                "mock speech failure: status 500".to_string(),
            ));
        }

        if let Some(payload) = &self.payload {
            return Ok(payload.clone());
        }

        let buffer = wav::tone(self.sample_rate, 220.0, self.duration_for(text), 0.2)?;
        wav::to_wav_bytes(&buffer)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
