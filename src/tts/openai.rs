//! Speech synthesis over the OpenAI-compatible `/v1/audio/speech` endpoint.

use crate::config::SpeechConfig;
use crate::error::{Result, StillwaveError};
use crate::tts::speaker::SpeechSynthesizer;
use crate::tts::voice;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// HTTP speech client.
///
/// The voice is resolved once at construction, so `random` stays stable for
/// every segment of a build.
#[derive(Debug, Clone)]
pub struct OpenAiSpeech {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    voice: String,
    api_key: String,
}

impl OpenAiSpeech {
    /// Create a client from config and an API key.
    ///
    /// # Errors
    /// `StillwaveError::ConfigInvalidValue` if the key is empty or the voice
    /// is unknown; `StillwaveError::Other` if the HTTP client can't be built.
    pub fn new(config: &SpeechConfig, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StillwaveError::ConfigInvalidValue {
                key: config.api_key_env.clone(),
                message: "API key is empty".to_string(),
            });
        }
        if !voice::is_known(&config.voice) {
            return Err(StillwaveError::ConfigInvalidValue {
                key: "speech.voice".to_string(),
                message: format!("unknown voice '{}'", config.voice),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StillwaveError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let voice = voice::resolve(&config.voice).to_string();
        tracing::info!(model = %config.model, voice = %voice, "speech client ready");

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            voice,
            api_key,
        })
    }

    /// Create a client reading the key from the configured environment variable.
    pub fn from_env(config: &SpeechConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            StillwaveError::ConfigInvalidValue {
                key: config.api_key_env.clone(),
                message: "environment variable is not set".to_string(),
            }
        })?;
        Self::new(config, api_key)
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn speak(&self, text: &str) -> Result<Vec<u8>> {
        let failed = |message: String| StillwaveError::Synthesis {
            text: text.to_string(),
            message,
        };

        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text.trim(),
            response_format: "wav",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!(
                "endpoint returned {}: {}",
                status,
                error_message(&body)
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| failed(format!("failed to read response body: {}", e)))?;
        tracing::debug!(bytes = bytes.len(), "speech payload received");
        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
