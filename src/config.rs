use crate::defaults;
use crate::error::{Result, StillwaveError};
use crate::script::{ParserOptions, PauseGrammar};
use crate::tts::voice;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Force debug logging
    pub debug: bool,
    pub audio: AudioConfig,
    pub speech: SpeechConfig,
    pub script: ScriptConfig,
    pub bell: BellConfig,
    pub playback: PlaybackConfig,
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub device: Option<String>,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub model: String,
    pub voice: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_concurrent_requests: usize,
}

/// Script parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScriptConfig {
    pub grammar: PauseGrammar,
    pub split_sentences: bool,
    pub sentence_gap_secs: f64,
}

/// Bell asset configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct BellConfig {
    /// WAV file played at both ends of every timeline
    pub path: Option<PathBuf>,
}

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackConfig {
    pub progress_interval_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            device: None,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::SPEECH_ENDPOINT.to_string(),
            model: defaults::SPEECH_MODEL.to_string(),
            voice: defaults::DEFAULT_VOICE.to_string(),
            api_key_env: defaults::API_KEY_ENV.to_string(),
            timeout_secs: defaults::SPEECH_TIMEOUT_SECS,
            max_concurrent_requests: defaults::MAX_CONCURRENT_REQUESTS,
        }
    }
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            grammar: PauseGrammar::Auto,
            split_sentences: true,
            sentence_gap_secs: defaults::SENTENCE_GAP_SECS,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: defaults::PROGRESS_INTERVAL_MS,
        }
    }
}

impl ScriptConfig {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            grammar: self.grammar,
            split_sentences: self.split_sentences,
            sentence_gap_secs: self.sentence_gap_secs,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing fields will use default values.
    ///
    /// # Errors
    /// `ConfigFileNotFound` if the file is missing, `ConfigParse` for invalid TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StillwaveError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                StillwaveError::Io(e)
            }
        })?;
        toml::from_str(&contents).map_err(|e| StillwaveError::ConfigParse {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// # Errors
    /// Anything except a missing file, e.g. invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(StillwaveError::ConfigFileNotFound { .. }) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - STILLWAVE_VOICE → speech.voice
    /// - STILLWAVE_BELL → bell.path
    /// - STILLWAVE_AUDIO_DEVICE → audio.device
    /// - STILLWAVE_DEBUG → debug (`1` or `true`)
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(voice) = std::env::var("STILLWAVE_VOICE")
            && !voice.is_empty()
        {
            self.speech.voice = voice;
        }

        if let Ok(bell) = std::env::var("STILLWAVE_BELL")
            && !bell.is_empty()
        {
            self.bell.path = Some(PathBuf::from(bell));
        }

        if let Ok(device) = std::env::var("STILLWAVE_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        if let Ok(debug) = std::env::var("STILLWAVE_DEBUG")
            && !debug.is_empty()
        {
            self.debug = matches!(debug.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        self
    }

    /// Check values that parse fine but can't work.
    ///
    /// # Errors
    /// `ConfigInvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: String| StillwaveError::ConfigInvalidValue {
            key: key.to_string(),
            message,
        };

        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be greater than 0".to_string()));
        }
        if self.speech.max_concurrent_requests == 0 {
            return Err(invalid(
                "speech.max_concurrent_requests",
                "must be at least 1".to_string(),
            ));
        }
        if !voice::is_known(&self.speech.voice) {
            return Err(invalid(
                "speech.voice",
                format!(
                    "unknown voice '{}' (expected one of {}, or {})",
                    self.speech.voice,
                    voice::VOICES.join(", "),
                    voice::RANDOM_VOICE
                ),
            ));
        }
        let gap = self.script.sentence_gap_secs;
        if !gap.is_finite() || !(0.0..=defaults::MAX_PAUSE_SECS).contains(&gap) {
            return Err(invalid(
                "script.sentence_gap_secs",
                format!("must be between 0 and {}", defaults::MAX_PAUSE_SECS),
            ));
        }
        if self.playback.progress_interval_ms == 0 {
            return Err(invalid(
                "playback.progress_interval_ms",
                "must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/stillwave/config.toml on Linux
    #[cfg(feature = "cli")]
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("stillwave").join("config.toml"))
            .ok_or_else(|| StillwaveError::Other("Could not determine config directory".to_string()))
    }
}
