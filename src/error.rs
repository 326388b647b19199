//! Error types for stillwave.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StillwaveError {
    // Script errors
    #[error("Failed to parse script: {message}")]
    Parse { message: String },

    // Timeline build errors
    #[error("Speech synthesis failed for \"{text}\": {message}")]
    Synthesis { text: String, message: String },

    #[error("Failed to load bell asset from {path}: {message}")]
    AssetLoad { path: String, message: String },

    #[error("Failed to decode audio: {message}")]
    Decode { message: String },

    #[error("Timeline assembly failed: {message}")]
    Assembly { message: String },

    // Playback errors
    #[error("Playback device error: {message}")]
    Device { message: String },

    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse error category a presentation layer can switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Synthesis,
    AssetLoad,
    Device,
    Config,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Synthesis => "synthesis",
            ErrorKind::AssetLoad => "asset-load",
            ErrorKind::Device => "device",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

impl StillwaveError {
    /// Map this error onto the category shown to users.
    ///
    /// A bare `Decode` error counts as synthesis; the synthesizer rewraps
    /// bell decode failures as `AssetLoad` before they get here.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StillwaveError::Parse { .. } => ErrorKind::Parse,
            StillwaveError::Synthesis { .. } | StillwaveError::Decode { .. } => {
                ErrorKind::Synthesis
            }
            StillwaveError::AssetLoad { .. } => ErrorKind::AssetLoad,
            StillwaveError::Device { .. } => ErrorKind::Device,
            StillwaveError::ConfigFileNotFound { .. }
            | StillwaveError::ConfigParse { .. }
            | StillwaveError::ConfigInvalidValue { .. } => ErrorKind::Config,
            StillwaveError::Assembly { .. }
            | StillwaveError::Io(_)
            | StillwaveError::Other(_) => ErrorKind::Internal,
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, StillwaveError>;
