//! Bell asset loaders.

use crate::audio::wav;
use crate::error::{Result, StillwaveError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for fetching the encoded bell asset.
///
/// The synthesizer calls this at most once per process and caches the result.
#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Load the encoded (WAV) bell bytes.
    async fn load_bell(&self) -> Result<Vec<u8>>;

    /// Where the asset comes from, for error messages.
    fn source(&self) -> String;
}

/// Loads the bell from a WAV file on disk.
#[derive(Debug, Clone)]
pub struct FileAssetLoader {
    path: PathBuf,
}

impl FileAssetLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AssetLoader for FileAssetLoader {
    async fn load_bell(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| StillwaveError::AssetLoad {
                path: self.path.display().to_string(),
                message: e.to_string(),
            })
    }

    fn source(&self) -> String {
        self.path.display().to_string()
    }
}

/// Generates a bell tone instead of reading a file. Used offline.
#[derive(Debug, Clone)]
pub struct SynthesizedBell {
    sample_rate: u32,
    duration_secs: f64,
}

impl SynthesizedBell {
    pub fn new(sample_rate: u32, duration_secs: f64) -> Self {
        Self {
            sample_rate,
            duration_secs,
        }
    }
}

#[async_trait]
impl AssetLoader for SynthesizedBell {
    async fn load_bell(&self) -> Result<Vec<u8>> {
        let buffer = wav::bell(self.sample_rate, self.duration_secs)?;
        wav::to_wav_bytes(&buffer)
    }

    fn source(&self) -> String {
        "synthesized bell".to_string()
    }
}

/// Serves fixed bytes and counts loads.
#[derive(Debug, Clone)]
pub struct StaticAssetLoader {
    bytes: Option<Vec<u8>>,
    loads: Arc<AtomicUsize>,
}

impl StaticAssetLoader {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A loader whose asset is missing.
    pub fn missing() -> Self {
        Self {
            bytes: None,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetLoader for StaticAssetLoader {
    async fn load_bell(&self) -> Result<Vec<u8>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.bytes.clone().ok_or_else(|| StillwaveError::AssetLoad {
            path: self.source(),
            message: "asset not available".to_string(),
        })
    }

    fn source(&self) -> String {
        "static bell".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_loader_reads_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let loader = FileAssetLoader::new(&path);
        assert_eq!(loader.load_bell().await.unwrap(), b"RIFF".to_vec());
    }

    #[tokio::test]
    async fn file_loader_missing_file_is_asset_error() {
        let loader = FileAssetLoader::new("/nonexistent/stillwave/bell.wav");
        let err = loader.load_bell().await.unwrap_err();
        assert!(matches!(err, StillwaveError::AssetLoad { .. }));
        assert!(err.to_string().contains("/nonexistent/stillwave/bell.wav"));
    }

    #[tokio::test]
    async fn synthesized_bell_decodes() {
        let loader = SynthesizedBell::new(24000, 0.5);
        let bytes = loader.load_bell().await.unwrap();
        let buffer = wav::decode(&bytes, 24000).unwrap();
        assert_eq!(buffer.len(), 12000);
    }

    #[tokio::test]
    async fn static_loader_counts_loads() {
        let loader = StaticAssetLoader::new(vec![1, 2, 3]);
        loader.load_bell().await.unwrap();
        loader.load_bell().await.unwrap();
        assert_eq!(loader.load_count(), 2);

        let missing = StaticAssetLoader::missing();
        assert!(missing.load_bell().await.is_err());
    }
}
