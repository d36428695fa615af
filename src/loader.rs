//! Asynchronous decoding of raster sources
//!
//! Decoding is the only operation in the editing core that suspends. Sources
//! can be in-memory bytes, files, HTTP(S) URLs or already decoded rasters.

use crate::{
    config::EditorConfig,
    error::{RefineError, Result, SourceRole},
    services::RasterIO,
    types::Raster,
};
use reqwest::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, instrument};

/// Where a raster comes from
#[derive(Debug, Clone)]
pub enum RasterSource {
    /// Encoded image bytes (PNG, JPEG, WebP, ...)
    Bytes(Vec<u8>),
    /// Encoded image file on disk
    Path(PathBuf),
    /// Encoded image behind an HTTP(S) URL
    Url(String),
    /// Already decoded raster
    Decoded(Raster),
}

impl RasterSource {
    /// Short description for logs and error messages
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Bytes(bytes) => format!("{} bytes in memory", bytes.len()),
            Self::Path(path) => path.display().to_string(),
            Self::Url(url) => url.clone(),
            Self::Decoded(raster) => {
                format!("decoded {}x{} raster", raster.width(), raster.height())
            },
        }
    }
}

impl From<Raster> for RasterSource {
    fn from(raster: Raster) -> Self {
        Self::Decoded(raster)
    }
}

impl From<Vec<u8>> for RasterSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<PathBuf> for RasterSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

/// Decodes `RasterSource`s into `Raster`s
#[derive(Debug, Clone)]
pub struct RasterLoader {
    client: Client,
}

impl RasterLoader {
    /// Create a loader whose URL fetches time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RefineError::network_error("Failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    /// Create a loader using the configured request timeout
    pub fn from_config(config: &EditorConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.request_timeout_secs))
    }

    /// Decode a source, tagging any failure with the role it plays
    #[instrument(skip(self, source), fields(role = %role, source = %source.describe()))]
    pub async fn load(&self, source: RasterSource, role: SourceRole) -> Result<Raster> {
        let raster = match source {
            RasterSource::Decoded(raster) => raster,
            RasterSource::Bytes(bytes) => Self::decode(&bytes, role)?,
            RasterSource::Path(path) => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    RefineError::load(role, format!("cannot read '{}': {}", path.display(), e))
                })?;
                Self::decode(&bytes, role)?
            },
            RasterSource::Url(url) => {
                let bytes = self.fetch(&url).await.map_err(|e| {
                    RefineError::load(role, format!("cannot fetch '{}': {}", url, e))
                })?;
                Self::decode(&bytes, role)?
            },
        };

        debug!(
            width = raster.width(),
            height = raster.height(),
            "Decoded {} raster",
            role
        );
        Ok(raster)
    }

    async fn fetch(&self, url: &str) -> std::result::Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }

    fn decode(bytes: &[u8], role: SourceRole) -> Result<Raster> {
        RasterIO::load_from_bytes(bytes)
            .map(Raster::from_dynamic)
            .map_err(|e| RefineError::load(role, e.to_string()))
    }
}

impl Default for RasterLoader {
    /// Loader with the default request timeout
    fn default() -> Self {
        let timeout = Duration::from_secs(EditorConfig::default().request_timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to an HTTP client without timeout");
                Client::new()
            });
        Self { client }
    }
}
