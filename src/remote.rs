//! Client for the remote background removal service
//!
//! The service takes one uploaded image and answers with the cutout as an
//! encoded image. The editing core only needs "photo in, cutout out", so the
//! client sits behind the `CutoutProvider` trait and can be swapped in tests
//! or by a host application.

use crate::{
    config::EditorConfig,
    error::{RefineError, Result, SourceRole},
    services::RasterIO,
    types::Raster,
};
use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Path of the removal endpoint relative to the service base URL
pub const REMOVE_BG_PATH: &str = "/remove-bg";

/// Message shown to the user when the service cannot be reached
pub const CONNECTION_FAILED_MESSAGE: &str = "Connection failed. Is the backend running?";

/// Anything that turns a photo into a cutout
#[async_trait]
pub trait CutoutProvider: Send + Sync {
    /// Produce a cutout for the encoded `image`
    async fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Raster>;
}

/// `CutoutProvider` backed by the HTTP removal service
#[derive(Debug, Clone)]
pub struct RemoteRemover {
    client: Client,
    endpoint: String,
}

impl RemoteRemover {
    /// Create a client for the endpoint configured in `config`
    pub fn new(config: &EditorConfig) -> Result<Self> {
        Self::with_endpoint(
            &config.remote_endpoint,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a client for an explicit service base URL
    pub fn with_endpoint(base_url: &str, timeout: Duration) -> Result<Self> {
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(RefineError::invalid_config(format!(
                "Remote endpoint must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RefineError::network_error("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), REMOVE_BG_PATH),
        })
    }

    /// Full URL requests are posted to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CutoutProvider for RemoteRemover {
    #[instrument(skip(self, image), fields(endpoint = %self.endpoint, bytes = image.len()))]
    async fn remove_background(&self, image: &[u8], file_name: &str) -> Result<Raster> {
        // The service rejects anything that is not an image/* upload
        let format = image::guess_format(image).map_err(|e| {
            RefineError::load(SourceRole::Original, format!("unrecognized image data: {}", e))
        })?;

        let part = Part::bytes(image.to_vec())
            .file_name(file_name.to_string())
            .mime_str(format.to_mime_type())
            .map_err(|e| RefineError::internal(format!("invalid MIME type: {}", e)))?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Background removal request failed");
                RefineError::network_error(CONNECTION_FAILED_MESSAGE, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Background removal service returned an error");
            return Err(RefineError::Network(format!(
                "{} (service answered {})",
                CONNECTION_FAILED_MESSAGE, status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RefineError::network_error(CONNECTION_FAILED_MESSAGE, e))?;

        let cutout = RasterIO::load_from_bytes(&body)
            .map(Raster::from_dynamic)
            .map_err(|e| RefineError::load(SourceRole::Cutout, e.to_string()))?;

        info!(
            width = cutout.width(),
            height = cutout.height(),
            "Received cutout from background removal service"
        );
        Ok(cutout)
    }
}
