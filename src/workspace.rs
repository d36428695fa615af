//! State of the outer editing screen
//!
//! Holds the uploaded photo, the current cutout and the chosen background,
//! and wires the remote provider, the mask editor and the compositor
//! together. Failures from the remote call are turned into a user-visible
//! message instead of escaping as faults.

use crate::{
    compositor::{CompositeOutput, Compositor},
    config::EditorConfig,
    error::{RefineError, Result, SourceRole},
    loader::RasterLoader,
    remote::{CutoutProvider, CONNECTION_FAILED_MESSAGE},
    services::RasterIO,
    session::{MaskEditSession, SavedCutout},
    types::{BackgroundSpec, Raster},
};
use tracing::{info, warn};

/// Uploaded photo together with its encoded bytes
#[derive(Debug, Clone)]
struct OriginalPhoto {
    bytes: Vec<u8>,
    file_name: String,
    raster: Raster,
}

/// Editing screen: photo, cutout, background and error banner
#[derive(Debug, Default)]
pub struct EditorWorkspace {
    config: EditorConfig,
    original: Option<OriginalPhoto>,
    cutout: Option<Raster>,
    background: BackgroundSpec,
    error: Option<String>,
}

impl EditorWorkspace {
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Replace the photo; any previous cutout and error are dropped
    pub fn set_original<S: Into<String>>(&mut self, bytes: Vec<u8>, file_name: S) -> Result<()> {
        let raster = RasterIO::load_from_bytes(&bytes)
            .map(Raster::from_dynamic)
            .map_err(|e| RefineError::load(SourceRole::Original, e.to_string()))?;

        self.original = Some(OriginalPhoto {
            bytes,
            file_name: file_name.into(),
            raster,
        });
        self.cutout = None;
        self.error = None;
        Ok(())
    }

    #[must_use]
    pub fn original(&self) -> Option<&Raster> {
        self.original.as_ref().map(|photo| &photo.raster)
    }

    #[must_use]
    pub fn cutout(&self) -> Option<&Raster> {
        self.cutout.as_ref()
    }

    /// Install a cutout obtained elsewhere
    pub fn set_cutout(&mut self, cutout: Raster) {
        self.cutout = Some(cutout);
        self.error = None;
    }

    /// User-visible error message from the last failed operation
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ask `provider` for a cutout of the current photo
    ///
    /// On failure the generic connectivity message is recorded for display
    /// and the previous cutout is left untouched.
    pub async fn request_cutout(&mut self, provider: &dyn CutoutProvider) -> Result<&Raster> {
        let photo = self
            .original
            .as_ref()
            .ok_or_else(|| RefineError::load(SourceRole::Original, "no photo uploaded"))?;
        self.error = None;

        match provider.remove_background(&photo.bytes, &photo.file_name).await {
            Ok(cutout) => {
                info!(file = %photo.file_name, "Cutout received");
                Ok(self.cutout.insert(cutout))
            },
            Err(e) => {
                warn!(error = %e, "Cutout request failed");
                self.error = Some(CONNECTION_FAILED_MESSAGE.to_string());
                Err(e)
            },
        }
    }

    /// Open a mask editing session over the current photo and cutout
    pub async fn open_mask_editor(&self, loader: &RasterLoader) -> Result<MaskEditSession> {
        let original = self
            .original()
            .cloned()
            .ok_or_else(|| RefineError::load(SourceRole::Original, "no photo uploaded"))?;
        let cutout = self
            .cutout
            .clone()
            .ok_or_else(|| RefineError::load(SourceRole::Cutout, "no cutout available"))?;

        MaskEditSession::open(self.config.clone(), loader, original.into(), cutout.into()).await
    }

    /// Promote a saved session result to the current cutout
    pub fn commit_mask_edit(&mut self, saved: SavedCutout) {
        self.cutout = Some(saved.raster);
    }

    pub fn set_background(&mut self, background: BackgroundSpec) {
        self.background = background;
    }

    #[must_use]
    pub fn background(&self) -> &BackgroundSpec {
        &self.background
    }

    /// Raster to display: the original while comparing, else the cutout
    /// (falling back to the original before a cutout exists)
    #[must_use]
    pub fn preview(&self, comparing: bool) -> Option<&Raster> {
        if comparing {
            return self.original();
        }
        self.cutout.as_ref().or_else(|| self.original())
    }

    /// Composite the current cutout over the chosen background
    pub fn export(&self) -> Result<CompositeOutput> {
        let cutout = self
            .cutout
            .as_ref()
            .ok_or_else(|| RefineError::load(SourceRole::Cutout, "no cutout to export"))?;
        Compositor::new(&self.config).composite(cutout, &self.background)
    }

    /// Start over: photo, cutout, error and background are cleared
    pub fn reset(&mut self) {
        self.original = None;
        self.cutout = None;
        self.error = None;
        self.background = BackgroundSpec::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputEncoding;
    use async_trait::async_trait;
    use image::Rgba;

    struct FixedProvider(Raster);

    #[async_trait]
    impl CutoutProvider for FixedProvider {
        async fn remove_background(&self, _image: &[u8], _file_name: &str) -> Result<Raster> {
            Ok(self.0.clone())
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl CutoutProvider for FailingProvider {
        async fn remove_background(&self, _image: &[u8], _file_name: &str) -> Result<Raster> {
            Err(RefineError::Network("connection refused".to_string()))
        }
    }

    fn photo_bytes() -> Vec<u8> {
        RasterIO::encode_png(&Raster::filled(6, 4, Rgba([200, 100, 50, 255]))).unwrap()
    }

    #[tokio::test]
    async fn test_request_cutout_success() {
        let mut workspace = EditorWorkspace::default();
        workspace.set_original(photo_bytes(), "photo.png").unwrap();
        let cutout = Raster::filled(6, 4, Rgba([200, 100, 50, 0]));

        workspace.request_cutout(&FixedProvider(cutout.clone())).await.unwrap();
        assert_eq!(workspace.cutout(), Some(&cutout));
        assert!(workspace.error().is_none());
        assert_eq!(workspace.preview(false), Some(&cutout));
        assert_eq!(workspace.preview(true), workspace.original());
    }

    #[tokio::test]
    async fn test_request_cutout_failure_sets_message() {
        let mut workspace = EditorWorkspace::default();
        workspace.set_original(photo_bytes(), "photo.png").unwrap();

        assert!(workspace.request_cutout(&FailingProvider).await.is_err());
        assert_eq!(workspace.error(), Some(CONNECTION_FAILED_MESSAGE));
        assert!(workspace.cutout().is_none());
    }

    #[tokio::test]
    async fn test_request_without_photo() {
        let mut workspace = EditorWorkspace::default();
        let err = workspace.request_cutout(&FailingProvider).await.unwrap_err();
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_set_original_rejects_garbage() {
        let mut workspace = EditorWorkspace::default();
        assert!(workspace.set_original(b"nope".to_vec(), "x.png").is_err());
        assert!(workspace.original().is_none());
    }

    #[tokio::test]
    async fn test_edit_commit_and_export() {
        let mut workspace = EditorWorkspace::default();
        workspace.set_original(photo_bytes(), "photo.png").unwrap();
        workspace.set_cutout(Raster::filled(6, 4, Rgba([200, 100, 50, 255])));

        let mut session = workspace.open_mask_editor(&RasterLoader::default()).await.unwrap();
        session
            .apply_at_buffer(crate::types::BufferPoint::new(1.0, 1.0), 1.0)
            .unwrap();
        workspace.commit_mask_edit(session.save().unwrap());
        assert_eq!(workspace.cutout().unwrap().pixel(0, 0).unwrap()[3], 0);

        let export = workspace.export().unwrap();
        assert_eq!(export.encoding, OutputEncoding::Png);

        workspace.set_background(BackgroundSpec::parse_color("#000").unwrap());
        let export = workspace.export().unwrap();
        assert_eq!(export.encoding, OutputEncoding::Jpeg);
        assert_eq!(export.raster.pixel(0, 0), Some(Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut workspace = EditorWorkspace::default();
        workspace.set_original(photo_bytes(), "photo.png").unwrap();
        workspace.set_cutout(Raster::filled(6, 4, Rgba([0, 0, 0, 0])));
        workspace.set_background(BackgroundSpec::parse_color("white").unwrap());

        workspace.reset();
        assert!(workspace.original().is_none());
        assert!(workspace.cutout().is_none());
        assert!(workspace.background().is_transparent());
        assert!(workspace.export().is_err());
    }
}
