//! Mask editing session state machine
//!
//! A session owns the working buffer for one refinement pass. It is created in
//! `Initializing`, becomes `Ready` once both the original photo and the cutout
//! are decoded, alternates between `Ready` and `Editing` while strokes are
//! drawn, and ends either `Saved` or `Cancelled`.
//!
//! ```text
//! Initializing --load--> Ready <--begin/end--> Editing
//!                          |                      |
//!                          +--save--> Saved <-----+
//!                          +--cancel-> Cancelled <+
//! ```

use crate::{
    brush::{BrushEngine, BrushFootprint},
    config::EditorConfig,
    error::{RefineError, Result, SourceRole},
    loader::{RasterLoader, RasterSource},
    mapping::CoordinateMapper,
    services::RasterIO,
    types::{BrushMode, BrushState, BufferPoint, PointerEvent, Raster, SurfaceRect},
};
use image::RgbaImage;
use tracing::{debug, info, instrument, trace, warn};

/// Lifecycle state of a `MaskEditSession`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Sources are being decoded; input is ignored
    Initializing,
    /// Buffer is ready, no stroke in progress
    Ready,
    /// A stroke is in progress
    Editing,
    /// Buffer was handed to the caller
    Saved,
    /// Buffer was discarded
    Cancelled,
}

impl SessionState {
    /// Whether no further transitions are possible
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Saved | Self::Cancelled)
    }

    /// Whether brush input is accepted
    #[must_use]
    pub fn accepts_input(self) -> bool {
        matches!(self, Self::Ready | Self::Editing)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Ready => write!(f, "ready"),
            Self::Editing => write!(f, "editing"),
            Self::Saved => write!(f, "saved"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Discrete input commands derived from pointer events
#[derive(Debug, Clone, PartialEq)]
pub enum StrokeCommand {
    /// Pointer down / touch start
    Begin(PointerEvent),
    /// Pointer move / touch move
    Continue(PointerEvent),
    /// Pointer up, pointer leave or touch end
    End,
}

/// Result of saving a session
#[derive(Debug, Clone, PartialEq)]
pub struct SavedCutout {
    /// Edited cutout, ready to replace the previous one
    pub raster: Raster,
    /// The same pixels encoded as PNG
    pub png: Vec<u8>,
}

/// Ephemeral drag state, alive only while `Editing`
#[derive(Debug, Clone, Copy, Default)]
struct StrokeGesture {
    last: Option<BufferPoint>,
    applications: u32,
}

/// Interactive mask refinement over a private working buffer
#[derive(Debug)]
pub struct MaskEditSession {
    config: EditorConfig,
    state: SessionState,
    brush: BrushState,
    surface: SurfaceRect,
    original: Option<Raster>,
    buffer: Option<RgbaImage>,
    gesture: Option<StrokeGesture>,
    load_failure: Option<String>,
}

impl MaskEditSession {
    /// Create a session in `Initializing` with the configured default tool
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let brush = BrushState::new(
            config.default_mode,
            config.clamp_brush_size(config.default_brush_size),
        );
        Self {
            config,
            state: SessionState::Initializing,
            brush,
            surface: SurfaceRect::default(),
            original: None,
            buffer: None,
            gesture: None,
            load_failure: None,
        }
    }

    /// Create a session and load both sources
    pub async fn open(
        config: EditorConfig,
        loader: &RasterLoader,
        original: RasterSource,
        cutout: RasterSource,
    ) -> Result<Self> {
        let mut session = Self::new(config);
        session.load(loader, original, cutout).await?;
        Ok(session)
    }

    /// Decode the original photo and the cutout, then initialize the buffer
    ///
    /// Both decodes run concurrently and the session only becomes `Ready`
    /// once both have succeeded. If either fails the session stays in
    /// `Initializing`, no buffer is created and the failure is kept for
    /// `load_failure`.
    #[instrument(skip_all, fields(original = %original.describe(), cutout = %cutout.describe()))]
    pub async fn load(
        &mut self,
        loader: &RasterLoader,
        original: RasterSource,
        cutout: RasterSource,
    ) -> Result<()> {
        if self.state != SessionState::Initializing {
            return Err(self.closed_or(RefineError::internal(format!(
                "session already loaded ({})",
                self.state
            ))));
        }

        let joined = tokio::try_join!(
            loader.load(original, SourceRole::Original),
            loader.load(cutout, SourceRole::Cutout),
        );

        let (original, cutout) = match joined {
            Ok(rasters) => rasters,
            Err(e) => {
                warn!(error = %e, "Editing session failed to load its sources");
                self.load_failure = Some(e.to_string());
                return Err(e);
            },
        };

        if original.dimensions() != cutout.dimensions() {
            debug!(
                original = ?original.dimensions(),
                cutout = ?cutout.dimensions(),
                "Original and cutout sizes differ; restore only covers the overlap"
            );
        }

        self.buffer = Some(cutout.to_image());
        self.original = Some(original);
        self.load_failure = None;
        self.state = SessionState::Ready;

        info!(
            width = cutout.width(),
            height = cutout.height(),
            "Editing session ready"
        );
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Message of the last load failure, if loading failed
    #[must_use]
    pub fn load_failure(&self) -> Option<&str> {
        self.load_failure.as_deref()
    }

    #[must_use]
    pub fn brush(&self) -> BrushState {
        self.brush
    }

    #[must_use]
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Native dimensions of the working buffer, once ready
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.buffer.as_ref().map(RgbaImage::dimensions)
    }

    /// Mapper for the current layout, once the buffer exists
    #[must_use]
    pub fn mapper(&self) -> Option<CoordinateMapper> {
        self.dimensions()
            .map(|native| CoordinateMapper::new(self.surface, native))
    }

    /// Copy of the current buffer for display
    #[must_use]
    pub fn preview(&self) -> Option<Raster> {
        self.buffer.as_ref().map(|buffer| Raster::new(buffer.clone()))
    }

    /// Update where the surface is displayed on screen
    pub fn set_display_rect(&mut self, rect: SurfaceRect) {
        self.surface = rect;
    }

    /// Select the tool for subsequent applications
    pub fn set_mode(&mut self, mode: BrushMode) -> Result<()> {
        self.ensure_open()?;
        self.brush.mode = mode;
        Ok(())
    }

    /// Set the brush diameter, clamped to the configured range
    ///
    /// Returns the size that was actually applied.
    pub fn set_brush_size(&mut self, size: u32) -> Result<u32> {
        self.ensure_open()?;
        self.brush.size = self.config.clamp_brush_size(size);
        Ok(self.brush.size)
    }

    /// Feed one input command into the state machine
    pub fn handle(&mut self, command: StrokeCommand) -> Result<BrushFootprint> {
        match command {
            StrokeCommand::Begin(event) => self.begin_stroke(&event),
            StrokeCommand::Continue(event) => self.continue_stroke(&event),
            StrokeCommand::End => self.end_stroke().map(|()| BrushFootprint::default()),
        }
    }

    /// Start a stroke and apply the brush at the contact point
    pub fn begin_stroke(&mut self, event: &PointerEvent) -> Result<BrushFootprint> {
        self.ensure_open()?;
        if !self.state.accepts_input() {
            debug!(state = %self.state, "Ignoring stroke start before the session is ready");
            return Ok(BrushFootprint::default());
        }

        self.state = SessionState::Editing;
        self.gesture = Some(StrokeGesture::default());
        self.apply_at(event)
    }

    /// Apply the brush at a move event while a stroke is active
    pub fn continue_stroke(&mut self, event: &PointerEvent) -> Result<BrushFootprint> {
        self.ensure_open()?;
        if self.state != SessionState::Editing {
            trace!(state = %self.state, "Ignoring move without an active stroke");
            return Ok(BrushFootprint::default());
        }
        self.apply_at(event)
    }

    /// Finish the current stroke without touching the buffer
    pub fn end_stroke(&mut self) -> Result<()> {
        self.ensure_open()?;
        if let Some(gesture) = self.gesture.take() {
            debug!(
                applications = gesture.applications,
                last = ?gesture.last,
                "Stroke finished"
            );
        }
        if self.state == SessionState::Editing {
            self.state = SessionState::Ready;
        }
        Ok(())
    }

    /// Apply the brush once at a pointer position
    ///
    /// Does nothing when the surface is not laid out yet or the event has no
    /// contact point.
    pub fn apply_at(&mut self, event: &PointerEvent) -> Result<BrushFootprint> {
        self.ensure_open()?;
        let Some(mapper) = self.mapper() else {
            debug!("Ignoring brush input before the buffer exists");
            return Ok(BrushFootprint::default());
        };
        let (Some(point), Some(scale)) = (mapper.map(event), mapper.brush_scale()) else {
            debug!(surface = ?self.surface, "Ignoring brush input before the surface is laid out");
            return Ok(BrushFootprint::default());
        };

        let radius = self.brush.clip_radius(scale);
        self.apply_at_buffer(point, radius)
    }

    /// Apply the current tool at a buffer position with an explicit clip radius
    /// in buffer pixels
    pub fn apply_at_buffer(&mut self, point: BufferPoint, radius: f32) -> Result<BrushFootprint> {
        self.ensure_open()?;
        let (Some(buffer), Some(original)) = (self.buffer.as_mut(), self.original.as_ref()) else {
            debug!("Ignoring brush input before the session is ready");
            return Ok(BrushFootprint::default());
        };

        let footprint = BrushEngine::apply(buffer, original.pixels(), point, radius, self.brush.mode);
        trace!(
            mode = %self.brush.mode,
            x = point.x,
            y = point.y,
            radius,
            pixels = footprint.pixels,
            "Brush applied"
        );

        if let Some(gesture) = self.gesture.as_mut() {
            gesture.last = Some(point);
            gesture.applications += 1;
        }
        Ok(footprint)
    }

    /// Finalize the buffer and hand it to the caller
    ///
    /// The session becomes `Saved`; further input is rejected.
    #[instrument(skip(self), fields(state = %self.state))]
    pub fn save(&mut self) -> Result<SavedCutout> {
        self.ensure_open()?;
        let buffer = self.buffer.as_ref().ok_or(RefineError::SessionNotReady)?;

        let raster = Raster::new(buffer.clone());
        let png = RasterIO::encode_png(&raster)?;

        self.buffer = None;
        self.original = None;
        self.gesture = None;
        self.state = SessionState::Saved;

        info!(
            width = raster.width(),
            height = raster.height(),
            bytes = png.len(),
            "Editing session saved"
        );
        Ok(SavedCutout { raster, png })
    }

    /// Discard the buffer; the caller's cutout stays as it was
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.buffer = None;
        self.original = None;
        self.gesture = None;
        self.state = SessionState::Cancelled;
        info!("Editing session cancelled");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state.is_terminal() {
            return Err(RefineError::SessionClosed(self.state.to_string()));
        }
        Ok(())
    }

    fn closed_or(&self, error: RefineError) -> RefineError {
        if self.state.is_terminal() {
            RefineError::SessionClosed(self.state.to_string())
        } else {
            error
        }
    }
}
