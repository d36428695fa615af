#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

//! # bgrefine
//!
//! Interactive mask refinement and compositing for background-removal
//! cutouts.
//!
//! A background removal service produces a cutout: the photo with its
//! background made transparent. Automatic cutouts are rarely perfect, so this
//! crate lets a user touch them up with a circular brush before exporting the
//! result over a new background.
//!
//! ## Features
//!
//! - **Coordinate mapping**: client pointer/touch positions to buffer pixels,
//!   independent of how the surface is scaled on screen
//! - **Brush engine**: circular erase (alpha to zero) and restore (copy back
//!   from the original photo)
//! - **Editing sessions**: an explicit state machine owning a private working
//!   buffer, with save and cancel semantics
//! - **Compositing**: transparent, solid color and cover-fitted image
//!   backgrounds, exported as PNG or JPEG
//! - **Remote provider**: multipart client for an HTTP `/remove-bg` service
//! - **CLI Integration**: optional command-line interface (enable with `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgrefine::{
//!     BackgroundSpec, Compositor, EditorConfig, MaskEditSession, PointerEvent,
//!     RasterLoader, RasterSource, StrokeCommand, SurfaceRect,
//! };
//! use std::path::PathBuf;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = EditorConfig::default();
//! let mut session = MaskEditSession::open(
//!     config.clone(),
//!     &RasterLoader::default(),
//!     RasterSource::Path(PathBuf::from("photo.jpg")),
//!     RasterSource::Path(PathBuf::from("cutout.png")),
//! )
//! .await?;
//!
//! // The surface is shown at 400x300 in the top-left corner of the window
//! session.set_display_rect(SurfaceRect::new(0.0, 0.0, 400.0, 300.0));
//! session.handle(StrokeCommand::Begin(PointerEvent::at(120.0, 80.0)))?;
//! session.handle(StrokeCommand::Continue(PointerEvent::at(130.0, 85.0)))?;
//! session.handle(StrokeCommand::End)?;
//!
//! let saved = session.save()?;
//! let output = Compositor::new(&config)
//!     .composite(&saved.raster, &BackgroundSpec::parse_color("#ffffff")?)?;
//! output.save_to_dir("out")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): command-line interface, progress spinner and log output
//! - `webp-support` (default): WebP decoding for photos, cutouts and backgrounds
//! - `tracing-json`: JSON log output for the CLI

pub mod brush;
pub mod compositor;
pub mod config;
pub mod error;
pub mod loader;
pub mod mapping;
pub mod remote;
pub mod services;
pub mod session;
pub mod types;
pub mod utils;
pub mod workspace;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod tracing_config;

pub use brush::{BrushEngine, BrushFootprint};
pub use compositor::{cover_fit, CompositeOutput, Compositor};
pub use config::{EditorConfig, EditorConfigBuilder, OutputEncoding};
pub use error::{RefineError, Result, SourceRole};
pub use loader::{RasterLoader, RasterSource};
pub use mapping::CoordinateMapper;
pub use remote::{CutoutProvider, RemoteRemover, CONNECTION_FAILED_MESSAGE};
pub use services::{OutputEncodingHandler, RasterIO};
pub use session::{MaskEditSession, SavedCutout, SessionState, StrokeCommand};
pub use types::{
    BackgroundColor, BackgroundSpec, BrushMode, BrushState, BufferPoint, ColorValue,
    PointerEvent, Raster, SurfaceRect, TouchPoint,
};
pub use utils::{ColorParser, PRESET_COLORS};
pub use workspace::EditorWorkspace;
