//! Scripted brush input for non-interactive refinement
//!
//! A stroke script is a JSON document describing where the editing surface
//! sits on screen and the sequence of inputs a user would have made:
//!
//! ```json
//! {
//!   "surface": { "left": 0, "top": 0, "width": 400, "height": 300 },
//!   "steps": [
//!     { "mode": "erase" },
//!     { "brush_size": 30 },
//!     { "down": { "x": 100, "y": 100 } },
//!     { "move": { "x": 120, "y": 100 } },
//!     "up"
//!   ]
//! }
//! ```
//!
//! Step coordinates are client coordinates, mapped through the surface
//! rectangle exactly like live pointer input.

use crate::{
    session::{MaskEditSession, StrokeCommand},
    types::{BrushMode, PointerEvent, SurfaceRect},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Client-space position inside a script step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientPoint {
    pub x: f32,
    pub y: f32,
}

impl From<ClientPoint> for PointerEvent {
    fn from(point: ClientPoint) -> Self {
        PointerEvent::at(point.x, point.y)
    }
}

/// One scripted input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    Mode(BrushMode),
    BrushSize(u32),
    Down(ClientPoint),
    Move(ClientPoint),
    Up,
    /// Abandon the pass and keep the cutout as it was
    Cancel,
}

/// Parsed stroke script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokeScript {
    pub surface: SurfaceRect,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

/// What running a script did to the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Brush applications that touched at least one pixel
    pub applications: usize,
    /// Pixels touched across all applications (with repeats)
    pub pixels_touched: u64,
    /// Whether the script asked to discard the pass
    pub cancelled: bool,
}

impl StrokeScript {
    /// Read and parse a script file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stroke script {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid stroke script {}", path.display()))
    }

    /// Parse a script from JSON text
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Feed every step into `session`
    ///
    /// Stops early at a `cancel` step. Any stroke still open at the end is
    /// closed so the session is left `Ready`.
    pub fn run(&self, session: &mut MaskEditSession) -> Result<ScriptOutcome> {
        session.set_display_rect(self.surface);
        let mut outcome = ScriptOutcome::default();

        for (index, step) in self.steps.iter().enumerate() {
            let footprint = match step {
                ScriptStep::Mode(mode) => {
                    session.set_mode(*mode)?;
                    continue;
                },
                ScriptStep::BrushSize(size) => {
                    let applied = session.set_brush_size(*size)?;
                    if applied != *size {
                        debug!(step = index, requested = size, applied, "Brush size clamped");
                    }
                    continue;
                },
                ScriptStep::Down(point) => session.handle(StrokeCommand::Begin((*point).into()))?,
                ScriptStep::Move(point) => session.handle(StrokeCommand::Continue((*point).into()))?,
                ScriptStep::Up => session.handle(StrokeCommand::End)?,
                ScriptStep::Cancel => {
                    session.cancel()?;
                    outcome.cancelled = true;
                    return Ok(outcome);
                },
            };

            if !footprint.is_empty() {
                outcome.applications += 1;
                outcome.pixels_touched += footprint.pixels;
            }
        }

        session.end_stroke()?;
        Ok(outcome)
    }
}
