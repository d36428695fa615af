//! Core types shared by the editing session and the compositor

use crate::{error::Result, utils::ColorParser};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Immutable decoded RGBA8 image
///
/// Cloning is cheap: the pixel data is shared. A `Raster` is never mutated in
/// place; editing happens on a private working buffer copied from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pixels: Arc<RgbaImage>,
}

impl Raster {
    /// Wrap an owned RGBA image
    #[must_use]
    pub fn new(image: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(image),
        }
    }

    /// Convert any decoded image to RGBA8
    #[must_use]
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }

    /// Create a raster filled with a single pixel value
    #[must_use]
    pub fn filled(width: u32, height: u32, pixel: Rgba<u8>) -> Self {
        Self::new(RgbaImage::from_pixel(width, height, pixel))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Native resolution as `(width, height)`
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    /// Borrow the underlying pixels
    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        self.pixels.get_pixel_checked(x, y).copied()
    }

    /// Owned copy of the pixels, used to seed a working buffer
    #[must_use]
    pub fn to_image(&self) -> RgbaImage {
        self.pixels.as_ref().clone()
    }

    /// Whether every pixel has full alpha
    #[must_use]
    pub fn is_fully_opaque(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == u8::MAX)
    }
}

impl From<RgbaImage> for Raster {
    fn from(image: RgbaImage) -> Self {
        Self::new(image)
    }
}

/// Brush tool mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    /// Make pixels fully transparent
    #[default]
    Erase,
    /// Paint back pixels of the original photo
    Restore,
}

impl std::fmt::Display for BrushMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Erase => write!(f, "erase"),
            Self::Restore => write!(f, "restore"),
        }
    }
}

/// Current tool selection
///
/// `size` is the diameter shown to the user, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushState {
    pub mode: BrushMode,
    pub size: u32,
}

impl BrushState {
    #[must_use]
    pub fn new(mode: BrushMode, size: u32) -> Self {
        Self { mode, size }
    }

    /// Clip radius in buffer pixels for a given display-to-buffer scale
    #[must_use]
    pub fn clip_radius(&self, scale: f32) -> f32 {
        self.size as f32 * scale / 2.0
    }
}

/// Position in working-buffer pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferPoint {
    pub x: f32,
    pub y: f32,
}

impl BufferPoint {
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// On-screen bounding rectangle of the editing surface, in client pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    #[must_use]
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Whether the surface has a usable, non-empty layout
    #[must_use]
    pub fn is_laid_out(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One contact point of a touch event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub client_x: f32,
    pub client_y: f32,
}

/// Input event delivered by the host, in client coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    /// Mouse or pen input with a single position
    Pointer { client_x: f32, client_y: f32 },
    /// Touch input; only the first contact point is used
    Touch { touches: Vec<TouchPoint> },
}

impl PointerEvent {
    /// Single-point pointer event
    #[must_use]
    pub fn at(client_x: f32, client_y: f32) -> Self {
        Self::Pointer { client_x, client_y }
    }

    /// Touch event with the given contact points
    #[must_use]
    pub fn touch(touches: Vec<TouchPoint>) -> Self {
        Self::Touch { touches }
    }

    /// Authoritative client position of this event
    #[must_use]
    pub fn contact(&self) -> Option<(f32, f32)> {
        match self {
            Self::Pointer { client_x, client_y } => Some((*client_x, *client_y)),
            Self::Touch { touches } => touches.first().map(|t| (t.client_x, t.client_y)),
        }
    }
}

/// Opaque RGB background color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl BackgroundColor {
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn white() -> Self {
        Self::new(255, 255, 255)
    }

    #[must_use]
    pub fn black() -> Self {
        Self::new(0, 0, 0)
    }

    #[must_use]
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, u8::MAX])
    }
}

/// Color value of a background, with `transparent` reserved for "no layer"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorValue {
    #[default]
    Transparent,
    Solid(BackgroundColor),
}

impl ColorValue {
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }
}

impl std::str::FromStr for ColorValue {
    type Err = crate::error::RefineError;

    fn from_str(s: &str) -> Result<Self> {
        ColorParser::parse(s)
    }
}

impl std::fmt::Display for ColorValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transparent => write!(f, "transparent"),
            Self::Solid(color) => write!(f, "{}", ColorParser::to_hex(color, true)),
        }
    }
}

/// Background chosen for export
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSpec {
    /// Flat color, or no background when transparent
    Color(ColorValue),
    /// Image fitted to cover the output
    Image(Raster),
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        Self::Color(ColorValue::Transparent)
    }
}

impl BackgroundSpec {
    /// Parse a CSS-style color string into a color background
    pub fn parse_color(value: &str) -> Result<Self> {
        Ok(Self::Color(value.parse()?))
    }

    /// Whether no background layer is drawn
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        matches!(self, Self::Color(ColorValue::Transparent))
    }

    /// Short label for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Color(ColorValue::Transparent) => "transparent",
            Self::Color(ColorValue::Solid(_)) => "color",
            Self::Image(_) => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_shares_pixels_on_clone() {
        let raster = Raster::filled(3, 2, Rgba([1, 2, 3, 4]));
        let clone = raster.clone();
        assert_eq!(raster, clone);
        assert_eq!(clone.dimensions(), (3, 2));
        assert_eq!(clone.pixel(2, 1), Some(Rgba([1, 2, 3, 4])));
        assert_eq!(clone.pixel(3, 0), None);
    }

    #[test]
    fn test_raster_opacity() {
        assert!(Raster::filled(2, 2, Rgba([0, 0, 0, 255])).is_fully_opaque());
        assert!(!Raster::filled(2, 2, Rgba([0, 0, 0, 254])).is_fully_opaque());
    }

    #[test]
    fn test_clip_radius_halves_size() {
        let brush = BrushState::new(BrushMode::Erase, 30);
        assert!((brush.clip_radius(1.0) - 15.0).abs() < f32::EPSILON);
        assert!((brush.clip_radius(2.0) - 30.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_pointer_contact_uses_first_touch() {
        let event = PointerEvent::touch(vec![
            TouchPoint {
                client_x: 10.0,
                client_y: 20.0,
            },
            TouchPoint {
                client_x: 99.0,
                client_y: 99.0,
            },
        ]);
        assert_eq!(event.contact(), Some((10.0, 20.0)));
        assert_eq!(PointerEvent::touch(vec![]).contact(), None);
        assert_eq!(PointerEvent::at(1.5, 2.5).contact(), Some((1.5, 2.5)));
    }

    #[test]
    fn test_surface_layout() {
        assert!(SurfaceRect::new(0.0, 0.0, 10.0, 10.0).is_laid_out());
        assert!(!SurfaceRect::new(0.0, 0.0, 0.0, 10.0).is_laid_out());
        assert!(!SurfaceRect::default().is_laid_out());
        assert!(!SurfaceRect::new(0.0, 0.0, f32::NAN, 10.0).is_laid_out());
    }

    #[test]
    fn test_background_spec() {
        assert!(BackgroundSpec::default().is_transparent());
        let red = BackgroundSpec::parse_color("#ff0000").unwrap();
        assert_eq!(
            red,
            BackgroundSpec::Color(ColorValue::Solid(BackgroundColor::new(255, 0, 0)))
        );
        assert_eq!(red.kind(), "color");
        assert!(BackgroundSpec::parse_color("transparent")
            .unwrap()
            .is_transparent());
        assert!(BackgroundSpec::parse_color("not-a-color").is_err());
    }

    #[test]
    fn test_brush_mode_serde() {
        let mode: BrushMode = serde_json::from_str("\"restore\"").unwrap();
        assert_eq!(mode, BrushMode::Restore);
        assert_eq!(serde_json::to_string(&BrushMode::Erase).unwrap(), "\"erase\"");
    }
}
