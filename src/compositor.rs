//! Final render pipeline for export
//!
//! Flattens a foreground cutout over the chosen background. The foreground's
//! native resolution is authoritative; backgrounds are fitted to it.

use crate::{
    config::{EditorConfig, OutputEncoding},
    error::Result,
    services::{OutputEncodingHandler, RasterIO},
    types::{BackgroundSpec, ColorValue, Raster},
};
use chrono::Utc;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// Flattened export artifact
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeOutput {
    /// Output pixels at the foreground's native resolution
    pub raster: Raster,
    /// Recommended encoding
    pub encoding: OutputEncoding,
    /// Suggested file name, `<prefix>_<timestamp>.<ext>`
    pub file_name: String,
    jpeg_quality: u8,
}

impl CompositeOutput {
    /// Encode the output with its recommended encoding
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        OutputEncodingHandler::encode(self.raster.to_image(), self.encoding, self.jpeg_quality)
    }

    /// MIME type matching `encoding`
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        OutputEncodingHandler::mime_type(self.encoding)
    }

    /// Encode and write into `dir` under the suggested file name
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        RasterIO::write_bytes(&self.to_bytes()?, &path)?;
        Ok(path)
    }
}

/// Renders foreground + background into an exportable raster
#[derive(Debug, Clone)]
pub struct Compositor {
    jpeg_quality: u8,
    file_prefix: String,
}

impl Compositor {
    #[must_use]
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            jpeg_quality: config.jpeg_quality,
            file_prefix: config.file_prefix.clone(),
        }
    }

    /// Composite using the current time for the file name
    pub fn composite(&self, foreground: &Raster, background: &BackgroundSpec) -> Result<CompositeOutput> {
        self.composite_at(foreground, background, Utc::now().timestamp_millis())
    }

    /// Composite with an explicit millisecond timestamp for the file name
    #[instrument(
        skip(self, foreground, background),
        fields(
            background = background.kind(),
            dimensions = %format!("{}x{}", foreground.width(), foreground.height())
        )
    )]
    pub fn composite_at(
        &self,
        foreground: &Raster,
        background: &BackgroundSpec,
        timestamp_millis: i64,
    ) -> Result<CompositeOutput> {
        let (width, height) = foreground.dimensions();

        let output = match background {
            BackgroundSpec::Color(ColorValue::Transparent) => foreground.to_image(),
            BackgroundSpec::Color(ColorValue::Solid(color)) => {
                let mut surface = RgbaImage::from_pixel(width, height, color.to_rgba());
                draw_over(&mut surface, foreground.pixels());
                surface
            },
            BackgroundSpec::Image(image) => {
                let mut surface = cover_fit(image.pixels(), width, height);
                draw_over(&mut surface, foreground.pixels());
                // The background image may itself carry alpha; the export is opaque
                flatten_onto_black(&mut surface);
                surface
            },
        };

        let encoding = OutputEncodingHandler::for_background(background.is_transparent());
        let file_name = format!(
            "{}_{}.{}",
            self.file_prefix,
            timestamp_millis,
            OutputEncodingHandler::get_extension(encoding)
        );

        debug!(encoding = %encoding, file_name = %file_name, "Composite rendered");

        Ok(CompositeOutput {
            raster: Raster::new(output),
            encoding,
            file_name,
            jpeg_quality: self.jpeg_quality,
        })
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

/// Scale `source` to cover `width` x `height`, centred, nearest-neighbour
///
/// The source keeps its aspect ratio; whatever overflows the target on one
/// axis is cropped evenly on both sides.
pub fn cover_fit(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return RgbaImage::new(width, height);
    }

    let scale = f64::max(
        f64::from(width) / f64::from(src_w),
        f64::from(height) / f64::from(src_h),
    );
    let offset_x = (f64::from(src_w) * scale - f64::from(width)) / 2.0;
    let offset_y = (f64::from(src_h) * scale - f64::from(height)) / 2.0;

    RgbaImage::from_fn(width, height, |x, y| {
        let sx = ((f64::from(x) + 0.5 + offset_x) / scale).floor();
        let sy = ((f64::from(y) + 0.5 + offset_y) / scale).floor();
        let sx = (sx.max(0.0) as u32).min(src_w - 1);
        let sy = (sy.max(0.0) as u32).min(src_h - 1);
        *source.get_pixel(sx, sy)
    })
}

/// Source-over draw of `foreground` at the origin of `surface`
fn draw_over(surface: &mut RgbaImage, foreground: &RgbaImage) {
    for (x, y, dst) in surface.enumerate_pixels_mut() {
        if let Some(src) = foreground.get_pixel_checked(x, y) {
            *dst = source_over(*src, *dst);
        }
    }
}

/// Composite every pixel over opaque black so the surface has no alpha left
fn flatten_onto_black(surface: &mut RgbaImage) {
    for pixel in surface.pixels_mut() {
        let alpha = pixel.0[3];
        if alpha == u8::MAX {
            continue;
        }
        let scale = |c: u8| ((u16::from(c) * u16::from(alpha) + 127) / 255) as u8;
        *pixel = Rgba([scale(pixel.0[0]), scale(pixel.0[1]), scale(pixel.0[2]), u8::MAX]);
    }
}

/// Porter-Duff source-over on straight (non-premultiplied) alpha
fn source_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let [sr, sg, sb, sa] = src.0;
    match sa {
        u8::MAX => return src,
        0 => return dst,
        _ => {},
    }

    let sa = f32::from(sa) / 255.0;
    let da = f32::from(dst.0[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);

    let channel = |s: u8, d: u8| -> u8 {
        let value = (f32::from(s) * sa + f32::from(d) * da * (1.0 - sa)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(sr, dst.0[0]),
        channel(sg, dst.0[1]),
        channel(sb, dst.0[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BackgroundColor;

    fn half_cut_foreground() -> Raster {
        // Left half opaque green subject, right half fully transparent
        Raster::new(RgbaImage::from_fn(8, 4, |x, _| {
            if x < 4 {
                Rgba([0, 200, 0, 255])
            } else {
                Rgba([9, 9, 9, 0])
            }
        }))
    }

    #[test]
    fn test_solid_color_background() {
        let output = Compositor::default()
            .composite_at(
                &half_cut_foreground(),
                &BackgroundSpec::parse_color("#ff0000").unwrap(),
                1_700_000_000_000,
            )
            .unwrap();

        assert_eq!(output.encoding, OutputEncoding::Jpeg);
        assert_eq!(output.file_name, "removed_bg_1700000000000.jpg");
        assert_eq!(output.raster.pixel(1, 1), Some(Rgba([0, 200, 0, 255])));
        assert_eq!(output.raster.pixel(6, 2), Some(Rgba([255, 0, 0, 255])));
        assert!(output.raster.is_fully_opaque());
    }

    #[test]
    fn test_transparent_background_is_identity() {
        let foreground = half_cut_foreground();
        let output = Compositor::default()
            .composite_at(&foreground, &BackgroundSpec::default(), 42)
            .unwrap();

        assert_eq!(output.encoding, OutputEncoding::Png);
        assert_eq!(output.file_name, "removed_bg_42.png");
        assert_eq!(output.raster, foreground);
    }

    #[test]
    fn test_partial_alpha_blends() {
        let foreground = Raster::filled(1, 1, Rgba([255, 255, 255, 128]));
        let background = BackgroundSpec::Color(ColorValue::Solid(BackgroundColor::black()));
        let output = Compositor::default().composite_at(&foreground, &background, 0).unwrap();
        let pixel = output.raster.pixel(0, 0).unwrap();
        assert_eq!(pixel[3], 255);
        assert!((127..=129).contains(&pixel[0]));
    }

    #[test]
    fn test_image_background_cover_fit() {
        // 2x1 background: left blue, right yellow; output is square so the
        // background is scaled up and cropped horizontally
        let background = Raster::new(RgbaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([0, 0, 255, 255])
            } else {
                Rgba([255, 255, 0, 255])
            }
        }));
        let foreground = Raster::filled(4, 4, Rgba([0, 0, 0, 0]));
        let output = Compositor::default()
            .composite_at(&foreground, &BackgroundSpec::Image(background), 7)
            .unwrap();

        assert_eq!(output.encoding, OutputEncoding::Jpeg);
        assert_eq!(output.raster.dimensions(), (4, 4));
        assert_eq!(output.raster.pixel(0, 0), Some(Rgba([0, 0, 255, 255])));
        assert_eq!(output.raster.pixel(3, 3), Some(Rgba([255, 255, 0, 255])));
    }

    #[test]
    fn test_translucent_image_background_is_flattened() {
        let background = Raster::new(RgbaImage::from_fn(2, 2, |x, _| {
            if x == 0 {
                Rgba([250, 250, 250, 0])
            } else {
                Rgba([200, 100, 50, 255])
            }
        }));
        let foreground = Raster::filled(4, 4, Rgba([0, 0, 0, 0]));
        let output = Compositor::default()
            .composite_at(&foreground, &BackgroundSpec::Image(background), 3)
            .unwrap();

        assert_eq!(output.encoding, OutputEncoding::Jpeg);
        assert!(output.raster.is_fully_opaque());
        assert_eq!(output.raster.pixel(0, 0), Some(Rgba([0, 0, 0, 255])));
        assert_eq!(output.raster.pixel(3, 0), Some(Rgba([200, 100, 50, 255])));
    }

    #[test]
    fn test_flatten_scales_by_alpha() {
        let mut surface = RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]));
        flatten_onto_black(&mut surface);
        assert_eq!(*surface.get_pixel(0, 0), Rgba([100, 50, 0, 255]));
    }

    #[test]
    fn test_cover_fit_dimensions() {
        let source = RgbaImage::from_pixel(10, 30, Rgba([1, 2, 3, 255]));
        let fitted = cover_fit(&source, 40, 20);
        assert_eq!(fitted.dimensions(), (40, 20));
        assert!(fitted.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));

        let empty = cover_fit(&RgbaImage::new(0, 0), 3, 3);
        assert_eq!(empty.dimensions(), (3, 3));
    }

    #[test]
    fn test_output_bytes_and_save() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = Compositor::default()
            .composite_at(&half_cut_foreground(), &BackgroundSpec::default(), 5)
            .unwrap();
        assert_eq!(output.mime_type(), "image/png");

        let path = output.save_to_dir(temp_dir.path()).unwrap();
        assert!(path.ends_with("removed_bg_5.png"));
        let reloaded = RasterIO::load_raster(&path).unwrap();
        assert_eq!(reloaded, output.raster);
    }
}
