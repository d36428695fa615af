//! Circular brush applications on the working buffer
//!
//! A drag gesture is applied as a sequence of independent circular edits, one
//! per pointer move. Gaps between edits during fast drags are not filled in.

use crate::types::{BrushMode, BufferPoint};
use image::RgbaImage;

/// Pixel region touched by one brush application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BrushFootprint {
    /// Number of buffer pixels inside the clip circle
    pub pixels: u64,
    /// Bounding box `(x0, y0, x1, y1)`, end-exclusive, when anything was touched
    pub bounds: Option<(u32, u32, u32, u32)>,
}

impl BrushFootprint {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels == 0
    }
}

/// Applies erase / restore edits clipped to a circle
#[derive(Debug, Clone, Copy, Default)]
pub struct BrushEngine;

impl BrushEngine {
    /// Apply one circular edit centred at `center` with a clip radius of
    /// `radius` buffer pixels
    ///
    /// A pixel belongs to the circle when its centre lies within `radius` of
    /// `center`. Only in-bounds pixels are touched. In `Restore` mode each
    /// pixel is overwritten by the `original` pixel at the same coordinates;
    /// pixels outside the original's extent stay as they are.
    pub fn apply(
        buffer: &mut RgbaImage,
        original: &RgbaImage,
        center: BufferPoint,
        radius: f32,
        mode: BrushMode,
    ) -> BrushFootprint {
        if !(radius > 0.0 && radius.is_finite() && center.x.is_finite() && center.y.is_finite()) {
            return BrushFootprint::default();
        }

        let (width, height) = buffer.dimensions();
        let Some((x_range, y_range)) = Self::clip_bounds(center, radius, width, height) else {
            return BrushFootprint::default();
        };

        let radius_sq = radius * radius;
        let mut footprint = BrushFootprint::default();
        let mut bounds: Option<(u32, u32, u32, u32)> = None;

        for y in y_range {
            let dy = y as f32 + 0.5 - center.y;
            for x in x_range.clone() {
                let dx = x as f32 + 0.5 - center.x;
                if dx * dx + dy * dy > radius_sq {
                    continue;
                }

                let pixel = buffer.get_pixel_mut(x, y);
                match mode {
                    BrushMode::Erase => pixel[3] = 0,
                    BrushMode::Restore => {
                        if let Some(source) = original.get_pixel_checked(x, y) {
                            *pixel = *source;
                        }
                    },
                }

                footprint.pixels += 1;
                bounds = Some(match bounds {
                    None => (x, y, x + 1, y + 1),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x + 1), y1.max(y + 1)),
                });
            }
        }

        footprint.bounds = bounds;
        footprint
    }

    /// In-bounds pixel ranges that may intersect the circle
    fn clip_bounds(
        center: BufferPoint,
        radius: f32,
        width: u32,
        height: u32,
    ) -> Option<(std::ops::Range<u32>, std::ops::Range<u32>)> {
        let axis = |c: f32, limit: u32| -> Option<std::ops::Range<u32>> {
            // Pixel i is a candidate when c - r <= i + 0.5 <= c + r
            let start = (f64::from(c) - f64::from(radius) - 0.5).ceil().max(0.0);
            let end = ((f64::from(c) + f64::from(radius) - 0.5).floor() + 1.0).min(f64::from(limit));
            if end <= start {
                return None;
            }
            Some(start as u32..end as u32)
        };

        Some((axis(center.x, width)?, axis(center.y, height)?))
    }
}
