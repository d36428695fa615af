//! Display-to-buffer coordinate mapping
//!
//! The editing surface is shown scaled to fit the screen while its backing
//! buffer keeps the cutout's native resolution. Every pointer position has to
//! be rescaled before it can address buffer pixels.

use crate::types::{BufferPoint, PointerEvent, SurfaceRect};

/// Maps client-space pointer positions onto native buffer pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    rect: SurfaceRect,
    native: (u32, u32),
}

impl CoordinateMapper {
    /// Create a mapper for a surface laid out at `rect` and backed by a
    /// buffer of `native` dimensions
    #[must_use]
    pub fn new(rect: SurfaceRect, native: (u32, u32)) -> Self {
        Self { rect, native }
    }

    /// Whether the surface is laid out and a scale can be established
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.scale().is_some()
    }

    /// Per-axis buffer pixels per display pixel, `None` until laid out
    #[must_use]
    pub fn scale(&self) -> Option<(f32, f32)> {
        if !self.rect.is_laid_out() {
            return None;
        }
        Some((
            self.native.0 as f32 / self.rect.width,
            self.native.1 as f32 / self.rect.height,
        ))
    }

    /// Single factor for converting display lengths (brush size) to buffer
    /// lengths; the mean of both axes so non-uniform layouts stay usable
    #[must_use]
    pub fn brush_scale(&self) -> Option<f32> {
        self.scale().map(|(sx, sy)| (sx + sy) / 2.0)
    }

    /// Map a client position to buffer coordinates
    #[must_use]
    pub fn map_client(&self, client_x: f32, client_y: f32) -> Option<BufferPoint> {
        let (scale_x, scale_y) = self.scale()?;
        Some(BufferPoint::new(
            (client_x - self.rect.left) * scale_x,
            (client_y - self.rect.top) * scale_y,
        ))
    }

    /// Map a pointer or touch event to buffer coordinates
    ///
    /// Returns `None` when the surface is not laid out yet or the event has
    /// no contact point. Only the first touch point is considered.
    #[must_use]
    pub fn map(&self, event: &PointerEvent) -> Option<BufferPoint> {
        let (client_x, client_y) = event.contact()?;
        self.map_client(client_x, client_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TouchPoint;

    fn mapper() -> CoordinateMapper {
        // 400x300 buffer displayed at half size, offset by (50, 20)
        CoordinateMapper::new(SurfaceRect::new(50.0, 20.0, 200.0, 150.0), (400, 300))
    }

    #[test]
    fn test_scale() {
        assert_eq!(mapper().scale(), Some((2.0, 2.0)));
        assert_eq!(mapper().brush_scale(), Some(2.0));
    }

    #[test]
    fn test_map_pointer() {
        let point = mapper().map(&PointerEvent::at(100.0, 70.0)).unwrap();
        assert_eq!(point, BufferPoint::new(100.0, 100.0));

        let origin = mapper().map(&PointerEvent::at(50.0, 20.0)).unwrap();
        assert_eq!(origin, BufferPoint::new(0.0, 0.0));
    }

    #[test]
    fn test_touch_matches_pointer() {
        let touch = PointerEvent::touch(vec![
            TouchPoint {
                client_x: 100.0,
                client_y: 70.0,
            },
            TouchPoint {
                client_x: 0.0,
                client_y: 0.0,
            },
        ]);
        assert_eq!(mapper().map(&touch), mapper().map(&PointerEvent::at(100.0, 70.0)));
        assert_eq!(mapper().map(&PointerEvent::touch(vec![])), None);
    }

    #[test]
    fn test_not_ready_without_layout() {
        let unready = CoordinateMapper::new(SurfaceRect::new(0.0, 0.0, 0.0, 150.0), (400, 300));
        assert!(!unready.is_ready());
        assert_eq!(unready.map(&PointerEvent::at(10.0, 10.0)), None);
        assert_eq!(unready.brush_scale(), None);
    }

    #[test]
    fn test_non_uniform_scale() {
        let mapper = CoordinateMapper::new(SurfaceRect::new(0.0, 0.0, 100.0, 100.0), (400, 200));
        assert_eq!(mapper.scale(), Some((4.0, 2.0)));
        assert_eq!(mapper.brush_scale(), Some(3.0));
        assert_eq!(
            mapper.map(&PointerEvent::at(10.0, 10.0)),
            Some(BufferPoint::new(40.0, 20.0))
        );
    }

    #[test]
    fn test_inside_surface_maps_inside_buffer() {
        let mapper = mapper();
        let mut client_y = 20.0;
        while client_y < 170.0 {
            let mut client_x = 50.0;
            while client_x < 250.0 {
                let point = mapper.map_client(client_x, client_y).unwrap();
                assert!(point.x >= 0.0 && point.x < 400.0, "x out of range: {point:?}");
                assert!(point.y >= 0.0 && point.y < 300.0, "y out of range: {point:?}");
                client_x += 12.5;
            }
            client_y += 7.5;
        }
    }
}
