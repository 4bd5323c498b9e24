//! Capture bounds as reported by the renderers, and their mapping onto
//! the pixels of a captured display image.

use serde::{Deserialize, Serialize};

/// Rectangle in logical screen coordinates (CSS pixels).
///
/// Renderers report fractional values, so every field is `f64`. The origin
/// is the top-left corner of the primary display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Rectangle in physical pixels inside a captured image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// True when both dimensions are strictly positive.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// The same rectangle moved by `dx`, `dy`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Scales the bounds to physical pixels and clips them to an image of
    /// `image_width` x `image_height`.
    ///
    /// Origin and size are scaled and rounded independently. Returns `None`
    /// when the bounds have no area or fall entirely outside the image.
    pub fn to_pixels(
        &self,
        scale_factor: f64,
        image_width: u32,
        image_height: u32,
    ) -> Option<PixelRegion> {
        if !self.has_area() || !scale_factor.is_finite() || scale_factor <= 0.0 {
            return None;
        }

        let left = (self.x * scale_factor).round() as i64;
        let top = (self.y * scale_factor).round() as i64;
        // Casts saturate, so huge renderer values must not overflow here.
        let right = left.saturating_add((self.width * scale_factor).round() as i64);
        let bottom = top.saturating_add((self.height * scale_factor).round() as i64);

        let (x0, x1) = clip_span(left, right, image_width)?;
        let (y0, y1) = clip_span(top, bottom, image_height)?;

        Some(PixelRegion {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

fn clip_span(start: i64, end: i64, limit: u32) -> Option<(u32, u32)> {
    let start = start.clamp(0, limit as i64) as u32;
    let end = end.clamp(0, limit as i64) as u32;
    (end > start).then_some((start, end))
}

impl std::fmt::Display for CaptureBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{} at {},{}",
            self.width, self.height, self.x, self.y
        )
    }
}
