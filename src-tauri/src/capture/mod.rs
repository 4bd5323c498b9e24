//! Screen capture domain: public API.
//!
//! `screenshot` talks to the OS, `region` is pure pixel work. The
//! controller only sees the [`ScreenSource`] trait so it can be driven
//! by a fake display in tests.

mod region;
mod screenshot;

pub use region::{crop_region, CropError};
pub use screenshot::{CaptureError, PrimaryMonitor};

use image::RgbaImage;

/// One full-display capture plus the factor that maps logical
/// coordinates onto its pixels.
#[derive(Debug, Clone)]
pub struct ScreenCapture {
    pub image: RgbaImage,
    pub scale_factor: f64,
}

/// Something that can grab the current contents of the primary display.
pub trait ScreenSource: Send + Sync + 'static {
    fn capture(&self) -> Result<ScreenCapture, CaptureError>;
}
