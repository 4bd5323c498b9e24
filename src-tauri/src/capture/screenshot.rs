//! Full-screen capture using the `xcap` crate.
//!
//! This is the infrastructure layer. It talks to the OS.

use super::{ScreenCapture, ScreenSource};
use xcap::Monitor;

/// The primary display, as reported by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryMonitor;

impl ScreenSource for PrimaryMonitor {
    fn capture(&self) -> Result<ScreenCapture, CaptureError> {
        capture_primary_monitor()
    }
}

/// Captures the primary monitor at its native resolution.
///
/// The caller is responsible for cropping to the user's selection.
fn capture_primary_monitor() -> Result<ScreenCapture, CaptureError> {
    let monitors = Monitor::all().map_err(|e| CaptureError::MonitorEnumeration(e.to_string()))?;

    // Fallback: if no monitor reports as primary, use the first one
    let primary_index = monitors
        .iter()
        .position(|m| m.is_primary().unwrap_or(false))
        .unwrap_or(0);
    let primary = monitors
        .into_iter()
        .nth(primary_index)
        .ok_or(CaptureError::NoPrimaryMonitor)?;

    let scale_factor = primary.scale_factor().map(f64::from).unwrap_or_else(|e| {
        log::warn!("Could not read display scale factor, assuming 1.0: {}", e);
        1.0
    });

    let image = primary
        .capture_image()
        .map_err(|e| CaptureError::CaptureFailed(e.to_string()))?;

    log::debug!(
        "Captured primary display {}x{} (scale {})",
        image.width(),
        image.height(),
        scale_factor
    );

    Ok(ScreenCapture {
        image,
        scale_factor,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to enumerate monitors: {0}")]
    MonitorEnumeration(String),

    #[error("No primary monitor found")]
    NoPrimaryMonitor,

    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),
}
