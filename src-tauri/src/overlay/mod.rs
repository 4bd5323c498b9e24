//! Overlay windows: which ones exist and what they look like.
//!
//! Window geometry is described by plain [`WindowSpec`] values so the shapes
//! can be checked without a display. [`OverlayHost`] is the seam to the
//! windowing system; [`TauriOverlays`] is the real implementation.

mod host;

pub use host::TauriOverlays;

use crate::bounds::CaptureBounds;

/// Event sent to a reused capture renderer so it drops its selection.
pub const CAPTURE_RESET_EVENT: &str = "capture-reset";

/// The three window kinds. At most one of each exists at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Overlay {
    /// Hidden window that keeps the process alive.
    Main,
    /// Full-screen drag-selection surface.
    Capture,
    /// Pinned, resizable frame around a region.
    Hollow,
}

impl Overlay {
    pub fn label(self) -> &'static str {
        match self {
            Overlay::Main => "main",
            Overlay::Capture => "capture",
            Overlay::Hollow => "hollow",
        }
    }

    pub fn page(self) -> &'static str {
        match self {
            Overlay::Main => "index.html",
            Overlay::Capture => "capture.html",
            Overlay::Hollow => "hollow.html",
        }
    }
}

/// Logical size of the primary display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub overlay: Overlay,
    pub title: &'static str,
    pub position: Option<(f64, f64)>,
    pub size: (f64, f64),
    pub visible: bool,
    pub decorations: bool,
    pub transparent: bool,
    pub always_on_top: bool,
    pub fullscreen: bool,
    pub skip_taskbar: bool,
    pub resizable: bool,
    /// Menu bar height handed to the renderer, for windows that have one.
    pub menu_height: Option<u32>,
}

impl WindowSpec {
    /// The hidden background window.
    pub fn main() -> Self {
        Self {
            overlay: Overlay::Main,
            title: "Snippy",
            position: None,
            size: (400.0, 300.0),
            visible: false,
            decorations: true,
            transparent: false,
            always_on_top: false,
            fullscreen: false,
            skip_taskbar: false,
            resizable: true,
            menu_height: None,
        }
    }

    /// Selection surface covering the whole primary display.
    pub fn capture(display: DisplaySize) -> Self {
        Self {
            overlay: Overlay::Capture,
            title: "Snippy Capture",
            position: Some((0.0, 0.0)),
            size: (display.width, display.height),
            visible: true,
            decorations: false,
            transparent: true,
            always_on_top: true,
            fullscreen: true,
            skip_taskbar: true,
            resizable: false,
            menu_height: None,
        }
    }

    /// Frame pinned over `bounds`, with a menu bar stacked on top of the
    /// captured area.
    pub fn hollow(bounds: CaptureBounds, menu_height: u32) -> Self {
        Self {
            overlay: Overlay::Hollow,
            title: "Snippy Frame",
            position: Some((bounds.x, bounds.y)),
            size: (bounds.width, bounds.height + f64::from(menu_height)),
            visible: true,
            decorations: false,
            transparent: true,
            always_on_top: true,
            fullscreen: false,
            skip_taskbar: false,
            resizable: true,
            menu_height: Some(menu_height),
        }
    }
}

/// Window operations the controller needs from the windowing system.
///
/// Operations on an overlay that is not open are no-ops.
pub trait OverlayHost: Send + Sync {
    fn is_open(&self, overlay: Overlay) -> bool;
    fn open(&self, spec: &WindowSpec) -> Result<(), OverlayError>;
    fn close(&self, overlay: Overlay) -> Result<(), OverlayError>;
    fn hide(&self, overlay: Overlay) -> Result<(), OverlayError>;
    fn show(&self, overlay: Overlay) -> Result<(), OverlayError>;
    fn focus(&self, overlay: Overlay) -> Result<(), OverlayError>;
    /// Emits [`CAPTURE_RESET_EVENT`] to the overlay's renderer.
    fn reset(&self, overlay: Overlay) -> Result<(), OverlayError>;
    /// Logical screen position of the overlay's content area, or `None`
    /// when the overlay is not open.
    fn inner_origin(&self, overlay: Overlay) -> Result<Option<(f64, f64)>, OverlayError>;
    fn primary_display(&self) -> Result<DisplaySize, OverlayError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error("Window operation failed: {0}")]
    Window(#[from] tauri::Error),

    #[error("No primary display found")]
    NoDisplay,
}
