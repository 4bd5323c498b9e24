//! System clipboard writes via `arboard`.

use arboard::{Clipboard, ImageData};
use image::RgbaImage;
use std::borrow::Cow;
use std::sync::Mutex;

/// Destination for a finished snip.
pub trait ClipboardSink: Send + Sync + 'static {
    fn write_image(&self, image: &RgbaImage) -> Result<(), ClipboardError>;
}

/// The OS clipboard.
///
/// One `arboard::Clipboard` is opened on first use and kept for the life of
/// the process. On X11 the owning handle serves the selection, so dropping
/// it after a write would lose the image when no clipboard manager runs.
#[derive(Default)]
pub struct SystemClipboard {
    handle: Mutex<Option<Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_open(&self) -> bool {
        self.handle
            .lock()
            .map(|handle| handle.is_some())
            .unwrap_or(false)
    }
}

impl ClipboardSink for SystemClipboard {
    fn write_image(&self, image: &RgbaImage) -> Result<(), ClipboardError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ClipboardError::EmptyImage);
        }

        let mut handle = self.handle.lock().map_err(|_| ClipboardError::Poisoned)?;
        let mut clipboard = match handle.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };

        clipboard.set_image(ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        })?;
        // A handle whose write failed is dropped and reopened next time.
        *handle = Some(clipboard);
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("Refusing to copy an empty image")]
    EmptyImage,

    #[error("Clipboard unavailable: {0}")]
    Unavailable(#[from] arboard::Error),

    #[error("Clipboard lock poisoned")]
    Poisoned,
}
