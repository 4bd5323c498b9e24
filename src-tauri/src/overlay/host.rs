//! Tauri-backed overlay host. Windows are looked up by label, so "is open"
//! is whatever the webview manager currently holds.

use super::{DisplaySize, Overlay, OverlayError, OverlayHost, WindowSpec, CAPTURE_RESET_EVENT};
use tauri::{AppHandle, Emitter, Manager, WebviewUrl, WebviewWindow, WebviewWindowBuilder};

#[derive(Clone)]
pub struct TauriOverlays {
    app: AppHandle,
}

impl TauriOverlays {
    pub fn new(app: AppHandle) -> Self {
        Self { app }
    }

    fn window(&self, overlay: Overlay) -> Option<WebviewWindow> {
        self.app.get_webview_window(overlay.label())
    }
}

impl OverlayHost for TauriOverlays {
    fn is_open(&self, overlay: Overlay) -> bool {
        self.window(overlay).is_some()
    }

    fn open(&self, spec: &WindowSpec) -> Result<(), OverlayError> {
        let (width, height) = spec.size;
        let mut builder = WebviewWindowBuilder::new(
            &self.app,
            spec.overlay.label(),
            WebviewUrl::App(spec.overlay.page().into()),
        )
        .title(spec.title)
        .inner_size(width, height)
        .visible(spec.visible)
        .decorations(spec.decorations)
        .transparent(spec.transparent)
        .always_on_top(spec.always_on_top)
        .fullscreen(spec.fullscreen)
        .skip_taskbar(spec.skip_taskbar)
        .resizable(spec.resizable);

        if let Some((x, y)) = spec.position {
            builder = builder.position(x, y);
        }
        if let Some(menu) = spec.menu_height {
            builder = builder
                .initialization_script(&format!("window.__SNIPPY__ = {{ menuHeight: {} }};", menu));
        }

        builder.build()?;
        log::debug!("Opened {} window ({}x{})", spec.overlay.label(), width, height);
        Ok(())
    }

    fn close(&self, overlay: Overlay) -> Result<(), OverlayError> {
        if let Some(window) = self.window(overlay) {
            window.close()?;
        }
        Ok(())
    }

    fn hide(&self, overlay: Overlay) -> Result<(), OverlayError> {
        if let Some(window) = self.window(overlay) {
            window.hide()?;
        }
        Ok(())
    }

    fn show(&self, overlay: Overlay) -> Result<(), OverlayError> {
        if let Some(window) = self.window(overlay) {
            window.show()?;
        }
        Ok(())
    }

    fn focus(&self, overlay: Overlay) -> Result<(), OverlayError> {
        if let Some(window) = self.window(overlay) {
            window.set_focus()?;
        }
        Ok(())
    }

    fn reset(&self, overlay: Overlay) -> Result<(), OverlayError> {
        if self.is_open(overlay) {
            self.app.emit_to(overlay.label(), CAPTURE_RESET_EVENT, ())?;
        }
        Ok(())
    }

    fn inner_origin(&self, overlay: Overlay) -> Result<Option<(f64, f64)>, OverlayError> {
        let Some(window) = self.window(overlay) else {
            return Ok(None);
        };
        let scale = window.scale_factor()?;
        let position = window.inner_position()?.to_logical::<f64>(scale);
        Ok(Some((position.x, position.y)))
    }

    fn primary_display(&self) -> Result<DisplaySize, OverlayError> {
        let monitor = self.app.primary_monitor()?.ok_or(OverlayError::NoDisplay)?;
        let size = monitor.size().to_logical::<f64>(monitor.scale_factor());
        Ok(DisplaySize {
            width: size.width,
            height: size.height,
        })
    }
}
