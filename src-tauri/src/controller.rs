//! Background controller: reacts to the hotkey and to the four renderer
//! messages by opening/closing overlays and running the snip pipeline.

use crate::bounds::{CaptureBounds, PixelRegion};
use crate::capture::{crop_region, CaptureError, CropError, ScreenSource};
use crate::clipboard::{ClipboardError, ClipboardSink};
use crate::config::Settings;
use crate::overlay::{Overlay, OverlayError, OverlayHost, WindowSpec};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Result of a capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snip {
    /// The region was copied to the clipboard.
    Copied(PixelRegion),
    /// The bounds had no area; nothing happened.
    Ignored,
}

/// Result of a request to enter capture mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Opened,
    /// An existing capture window was cleared and brought forward.
    Reset,
    /// A hollow window is open, so capture mode was refused.
    Blocked,
    /// A capture is between hiding its window and writing the clipboard.
    Busy,
}

/// Result of a request to pin a hollow window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hollow {
    Opened,
    /// One already existed and was focused instead.
    Focused,
    Ignored,
}

pub struct Controller<H, S, C> {
    host: H,
    source: Arc<S>,
    clipboard: Arc<C>,
    settings: Settings,
    in_flight: AtomicUsize,
}

impl<H, S, C> Controller<H, S, C>
where
    H: OverlayHost,
    S: ScreenSource,
    C: ClipboardSink,
{
    pub fn new(host: H, source: Arc<S>, clipboard: Arc<C>, settings: Settings) -> Self {
        Self {
            host,
            source,
            clipboard,
            settings,
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Shows the selection surface, unless a hollow window is pinned or a
    /// capture is still running.
    pub fn start_capture_mode(&self) -> Result<CaptureMode, SnipError> {
        if self.in_flight.load(Ordering::Acquire) > 0 {
            log::info!("Capture in progress, ignoring capture request");
            return Ok(CaptureMode::Busy);
        }

        if self.host.is_open(Overlay::Hollow) {
            log::info!("Hollow window already exists, cannot start capture mode");
            return Ok(CaptureMode::Blocked);
        }

        if self.host.is_open(Overlay::Capture) {
            self.host.reset(Overlay::Capture)?;
            self.host.show(Overlay::Capture)?;
            self.host.focus(Overlay::Capture)?;
            return Ok(CaptureMode::Reset);
        }

        let display = self.host.primary_display()?;
        self.host.open(&WindowSpec::capture(display))?;
        Ok(CaptureMode::Opened)
    }

    /// `capture-complete`: copy the selected region and dismiss the surface.
    ///
    /// Empty bounds leave the surface open so the user can select again.
    pub async fn capture_complete(&self, bounds: CaptureBounds) -> Result<Snip, SnipError> {
        log::info!("Capture bounds: {}", bounds);
        if !bounds.has_area() {
            log::warn!("Ignoring selection without area: {}", bounds);
            return Ok(Snip::Ignored);
        }

        let _in_flight = InFlight::enter(&self.in_flight);
        self.soft(Overlay::Capture, "hide", |h, o| h.hide(o));
        let result = self.snip_after_delay(bounds).await;
        self.soft(Overlay::Capture, "close", |h, o| h.close(o));

        result.map(Snip::Copied)
    }

    /// `capture-cancel`
    pub fn capture_cancel(&self) -> Result<(), SnipError> {
        log::info!("Capture cancelled");
        self.host.close(Overlay::Capture)?;
        Ok(())
    }

    /// `open-window`: swap the selection surface for a hollow frame.
    pub fn open_window(&self, bounds: CaptureBounds) -> Result<Hollow, SnipError> {
        log::info!("Opening hollow window with bounds: {}", bounds);
        self.host.close(Overlay::Capture)?;

        if self.host.is_open(Overlay::Hollow) {
            log::info!("Hollow window already exists");
            self.host.focus(Overlay::Hollow)?;
            return Ok(Hollow::Focused);
        }

        if !bounds.has_area() {
            log::warn!("Ignoring hollow window without area: {}", bounds);
            return Ok(Hollow::Ignored);
        }

        self.host
            .open(&WindowSpec::hollow(bounds, self.settings.hollow_menu_height))?;
        Ok(Hollow::Opened)
    }

    /// `hollow-capture`: copy the region under the frame.
    ///
    /// `frame` is relative to the hollow window's content area and is moved
    /// to the window's screen position as the window system reports it.
    /// Renderer `screenX`/`screenY` read 0 under WebKitGTK on Wayland.
    ///
    /// The frame is closed first, or only hidden for the duration of the
    /// capture when it is configured to stay pinned. Empty bounds leave the
    /// frame open.
    pub async fn hollow_capture(&self, frame: CaptureBounds) -> Result<Snip, SnipError> {
        log::info!("Hollow window capture: {}", frame);
        if !frame.has_area() {
            log::warn!("Ignoring hollow capture without area: {}", frame);
            return Ok(Snip::Ignored);
        }
        let Some((left, top)) = self.host.inner_origin(Overlay::Hollow)? else {
            log::warn!("No hollow window to capture from");
            return Ok(Snip::Ignored);
        };
        let bounds = frame.offset(left, top);

        let keep_frame = !self.settings.close_hollow_after_capture;
        let _in_flight = InFlight::enter(&self.in_flight);

        self.soft(Overlay::Capture, "hide", |h, o| h.hide(o));
        if keep_frame {
            self.soft(Overlay::Hollow, "hide", |h, o| h.hide(o));
        } else {
            self.soft(Overlay::Hollow, "close", |h, o| h.close(o));
        }

        let result = self.snip_after_delay(bounds).await;

        self.soft(Overlay::Capture, "close", |h, o| h.close(o));
        if keep_frame {
            self.soft(Overlay::Hollow, "show", |h, o| h.show(o));
        }

        result.map(Snip::Copied)
    }

    async fn snip_after_delay(&self, bounds: CaptureBounds) -> Result<PixelRegion, SnipError> {
        let delay = self.settings.capture_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let start = Instant::now();
        let source = Arc::clone(&self.source);
        let clipboard = Arc::clone(&self.clipboard);
        let region =
            tokio::task::spawn_blocking(move || snip(&*source, &*clipboard, bounds)).await??;

        log::info!(
            "Screenshot saved to clipboard ({}x{}) in {}ms",
            region.width,
            region.height,
            start.elapsed().as_millis()
        );
        Ok(region)
    }

    /// Window housekeeping around a capture must not mask the capture's
    /// own result, so failures here are only logged.
    fn soft(
        &self,
        overlay: Overlay,
        what: &str,
        op: impl FnOnce(&H, Overlay) -> Result<(), OverlayError>,
    ) {
        if let Err(e) = op(&self.host, overlay) {
            log::warn!("Failed to {} {} window: {}", what, overlay.label(), e);
        }
    }
}

/// Counts a capture as in flight until dropped, so the count survives a
/// cancelled command future.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::AcqRel);
        InFlight(count)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Captures the display, crops to `bounds` and writes the result to the
/// clipboard. Blocking; run it off the async runtime.
pub fn snip<S, C>(source: &S, clipboard: &C, bounds: CaptureBounds) -> Result<PixelRegion, SnipError>
where
    S: ScreenSource + ?Sized,
    C: ClipboardSink + ?Sized,
{
    let screen = source.capture()?;
    let (width, height) = screen.image.dimensions();
    let region = bounds
        .to_pixels(screen.scale_factor, width, height)
        .ok_or(SnipError::OffScreen(bounds))?;

    let cropped = crop_region(&screen.image, region)?;
    clipboard.write_image(&cropped)?;
    Ok(region)
}

#[derive(Debug, thiserror::Error)]
pub enum SnipError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Clipboard(#[from] ClipboardError),

    #[error(transparent)]
    Overlay(#[from] OverlayError),

    #[error("Selection {0} lies outside the captured display")]
    OffScreen(CaptureBounds),

    #[error("Capture task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScreenCapture;
    use crate::overlay::DisplaySize;
    use image::{Rgba, RgbaImage};
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHost {
        open: Mutex<HashSet<Overlay>>,
        calls: Mutex<Vec<String>>,
        specs: Mutex<Vec<WindowSpec>>,
        origin: (f64, f64),
    }

    impl FakeHost {
        fn with_open(overlays: &[Overlay]) -> Self {
            let host = FakeHost::default();
            host.open.lock().unwrap().extend(overlays.iter().copied());
            host
        }

        fn record(&self, op: &str, overlay: Overlay) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{} {}", op, overlay.label()));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn is(&self, overlay: Overlay) -> bool {
            self.open.lock().unwrap().contains(&overlay)
        }
    }

    impl OverlayHost for FakeHost {
        fn is_open(&self, overlay: Overlay) -> bool {
            self.is(overlay)
        }

        fn open(&self, spec: &WindowSpec) -> Result<(), OverlayError> {
            self.record("open", spec.overlay);
            self.open.lock().unwrap().insert(spec.overlay);
            self.specs.lock().unwrap().push(spec.clone());
            Ok(())
        }

        fn close(&self, overlay: Overlay) -> Result<(), OverlayError> {
            if self.open.lock().unwrap().remove(&overlay) {
                self.record("close", overlay);
            }
            Ok(())
        }

        fn hide(&self, overlay: Overlay) -> Result<(), OverlayError> {
            if self.is(overlay) {
                self.record("hide", overlay);
            }
            Ok(())
        }

        fn show(&self, overlay: Overlay) -> Result<(), OverlayError> {
            if self.is(overlay) {
                self.record("show", overlay);
            }
            Ok(())
        }

        fn focus(&self, overlay: Overlay) -> Result<(), OverlayError> {
            if self.is(overlay) {
                self.record("focus", overlay);
            }
            Ok(())
        }

        fn reset(&self, overlay: Overlay) -> Result<(), OverlayError> {
            if self.is(overlay) {
                self.record("reset", overlay);
            }
            Ok(())
        }

        fn inner_origin(&self, overlay: Overlay) -> Result<Option<(f64, f64)>, OverlayError> {
            Ok(self.is(overlay).then_some(self.origin))
        }

        fn primary_display(&self) -> Result<DisplaySize, OverlayError> {
            Ok(DisplaySize {
                width: 1280.0,
                height: 720.0,
            })
        }
    }

    /// 200x100 physical display at scale 2, with a red pixel at (20, 10).
    struct FakeScreen {
        fail: bool,
    }

    impl ScreenSource for FakeScreen {
        fn capture(&self) -> Result<ScreenCapture, CaptureError> {
            if self.fail {
                return Err(CaptureError::CaptureFailed("display asleep".into()));
            }
            let mut image = RgbaImage::new(200, 100);
            image.put_pixel(20, 10, Rgba([255, 0, 0, 255]));
            Ok(ScreenCapture {
                image,
                scale_factor: 2.0,
            })
        }
    }

    #[derive(Default)]
    struct FakeClipboard {
        last: Mutex<Option<RgbaImage>>,
        fail: bool,
    }

    impl ClipboardSink for FakeClipboard {
        fn write_image(&self, image: &RgbaImage) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError::Poisoned);
            }
            *self.last.lock().unwrap() = Some(image.clone());
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings {
            capture_delay_ms: 0,
            ..Settings::default()
        }
    }

    fn controller(
        host: FakeHost,
        fail: bool,
        settings: Settings,
    ) -> (Controller<FakeHost, FakeScreen, FakeClipboard>, Arc<FakeClipboard>) {
        controller_with(host, fail, FakeClipboard::default(), settings)
    }

    fn controller_with(
        host: FakeHost,
        fail: bool,
        clipboard: FakeClipboard,
        settings: Settings,
    ) -> (Controller<FakeHost, FakeScreen, FakeClipboard>, Arc<FakeClipboard>) {
        let clipboard = Arc::new(clipboard);
        let controller = Controller::new(
            host,
            Arc::new(FakeScreen { fail }),
            Arc::clone(&clipboard),
            settings,
        );
        (controller, clipboard)
    }

    #[test]
    fn capture_mode_opens_full_display_window() {
        let (ctl, _) = controller(FakeHost::default(), false, settings());
        assert_eq!(ctl.start_capture_mode().unwrap(), CaptureMode::Opened);

        let specs = ctl.host.specs.lock().unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].overlay, Overlay::Capture);
        assert_eq!(specs[0].size, (1280.0, 720.0));
    }

    #[test]
    fn capture_mode_refused_while_hollow_open() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Hollow]), false, settings());
        assert_eq!(ctl.start_capture_mode().unwrap(), CaptureMode::Blocked);
        assert!(!ctl.host.is(Overlay::Capture));
        assert!(ctl.host.calls().is_empty());
    }

    #[test]
    fn capture_mode_reuses_existing_window() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());
        assert_eq!(ctl.start_capture_mode().unwrap(), CaptureMode::Reset);
        assert_eq!(
            ctl.host.calls(),
            ["reset capture", "show capture", "focus capture"]
        );
    }

    #[tokio::test]
    async fn capture_complete_copies_scaled_region_and_closes() {
        let (ctl, clipboard) =
            controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());

        let snip = ctl
            .capture_complete(CaptureBounds::new(10.0, 5.0, 30.0, 20.0))
            .await
            .unwrap();

        assert_eq!(
            snip,
            Snip::Copied(PixelRegion {
                x: 20,
                y: 10,
                width: 60,
                height: 40
            })
        );
        let copied = clipboard.last.lock().unwrap().clone().unwrap();
        assert_eq!(copied.dimensions(), (60, 40));
        assert_eq!(copied.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(ctl.host.calls(), ["hide capture", "close capture"]);
    }

    #[tokio::test]
    async fn empty_selection_keeps_surface_open() {
        let (ctl, clipboard) =
            controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());

        let snip = ctl
            .capture_complete(CaptureBounds::new(10.0, 10.0, 0.0, 20.0))
            .await
            .unwrap();

        assert_eq!(snip, Snip::Ignored);
        assert!(ctl.host.is(Overlay::Capture));
        assert!(clipboard.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_capture_still_closes_surface() {
        let (ctl, clipboard) =
            controller(FakeHost::with_open(&[Overlay::Capture]), true, settings());

        let result = ctl
            .capture_complete(CaptureBounds::new(0.0, 0.0, 10.0, 10.0))
            .await;

        assert!(matches!(result, Err(SnipError::Capture(_))));
        assert!(!ctl.host.is(Overlay::Capture));
        assert!(clipboard.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn selection_off_display_is_an_error() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());

        let result = ctl
            .capture_complete(CaptureBounds::new(500.0, 500.0, 10.0, 10.0))
            .await;

        assert!(matches!(result, Err(SnipError::OffScreen(_))));
        assert!(!ctl.host.is(Overlay::Capture));
    }

    #[test]
    fn cancel_closes_capture() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());
        ctl.capture_cancel().unwrap();
        assert!(!ctl.host.is(Overlay::Capture));
    }

    #[test]
    fn cancel_without_window_is_noop() {
        let (ctl, _) = controller(FakeHost::default(), false, settings());
        ctl.capture_cancel().unwrap();
        assert!(ctl.host.calls().is_empty());
    }

    #[test]
    fn open_window_swaps_capture_for_hollow() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());

        let hollow = ctl
            .open_window(CaptureBounds::new(100.0, 50.0, 300.0, 200.0))
            .unwrap();

        assert_eq!(hollow, Hollow::Opened);
        assert!(!ctl.host.is(Overlay::Capture));
        assert!(ctl.host.is(Overlay::Hollow));
        let specs = ctl.host.specs.lock().unwrap();
        assert_eq!(specs[0].size, (300.0, 240.0));
    }

    #[test]
    fn second_hollow_focuses_existing() {
        let (ctl, _) = controller(
            FakeHost::with_open(&[Overlay::Capture, Overlay::Hollow]),
            false,
            settings(),
        );

        let hollow = ctl
            .open_window(CaptureBounds::new(0.0, 0.0, 50.0, 50.0))
            .unwrap();

        assert_eq!(hollow, Hollow::Focused);
        assert_eq!(ctl.host.calls(), ["close capture", "focus hollow"]);
        assert!(ctl.host.specs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn hollow_capture_closes_frame_by_default() {
        let (ctl, clipboard) =
            controller(FakeHost::with_open(&[Overlay::Hollow]), false, settings());

        let snip = ctl
            .hollow_capture(CaptureBounds::new(10.0, 5.0, 20.0, 20.0))
            .await
            .unwrap();

        assert!(matches!(snip, Snip::Copied(_)));
        assert!(!ctl.host.is(Overlay::Hollow));
        assert!(clipboard.last.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn pinned_hollow_survives_repeated_captures() {
        let pinned = Settings {
            close_hollow_after_capture: false,
            ..settings()
        };
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Hollow]), false, pinned);
        let bounds = CaptureBounds::new(10.0, 5.0, 20.0, 20.0);

        ctl.hollow_capture(bounds).await.unwrap();
        ctl.hollow_capture(bounds).await.unwrap();

        assert!(ctl.host.is(Overlay::Hollow));
        assert_eq!(
            ctl.host.calls(),
            ["hide hollow", "show hollow", "hide hollow", "show hollow"]
        );
    }

    #[tokio::test]
    async fn clipboard_failure_still_closes_surface() {
        let clipboard = FakeClipboard {
            fail: true,
            ..FakeClipboard::default()
        };
        let (ctl, _) = controller_with(
            FakeHost::with_open(&[Overlay::Capture]),
            false,
            clipboard,
            settings(),
        );

        let result = ctl
            .capture_complete(CaptureBounds::new(0.0, 0.0, 10.0, 10.0))
            .await;

        assert!(matches!(result, Err(SnipError::Clipboard(_))));
        assert!(!ctl.host.is(Overlay::Capture));
    }

    #[tokio::test]
    async fn hotkey_during_capture_delay_is_refused() {
        let slow = Settings {
            capture_delay_ms: 50,
            ..settings()
        };
        let (ctl, clipboard) = controller(FakeHost::with_open(&[Overlay::Capture]), false, slow);

        let (snip, mode) = tokio::join!(
            ctl.capture_complete(CaptureBounds::new(0.0, 0.0, 10.0, 10.0)),
            async {
                tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                ctl.start_capture_mode()
            }
        );

        assert!(matches!(snip, Ok(Snip::Copied(_))));
        assert_eq!(mode.unwrap(), CaptureMode::Busy);
        assert_eq!(ctl.host.calls(), ["hide capture", "close capture"]);
        assert!(clipboard.last.lock().unwrap().is_some());

        assert_eq!(ctl.start_capture_mode().unwrap(), CaptureMode::Opened);
    }

    #[test]
    fn empty_bounds_open_no_hollow() {
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Capture]), false, settings());

        let hollow = ctl
            .open_window(CaptureBounds::new(10.0, 10.0, 0.0, 0.0))
            .unwrap();

        assert_eq!(hollow, Hollow::Ignored);
        assert!(!ctl.host.is(Overlay::Hollow));
        assert!(ctl.host.specs.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_hollow_capture_keeps_frame_open() {
        let (ctl, clipboard) =
            controller(FakeHost::with_open(&[Overlay::Hollow]), false, settings());

        let snip = ctl
            .hollow_capture(CaptureBounds::new(2.0, 2.0, 0.0, 10.0))
            .await
            .unwrap();

        assert_eq!(snip, Snip::Ignored);
        assert!(ctl.host.is(Overlay::Hollow));
        assert!(ctl.host.calls().is_empty());
        assert!(clipboard.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn hollow_capture_offsets_by_frame_origin() {
        let host = FakeHost {
            origin: (5.0, 3.0),
            ..FakeHost::with_open(&[Overlay::Hollow])
        };
        let (ctl, clipboard) = controller(host, false, settings());

        let snip = ctl
            .hollow_capture(CaptureBounds::new(2.0, 2.0, 10.0, 10.0))
            .await
            .unwrap();

        assert_eq!(
            snip,
            Snip::Copied(PixelRegion {
                x: 14,
                y: 10,
                width: 20,
                height: 20
            })
        );
        let copied = clipboard.last.lock().unwrap().clone().unwrap();
        assert_eq!(copied.get_pixel(6, 0), &Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn hollow_capture_without_frame_is_ignored() {
        let (ctl, clipboard) = controller(FakeHost::default(), false, settings());

        let snip = ctl
            .hollow_capture(CaptureBounds::new(2.0, 2.0, 10.0, 10.0))
            .await
            .unwrap();

        assert_eq!(snip, Snip::Ignored);
        assert!(clipboard.last.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn hollow_capture_closes_stray_capture_window() {
        let (ctl, _) = controller(
            FakeHost::with_open(&[Overlay::Capture, Overlay::Hollow]),
            false,
            settings(),
        );

        ctl.hollow_capture(CaptureBounds::new(0.0, 0.0, 10.0, 10.0))
            .await
            .unwrap();

        assert!(!ctl.host.is(Overlay::Capture));
        assert!(!ctl.host.is(Overlay::Hollow));
        assert_eq!(
            ctl.host.calls(),
            ["hide capture", "close hollow", "close capture"]
        );
    }

    #[tokio::test]
    async fn pinned_frame_returns_after_failed_capture() {
        let pinned = Settings {
            close_hollow_after_capture: false,
            ..settings()
        };
        let (ctl, _) = controller(FakeHost::with_open(&[Overlay::Hollow]), true, pinned);

        let result = ctl
            .hollow_capture(CaptureBounds::new(0.0, 0.0, 10.0, 10.0))
            .await;

        assert!(matches!(result, Err(SnipError::Capture(_))));
        assert!(ctl.host.is(Overlay::Hollow));
        assert_eq!(ctl.host.calls(), ["hide hollow", "show hollow"]);
    }
}
