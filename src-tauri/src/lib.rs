//! Snippy is the Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Global hotkey (hotkey.rs) and system tray (tray.rs)
//! - Overlay windows (overlay/)
//! - Screen capture, cropping and clipboard (capture/, clipboard.rs)
//! - Tauri command handlers for the four renderer messages

pub mod bounds;
pub mod capture;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod hotkey;
pub mod overlay;
mod tray;

use bounds::CaptureBounds;
use capture::PrimaryMonitor;
use clipboard::SystemClipboard;
use config::Settings;
use controller::Controller;
use overlay::{OverlayHost, TauriOverlays, WindowSpec};
use std::sync::Arc;
use tauri::{AppHandle, Manager, RunEvent};

/// The controller as wired into the running app.
pub type AppController = Controller<TauriOverlays, PrimaryMonitor, SystemClipboard>;

/// Enters capture mode. Shared by the hotkey and the tray.
pub(crate) fn start_capture_mode(app: &AppHandle) {
    let Some(controller) = app.try_state::<AppController>() else {
        log::warn!("Capture requested before the controller was ready");
        return;
    };
    if let Err(e) = controller.start_capture_mode() {
        log::error!("Failed to start capture mode: {}", e);
    }
}

/// Tauri command: `capture-complete` from the selection surface.
#[tauri::command]
async fn capture_complete(
    controller: tauri::State<'_, AppController>,
    bounds: CaptureBounds,
) -> Result<(), String> {
    controller
        .capture_complete(bounds)
        .await
        .map(|_| ())
        .map_err(|e| {
            log::error!("Error capturing screen: {}", e);
            e.to_string()
        })
}

/// Tauri command: `capture-cancel` from the selection surface.
#[tauri::command]
fn capture_cancel(controller: tauri::State<'_, AppController>) -> Result<(), String> {
    controller.capture_cancel().map_err(|e| e.to_string())
}

/// Tauri command: `open-window`, pin a hollow frame over the selection.
///
/// Async so the window is built off the main thread (WebView2 deadlocks
/// when a synchronous command creates a window).
#[tauri::command]
async fn open_window(
    controller: tauri::State<'_, AppController>,
    bounds: CaptureBounds,
) -> Result<(), String> {
    controller.open_window(bounds).map(|_| ()).map_err(|e| {
        log::error!("Failed to open hollow window: {}", e);
        e.to_string()
    })
}

/// Tauri command: `hollow-capture`, copy the region under the frame.
#[tauri::command]
async fn hollow_capture(
    controller: tauri::State<'_, AppController>,
    bounds: CaptureBounds,
) -> Result<(), String> {
    controller
        .hollow_capture(bounds)
        .await
        .map(|_| ())
        .map_err(|e| {
            log::error!("Error capturing hollow window: {}", e);
            e.to_string()
        })
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn create_main_window(app: &AppHandle) {
    let host = TauriOverlays::new(app.clone());
    if let Err(e) = host.open(&WindowSpec::main()) {
        log::error!("Failed to create main window: {}", e);
    }
}

/// Entry point, called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    dotenvy::dotenv().ok();
    init_logging();

    let settings = Settings::load();

    let app = tauri::Builder::default()
        .plugin(hotkey::plugin(start_capture_mode))
        .invoke_handler(tauri::generate_handler![
            capture_complete,
            capture_cancel,
            open_window,
            hollow_capture
        ])
        .setup(move |app| {
            log::info!("Snippy starting up");
            let handle = app.handle();

            handle.manage(Controller::new(
                TauriOverlays::new(handle.clone()),
                Arc::new(PrimaryMonitor),
                Arc::new(SystemClipboard::new()),
                settings.clone(),
            ));

            create_main_window(handle);
            tray::setup_tray(handle, &settings.hotkey)?;

            if let Err(e) = hotkey::register(handle, &settings.hotkey) {
                log::warn!("{} registration failed: {}", settings.hotkey, e);
            }

            log::info!(
                "Snippy is running in the background. Press {} to capture.",
                settings.hotkey
            );
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("Error building Snippy");

    app.run(|app, event| match event {
        // Last window closed. Everywhere but macOS that ends the process.
        RunEvent::ExitRequested { code: None, api, .. } if cfg!(target_os = "macos") => {
            api.prevent_exit();
        }
        #[cfg(target_os = "macos")]
        RunEvent::Reopen { .. } => {
            if app.get_webview_window(overlay::Overlay::Main.label()).is_none() {
                create_main_window(app);
            }
        }
        RunEvent::Exit => {
            hotkey::unregister_all(app);
            log::info!("Snippy exiting");
        }
        _ => {}
    });
}
