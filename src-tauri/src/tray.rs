//! System tray setup and click handler.
//!
//! The hotkey is the primary entry point; the tray gives the background
//! process something visible to click and a way to quit.

use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::TrayIconBuilder,
    AppHandle,
};

/// Sets up the system tray icon with a click handler.
///
/// Left-click: enters capture mode.
/// Right-click: opens context menu with Capture and Quit.
pub fn setup_tray(app: &AppHandle, hotkey: &str) -> Result<(), Box<dyn std::error::Error>> {
    let capture_item = MenuItemBuilder::with_id("capture", "Capture region").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit Snippy").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&capture_item)
        .separator()
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::with_id("snippy")
        .icon(tray_icon)
        .tooltip(format!("Snippy: press {} to capture", hotkey))
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                log::info!("Tray icon clicked, starting capture mode");
                crate::start_capture_mode(tray_icon.app_handle());
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "capture" => crate::start_capture_mode(app),
            "quit" => {
                log::info!("Quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}
