//! Global hotkey registration via `tauri-plugin-global-shortcut`.

use tauri::{AppHandle, Runtime};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};

/// Parses an accelerator string such as `PrintScreen` or `CmdOrCtrl+Shift+S`.
pub fn parse_hotkey(accelerator: &str) -> Result<Shortcut, HotkeyError> {
    accelerator
        .parse::<Shortcut>()
        .map_err(|e| HotkeyError::Parse {
            accelerator: accelerator.to_string(),
            reason: e.to_string(),
        })
}

/// Builds the plugin. `on_press` runs once per key press; releases are
/// ignored.
pub fn plugin<R, F>(on_press: F) -> tauri::plugin::TauriPlugin<R>
where
    R: Runtime,
    F: Fn(&AppHandle<R>) + Send + Sync + 'static,
{
    tauri_plugin_global_shortcut::Builder::new()
        .with_handler(move |app, shortcut, event| {
            if event.state() == ShortcutState::Pressed {
                log::info!("Hotkey {:?} pressed - starting capture mode", shortcut.key);
                on_press(app);
            }
        })
        .build()
}

/// Registers `accelerator` as the capture hotkey.
pub fn register<R: Runtime>(app: &AppHandle<R>, accelerator: &str) -> Result<(), HotkeyError> {
    let shortcut = parse_hotkey(accelerator)?;
    app.global_shortcut().register(shortcut)?;
    Ok(())
}

/// Drops every shortcut this process registered.
pub fn unregister_all<R: Runtime>(app: &AppHandle<R>) {
    if let Err(e) = app.global_shortcut().unregister_all() {
        log::warn!("Failed to unregister global shortcuts: {}", e);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HotkeyError {
    #[error("Invalid hotkey {accelerator:?}: {reason}")]
    Parse { accelerator: String, reason: String },

    #[error("Hotkey registration failed: {0}")]
    Register(#[from] tauri_plugin_global_shortcut::Error),
}
