//! User settings: hotkey, capture delay and hollow window behaviour.
//!
//! Stored as JSON in the platform-appropriate config directory:
//!   macOS:   ~/Library/Application Support/snippy/settings.json
//!   Linux:   ~/.config/snippy/settings.json
//!   Windows: %APPDATA%/snippy/settings.json
//!
//! `SNIPPY_HOTKEY` and `SNIPPY_CAPTURE_DELAY_MS` override the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const HOTKEY_ENV: &str = "SNIPPY_HOTKEY";
pub const CAPTURE_DELAY_ENV: &str = "SNIPPY_CAPTURE_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Global shortcut accelerator, e.g. `PrintScreen` or `CmdOrCtrl+Shift+S`.
    pub hotkey: String,
    /// Time between hiding an overlay and grabbing the screen, so the
    /// compositor has removed the overlay from the frame.
    pub capture_delay_ms: u64,
    /// Height of the hollow window's menu bar in logical pixels.
    pub hollow_menu_height: u32,
    /// Close the hollow window after it captures. When false the frame stays
    /// pinned and can capture again.
    pub close_hollow_after_capture: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hotkey: "PrintScreen".to_string(),
            capture_delay_ms: 100,
            hollow_menu_height: 40,
            close_hollow_after_capture: true,
        }
    }
}

impl Settings {
    /// Loads settings from the default path, then applies environment
    /// overrides. Never fails: a broken file is logged and ignored.
    pub fn load() -> Self {
        let path = settings_path();
        let settings = match load_settings(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Ignoring settings file {}: {}", path.display(), e);
                Settings::default()
            }
        };
        settings.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup` (normally the process
    /// environment). Unparseable values are logged and skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(hotkey) = lookup(HOTKEY_ENV).filter(|v| !v.trim().is_empty()) {
            self.hotkey = hotkey.trim().to_string();
        }
        if let Some(raw) = lookup(CAPTURE_DELAY_ENV) {
            match raw.trim().parse() {
                Ok(ms) => self.capture_delay_ms = ms,
                Err(_) => log::warn!("{}={:?} is not a number of milliseconds", CAPTURE_DELAY_ENV, raw),
            }
        }
        self
    }

    pub fn capture_delay(&self) -> Duration {
        Duration::from_millis(self.capture_delay_ms)
    }
}

/// Location of the settings file.
pub fn settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snippy")
        .join("settings.json")
}

/// Reads settings from `path`. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
        Err(e) => return Err(ConfigError::Read(e)),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings: {0}")]
    Read(#[from] std::io::Error),

    #[error("Malformed settings: {0}")]
    Parse(#[from] serde_json::Error),
}
