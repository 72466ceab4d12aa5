//! Daemon configuration (`config.json`)
//!
//! Only daemon-level knobs live here. Overlay settings and position are never
//! written to disk.
//!
//! On Linux this resolves to `~/.config/stoplight/config.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Daemon preferences (persisted to config.json).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Max gap between two presses that counts as a double-tap
    #[serde(default = "default_double_tap_ms")]
    pub double_tap_ms: u64,
    /// Density override; the backend's own value is used when unset
    #[serde(default)]
    pub density: Option<f64>,
    /// Screen extents for the headless backend
    #[serde(default = "default_screen_width")]
    pub screen_width: i32,
    #[serde(default = "default_screen_height")]
    pub screen_height: i32,
    /// Program and arguments run when a double-tap asks for the host app
    #[serde(default)]
    pub foreground_command: Option<Vec<String>>,
}

fn default_double_tap_ms() -> u64 {
    300
}

fn default_screen_width() -> i32 {
    1920
}

fn default_screen_height() -> i32 {
    1080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            double_tap_ms: default_double_tap_ms(),
            density: None,
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            foreground_command: None,
        }
    }
}

impl Config {
    pub fn double_tap(&self) -> Duration {
        Duration::from_millis(self.double_tap_ms)
    }

    /// Density to use given what the backend reports.
    pub fn density_or(&self, reported: f64) -> f64 {
        match self.density {
            Some(d) if d.is_finite() && d > 0.0 => d,
            _ => reported,
        }
    }
}

// ---------------------------------------------------------------------------
// Directory helpers
// ---------------------------------------------------------------------------

/// Stoplight config directory (e.g. `~/.config/stoplight/`).
fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stoplight"))
}

/// Path of `config.json`, if a config directory exists on this platform.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.json"))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load config from disk, returning defaults if the file is missing or invalid.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    load_config_from(&path)
}

/// Save config to disk.
pub fn save_config(config: &Config) -> Result<PathBuf, std::io::Error> {
    let path = config_path().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "config dir not found")
    })?;
    save_config_to(config, &path)?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Path-parameterised helpers (used by public API and tests)
// ---------------------------------------------------------------------------

pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;
    atomic_write(path, json.as_bytes())
}

/// Write to a temp file in the same directory, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), std::io::Error> {
    use std::io::Write;

    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
    })?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
