//! Overlay settings and signal state value types
//!
//! Both are plain values copied into commands. The controller keeps the only
//! live copy; nothing here is persisted.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TRANSPARENCY: f64 = 0.9;
pub const DEFAULT_SIZE_FRACTION: f64 = 1.0;
pub const DEFAULT_POSITION: f64 = 0.5;

/// Smallest size fraction accepted from callers. Anything below is raised to this.
pub const MIN_SIZE_FRACTION: f64 = 0.05;

/// Geometry-affecting settings, all expressed as fractions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Surface opacity in [0, 1]
    pub transparency: f64,
    /// Requested size in (0, 1]
    pub size_fraction: f64,
    /// Normalized horizontal position across the usable range
    pub position_x: f64,
    /// Normalized vertical position across the usable range
    pub position_y: f64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            transparency: DEFAULT_TRANSPARENCY,
            size_fraction: DEFAULT_SIZE_FRACTION,
            position_x: DEFAULT_POSITION,
            position_y: DEFAULT_POSITION,
        }
    }
}

impl OverlaySettings {
    /// Clamp every field into its valid range. Non-finite values take the default.
    pub fn clamped(self) -> Self {
        Self {
            transparency: clamp_fraction(self.transparency, DEFAULT_TRANSPARENCY),
            size_fraction: clamp_size(self.size_fraction),
            position_x: clamp_fraction(self.position_x, DEFAULT_POSITION),
            position_y: clamp_fraction(self.position_y, DEFAULT_POSITION),
        }
    }
}

/// Clamp into [0, 1], replacing NaN/infinite input with `fallback`.
pub fn clamp_fraction(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Clamp a size fraction into [MIN_SIZE_FRACTION, 1].
pub fn clamp_size(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_SIZE_FRACTION, 1.0)
    } else {
        DEFAULT_SIZE_FRACTION
    }
}

/// Which light is lit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalColor {
    #[default]
    Red,
    Yellow,
    Green,
}

impl SignalColor {
    /// All colors in top-to-bottom light order.
    pub const ALL: [SignalColor; 3] = [SignalColor::Red, SignalColor::Yellow, SignalColor::Green];

    /// Parse a color name. Unknown names fall back to red.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "yellow" => Self::Yellow,
            "green" => Self::Green,
            _ => Self::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
        }
    }
}

/// What the light shows: active color and remaining seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalState {
    pub color: SignalColor,
    pub countdown_seconds: u32,
}

impl SignalState {
    pub fn new(color: SignalColor, countdown_seconds: u32) -> Self {
        Self {
            color,
            countdown_seconds,
        }
    }
}
