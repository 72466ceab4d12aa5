//! Render state - signal state to a backend-neutral visual descriptor
//!
//! Colors are packed `0xRRGGBB` except the housing background, which carries
//! alpha as `0xRRGGBBAA`.

use crate::settings::{SignalColor, SignalState};
use serde::{Deserialize, Serialize};

pub const RED: u32 = 0xFF3B30;
pub const YELLOW: u32 = 0xFFCC00;
pub const GREEN: u32 = 0x34C759;
/// Fill for unlit lights
pub const INACTIVE: u32 = 0x555555;
pub const TEXT: u32 = 0xFFFFFF;
pub const HOUSING_BACKGROUND: u32 = 0x000000CC;

/// Lit fill color for a signal color
pub fn signal_rgb(color: SignalColor) -> u32 {
    match color {
        SignalColor::Red => RED,
        SignalColor::Yellow => YELLOW,
        SignalColor::Green => GREEN,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Light {
    pub color: SignalColor,
    pub active: bool,
    pub fill: u32,
}

/// Everything a backend needs to draw the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualDescriptor {
    /// Top to bottom: red, yellow, green
    pub lights: [Light; 3],
    pub countdown_text: String,
    pub badge_color: u32,
    pub text_color: u32,
    pub housing_background: u32,
}

impl VisualDescriptor {
    pub fn active_light(&self) -> Option<&Light> {
        self.lights.iter().find(|l| l.active)
    }
}

impl Default for VisualDescriptor {
    fn default() -> Self {
        render(&SignalState::default())
    }
}

pub fn render(state: &SignalState) -> VisualDescriptor {
    let lights = SignalColor::ALL.map(|color| {
        let active = color == state.color;
        Light {
            color,
            active,
            fill: if active { signal_rgb(color) } else { INACTIVE },
        }
    });

    VisualDescriptor {
        lights,
        countdown_text: state.countdown_seconds.to_string(),
        badge_color: signal_rgb(state.color),
        text_color: TEXT,
        housing_background: HOUSING_BACKGROUND,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_light_is_lit() {
        for color in SignalColor::ALL {
            let visual = render(&SignalState::new(color, 0));
            let lit: Vec<_> = visual.lights.iter().filter(|l| l.active).collect();
            assert_eq!(lit.len(), 1);
            assert_eq!(lit[0].color, color);
            assert_eq!(visual.badge_color, signal_rgb(color));
        }
    }

    #[test]
    fn unlit_lights_are_dim() {
        let visual = render(&SignalState::new(SignalColor::Yellow, 3));
        assert_eq!(visual.lights[0].fill, INACTIVE);
        assert_eq!(visual.lights[1].fill, YELLOW);
        assert_eq!(visual.lights[2].fill, INACTIVE);
    }

    #[test]
    fn countdown_is_decimal() {
        assert_eq!(render(&SignalState::new(SignalColor::Green, 0)).countdown_text, "0");
        assert_eq!(render(&SignalState::new(SignalColor::Green, 120)).countdown_text, "120");
    }

    #[test]
    fn unknown_name_renders_red() {
        let visual = render(&SignalState::new(SignalColor::from_name("blue"), 30));
        assert_eq!(visual.active_light().map(|l| l.color), Some(SignalColor::Red));
        assert_eq!(visual.text_color, TEXT);
    }
}
