//! Named commands from the external controller
//!
//! `RawCommand` is the wire shape: an action name plus loosely typed, all
//! optional parameters. `Command::parse` applies defaults and clamping.

use crate::error::OverlayError;
use crate::settings::{
    DEFAULT_POSITION, DEFAULT_SIZE_FRACTION, DEFAULT_TRANSPARENCY, OverlaySettings, SignalColor,
    SignalState,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f64>,
    #[serde(default, alias = "size", skip_serializing_if = "Option::is_none")]
    pub size_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<i64>,
}

impl CommandParams {
    fn settings(&self) -> OverlaySettings {
        OverlaySettings {
            transparency: self.transparency.unwrap_or(DEFAULT_TRANSPARENCY),
            size_fraction: self.size_fraction.unwrap_or(DEFAULT_SIZE_FRACTION),
            position_x: self.position_x.unwrap_or(DEFAULT_POSITION),
            position_y: self.position_y.unwrap_or(DEFAULT_POSITION),
        }
        .clamped()
    }

    fn signal(&self) -> SignalState {
        let color = self
            .color
            .as_deref()
            .map(SignalColor::from_name)
            .unwrap_or_default();
        let countdown = self.countdown.unwrap_or(0).clamp(0, u32::MAX as i64) as u32;
        SignalState::new(color, countdown)
    }
}

/// A command as received, before defaults are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCommand {
    pub action: String,
    #[serde(default)]
    pub params: CommandParams,
}

impl RawCommand {
    pub fn new(action: impl Into<String>, params: CommandParams) -> Self {
        Self {
            action: action.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Create {
        settings: OverlaySettings,
        signal: SignalState,
    },
    UpdateState(SignalState),
    UpdateSettings(OverlaySettings),
    UpdatePosition {
        position_x: f64,
        position_y: f64,
    },
    Stop,
}

impl Command {
    pub fn parse(raw: &RawCommand) -> Result<Self, OverlayError> {
        let p = &raw.params;
        let command = match raw.action.as_str() {
            "create" => Self::Create {
                settings: p.settings(),
                signal: p.signal(),
            },
            "updateState" | "update_state" => Self::UpdateState(p.signal()),
            "updateSettings" | "update_settings" => Self::UpdateSettings(p.settings()),
            "updatePosition" | "update_position" => {
                let s = p.settings();
                Self::UpdatePosition {
                    position_x: s.position_x,
                    position_y: s.position_y,
                }
            }
            "stop" => Self::Stop,
            other => return Err(OverlayError::UnsupportedCommand(other.to_string())),
        };
        Ok(command)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::UpdateState(_) => "updateState",
            Self::UpdateSettings(_) => "updateSettings",
            Self::UpdatePosition { .. } => "updatePosition",
            Self::Stop => "stop",
        }
    }
}
