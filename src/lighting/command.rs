use serde::{Deserialize, Serialize};

use super::device::DeviceCapabilities;

/// Command kinds in descending selection priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandType {
    SetColor,
    Effect,
    SetBrightness,
    SetColorTemp,
    TurnOn,
}

/// Service-call parameters; field names follow the light service schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rgb_color: Option<[u8; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    /// Mireds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temp: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    /// Seconds
    #[serde(default)]
    pub transition: f64,
}

impl CommandParams {
    /// Picks the highest-priority type whose parameter is populated and
    /// supported by the device, falling back to `TurnOn`.
    pub fn command_type(&self, caps: &DeviceCapabilities) -> CommandType {
        if self.rgb_color.is_some() && caps.supports_color {
            CommandType::SetColor
        } else if self.effect.is_some() && caps.supports_effects {
            CommandType::Effect
        } else if self.brightness.is_some() && caps.supports_brightness {
            CommandType::SetBrightness
        } else if self.color_temp.is_some() && caps.supports_color_temp {
            CommandType::SetColorTemp
        } else {
            CommandType::TurnOn
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightCommand {
    /// Execution time in seconds, after latency compensation
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub command_type: CommandType,
    pub params: CommandParams,
    /// Audio-relative time before compensation
    pub original_timestamp: f64,
}

impl LightCommand {
    pub fn new(timestamp: f64, command_type: CommandType, params: CommandParams) -> Self {
        Self {
            timestamp,
            command_type,
            params,
            original_timestamp: timestamp,
        }
    }
}
