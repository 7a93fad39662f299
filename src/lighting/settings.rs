use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMapping {
    /// bass → red, mid → green, treble → blue
    #[default]
    Frequency,
    /// dominant frequency → hue, amplitude → lightness
    Mood,
    /// Reserved; currently behaves like `Frequency`
    Custom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessMapping {
    #[default]
    Amplitude,
    Energy,
    Beats,
    /// Reserved; currently behaves like `Amplitude`
    Custom,
}

/// Per-area settings fragment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOverride {
    #[serde(default, alias = "color_mapping", skip_serializing_if = "Option::is_none")]
    pub color_mapping: Option<ColorMapping>,
    #[serde(default, alias = "intensity_multiplier", skip_serializing_if = "Option::is_none")]
    pub intensity_multiplier: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderSettings {
    /// Global intensity (0.0-1.0)
    pub intensity: f32,
    #[serde(alias = "color_mapping")]
    pub color_mapping: ColorMapping,
    #[serde(alias = "brightness_mapping")]
    pub brightness_mapping: BrightnessMapping,
    #[serde(alias = "beat_sync")]
    pub beat_sync: bool,
    #[serde(alias = "smooth_transitions")]
    pub smooth_transitions: bool,
    /// Minimum gap between emitted commands, in milliseconds
    #[serde(alias = "min_command_interval")]
    pub min_command_interval: f64,
    /// Overrides keyed by device area
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<String, ZoneOverride>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            intensity: 0.8,
            color_mapping: ColorMapping::Frequency,
            brightness_mapping: BrightnessMapping::Amplitude,
            beat_sync: true,
            smooth_transitions: true,
            min_command_interval: 100.0,
            zones: BTreeMap::new(),
        }
    }
}

impl RenderSettings {
    /// Base settings merged with the override for `area`, if any.
    pub fn effective_for(&self, area: Option<&str>) -> EffectiveSettings {
        let zone = area.and_then(|a| self.zones.get(a));
        EffectiveSettings {
            intensity: self.intensity.clamp(0.0, 1.0),
            intensity_multiplier: zone
                .and_then(|z| z.intensity_multiplier)
                .unwrap_or(1.0)
                .max(0.0),
            color_mapping: zone
                .and_then(|z| z.color_mapping)
                .unwrap_or(self.color_mapping),
            brightness_mapping: self.brightness_mapping,
            beat_sync: self.beat_sync,
            smooth_transitions: self.smooth_transitions,
            min_command_interval: self.min_command_interval.max(0.0),
        }
    }
}

/// Settings resolved for a single device. Built fresh per device so
/// concurrent track builds never share mutable configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EffectiveSettings {
    pub intensity: f32,
    pub intensity_multiplier: f32,
    pub color_mapping: ColorMapping,
    pub brightness_mapping: BrightnessMapping,
    pub beat_sync: bool,
    pub smooth_transitions: bool,
    pub min_command_interval: f64,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        RenderSettings::default().effective_for(None)
    }
}
