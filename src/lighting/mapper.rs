//! Slice-to-command parameter mapping.
//!
//! An [`AudioLightMapper`] is built per device from that device's
//! [`EffectiveSettings`], so zone overrides are resolved up front and the
//! mapper itself is immutable.

use super::color::{clamp_byte, hsl_to_rgb};
use super::command::CommandParams;
use super::device::{DeviceCapabilities, DeviceLatencyProfile};
use super::settings::{BrightnessMapping, ColorMapping, EffectiveSettings};
use crate::audio::features::FrequencySlice;

/// Mireds used when a device does not advertise a range.
pub const DEFAULT_MIREDS: u16 = 370;

/// Colour accuracy below this scales RGB output down.
const ACCURACY_THRESHOLD: f32 = 0.95;

/// Multiplier for on-beat brightness when no fast effect is available.
const BEAT_BRIGHTNESS_BOOST: f32 = 1.2;

/// Level multiplier for the `beats` brightness mapping.
const BEATS_MAPPING_BOOST: f32 = 1.5;

/// Effects slower than this are not used for beat emphasis.
const MAX_EFFECT_RESPONSE_MS: f64 = 200.0;

const MAX_FREQUENCY_HZ: f32 = 20_000.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct AudioLightMapper {
    settings: EffectiveSettings,
}

impl AudioLightMapper {
    pub fn new(settings: EffectiveSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// Full parameter set for one slice on one device.
    pub fn map(
        &self,
        slice: &FrequencySlice,
        is_beat: bool,
        caps: &DeviceCapabilities,
        profile: Option<&DeviceLatencyProfile>,
    ) -> CommandParams {
        let mut params = CommandParams {
            transition: self.transition(profile),
            ..Default::default()
        };

        if caps.supports_color {
            params.rgb_color = Some(self.color(slice, profile));
        } else if caps.supports_color_temp {
            params.color_temp = Some(self.color_temp(slice, caps));
        }

        let mut level = caps
            .supports_brightness
            .then(|| self.brightness(slice, is_beat, caps, profile));

        if self.settings.beat_sync && is_beat {
            match self.beat_effect(caps, profile) {
                Some(effect) => params.effect = Some(effect),
                None => {
                    if let Some(value) = level.as_mut() {
                        *value = (*value * BEAT_BRIGHTNESS_BOOST).min(255.0);
                    }
                }
            }
        }

        params.brightness = level.map(clamp_byte);
        params
    }

    /// RGB for the slice according to the colour mapping mode.
    pub fn color(&self, slice: &FrequencySlice, profile: Option<&DeviceLatencyProfile>) -> [u8; 3] {
        let rgb = match self.settings.color_mapping {
            ColorMapping::Mood => {
                let hue = (slice.dominant_frequency / MAX_FREQUENCY_HZ).clamp(0.0, 1.0) * 360.0;
                hsl_to_rgb(hue, 1.0, slice.amplitude)
            }
            ColorMapping::Frequency | ColorMapping::Custom => {
                let scale = 255.0 * self.settings.intensity;
                [
                    clamp_byte(slice.bass * scale),
                    clamp_byte(slice.mid * scale),
                    clamp_byte(slice.treble * scale),
                ]
            }
        };

        match profile.and_then(|p| p.color_accuracy) {
            Some(accuracy) if accuracy < ACCURACY_THRESHOLD => {
                rgb.map(|c| clamp_byte(c as f32 * accuracy.max(0.0)))
            }
            _ => rgb,
        }
    }

    /// Unrounded brightness on the 0-255 scale, clamped to the device range.
    pub fn brightness(
        &self,
        slice: &FrequencySlice,
        is_beat: bool,
        caps: &DeviceCapabilities,
        profile: Option<&DeviceLatencyProfile>,
    ) -> f32 {
        let level = match self.settings.brightness_mapping {
            BrightnessMapping::Amplitude | BrightnessMapping::Custom => slice.amplitude,
            BrightnessMapping::Energy => slice.mean_band_energy(),
            BrightnessMapping::Beats if is_beat => {
                (slice.amplitude * BEATS_MAPPING_BOOST).min(1.0)
            }
            BrightnessMapping::Beats => slice.amplitude,
        };
        let curve = profile.and_then(|p| p.brightness_curve).unwrap_or_default();

        let value = curve.apply(level)
            * 255.0
            * self.settings.intensity
            * self.settings.intensity_multiplier;

        let (min, max) = caps.brightness_range();
        value.clamp(min as f32, max as f32)
    }

    /// Colour temperature for devices without RGB. More treble relative to
    /// bass gives a cooler (lower mired) value.
    pub fn color_temp(&self, slice: &FrequencySlice, caps: &DeviceCapabilities) -> u16 {
        let Some((min, max)) = caps.mireds_range() else {
            return DEFAULT_MIREDS;
        };
        let ratio = slice.treble / slice.bass.max(0.01);
        let coolness = (ratio / 2.0).clamp(0.0, 1.0);
        let span = (max - min) as f32;
        (max as f32 - coolness * span).round() as u16
    }

    /// A fast flash/strobe effect suitable for beat emphasis.
    pub fn beat_effect(
        &self,
        caps: &DeviceCapabilities,
        profile: Option<&DeviceLatencyProfile>,
    ) -> Option<String> {
        if !caps.supports_effects {
            return None;
        }
        let profile = profile?;
        caps.effects
            .iter()
            .filter(|name| {
                let lower = name.to_lowercase();
                lower.contains("flash") || lower.contains("strobe")
            })
            .find(|name| {
                profile.effects_performance.get(name.as_str()).is_some_and(|perf| {
                    perf.supported && perf.response_time_ms < MAX_EFFECT_RESPONSE_MS
                })
            })
            .cloned()
    }

    /// Transition in seconds, kept inside the profile's supported range.
    pub fn transition(&self, profile: Option<&DeviceLatencyProfile>) -> f64 {
        let base = if self.settings.smooth_transitions {
            self.settings.min_command_interval / 1000.0
        } else {
            0.0
        };
        match profile {
            Some(p) => base
                .max(p.min_transition_ms / 1000.0)
                .min(p.max_transition_ms / 1000.0),
            None => base,
        }
    }
}
