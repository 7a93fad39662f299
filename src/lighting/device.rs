use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// What a light can do, as reported by the device scanner.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceCapabilities {
    pub supports_color: bool,
    pub supports_brightness: bool,
    pub supports_color_temp: bool,
    pub supports_effects: bool,
    pub min_brightness: Option<u8>,
    pub max_brightness: Option<u8>,
    pub min_mireds: Option<u16>,
    pub max_mireds: Option<u16>,
    pub effects: Vec<String>,
}

impl DeviceCapabilities {
    /// Advertised brightness range, defaulting to the full 0-255 scale.
    pub fn brightness_range(&self) -> (u8, u8) {
        let min = self.min_brightness.unwrap_or(0);
        let max = self.max_brightness.unwrap_or(u8::MAX).max(min);
        (min, max)
    }

    /// Colour-temperature range in mireds, if both bounds are known.
    pub fn mireds_range(&self) -> Option<(u16, u16)> {
        match (self.min_mireds, self.max_mireds) {
            (Some(min), Some(max)) => Some((min.min(max), min.max(max))),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub entity_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub capabilities: DeviceCapabilities,
}

impl Device {
    pub fn new(
        entity_id: impl Into<String>,
        name: impl Into<String>,
        capabilities: DeviceCapabilities,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            name: name.into(),
            area: None,
            manufacturer: None,
            capabilities,
        }
    }

    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area = Some(area.into());
        self
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }
}

/// Perceptual response of a light's brightness control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrightnessCurve {
    #[default]
    Linear,
    Logarithmic,
    Exponential,
}

impl BrightnessCurve {
    /// Maps a normalized level (0.0-1.0) through the curve.
    pub fn apply(self, level: f32) -> f32 {
        let level = level.clamp(0.0, 1.0);
        match self {
            BrightnessCurve::Linear => level,
            BrightnessCurve::Logarithmic => (1.0 + 9.0 * level).ln() / 10f32.ln(),
            BrightnessCurve::Exponential => level * level,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectPerformance {
    pub response_time_ms: f64,
    pub supported: bool,
}

/// Measured actuation behaviour of one device.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLatencyProfile {
    pub latency_ms: f64,
    pub min_transition_ms: f64,
    pub max_transition_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_accuracy: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness_curve: Option<BrightnessCurve>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effects_performance: BTreeMap<String, EffectPerformance>,
}

impl DeviceLatencyProfile {
    pub fn new(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            min_transition_ms: 0.0,
            max_transition_ms: 10_000.0,
            color_accuracy: None,
            brightness_curve: None,
            effects_performance: BTreeMap::new(),
        }
    }
}

/// Profiles keyed by entity id.
pub type LatencyProfiles = HashMap<String, DeviceLatencyProfile>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_range_defaults() {
        let caps = DeviceCapabilities::default();
        assert_eq!(caps.brightness_range(), (0, 255));
        let caps = DeviceCapabilities {
            min_brightness: Some(10),
            max_brightness: Some(200),
            ..Default::default()
        };
        assert_eq!(caps.brightness_range(), (10, 200));
    }

    #[test]
    fn mireds_range_needs_both_bounds() {
        let mut caps = DeviceCapabilities {
            min_mireds: Some(153),
            ..Default::default()
        };
        assert_eq!(caps.mireds_range(), None);
        caps.max_mireds = Some(500);
        assert_eq!(caps.mireds_range(), Some((153, 500)));
    }

    #[test]
    fn brightness_curves() {
        assert_eq!(BrightnessCurve::Linear.apply(0.5), 0.5);
        assert_eq!(BrightnessCurve::Exponential.apply(0.5), 0.25);
        assert!((BrightnessCurve::Logarithmic.apply(1.0) - 1.0).abs() < 1e-6);
        assert_eq!(BrightnessCurve::Logarithmic.apply(0.0), 0.0);
        assert!(BrightnessCurve::Logarithmic.apply(0.2) > 0.2);
    }

    #[test]
    fn device_json_shape() {
        let json = r#"{
            "entityId": "light.kitchen",
            "name": "Kitchen",
            "area": "kitchen",
            "capabilities": {"supportsColor": true, "supportsBrightness": true, "effects": ["flash"]}
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.entity_id, "light.kitchen");
        assert_eq!(device.area.as_deref(), Some("kitchen"));
        assert!(device.capabilities.supports_color);
        assert!(!device.capabilities.supports_color_temp);
        assert_eq!(device.capabilities.effects, vec!["flash".to_string()]);
    }

    #[test]
    fn profile_json_shape() {
        let json = r#"{
            "latencyMs": 80,
            "minTransitionMs": 0,
            "maxTransitionMs": 2000,
            "colorAccuracy": 0.9,
            "brightnessCurve": "logarithmic",
            "effectsPerformance": {"strobe": {"responseTimeMs": 120, "supported": true}}
        }"#;
        let profile: DeviceLatencyProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.latency_ms, 80.0);
        assert_eq!(profile.brightness_curve, Some(BrightnessCurve::Logarithmic));
        assert!(profile.effects_performance["strobe"].supported);
    }
}
