//! Per-device latency compensation.
//!
//! Every device is shifted earlier by how much slower it is than the fastest
//! device in the set, so all lights visibly react at the same instant.

use std::collections::HashMap;

use crate::lighting::command::LightCommand;
use crate::lighting::device::{Device, LatencyProfiles};

/// Latency assumed for devices matching no known manufacturer.
pub const UNKNOWN_LATENCY_MS: f64 = 200.0;

/// Slack for gaps computed from second-based timestamps.
const INTERVAL_TOLERANCE_MS: f64 = 1e-6;

const MANUFACTURER_LATENCY_MS: &[(&str, f64)] = &[
    ("hue", 50.0),
    ("philips", 50.0),
    ("lifx", 80.0),
    ("tradfri", 150.0),
    ("ikea", 150.0),
    ("kasa", 120.0),
    ("tp-link", 120.0),
    ("tplink", 120.0),
    ("tuya", 300.0),
    ("smart life", 300.0),
    ("yeelight", 250.0),
];

#[derive(Clone, Debug)]
pub struct SynchronizationCalculator {
    manufacturer_latency: Vec<(String, f64)>,
    unknown_latency_ms: f64,
}

impl Default for SynchronizationCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl SynchronizationCalculator {
    pub fn new() -> Self {
        Self {
            manufacturer_latency: MANUFACTURER_LATENCY_MS
                .iter()
                .map(|&(key, ms)| (key.to_string(), ms))
                .collect(),
            unknown_latency_ms: UNKNOWN_LATENCY_MS,
        }
    }

    /// Adds or replaces a manufacturer key in this calculator's table.
    pub fn with_manufacturer_latency(mut self, key: impl Into<String>, latency_ms: f64) -> Self {
        let key = key.into().to_lowercase();
        match self.manufacturer_latency.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = latency_ms,
            None => self.manufacturer_latency.insert(0, (key, latency_ms)),
        }
        self
    }

    /// Latency guessed from manufacturer, then name, then entity id.
    pub fn heuristic_latency(&self, device: &Device) -> f64 {
        let candidates = [
            device.manufacturer.as_deref(),
            Some(device.name.as_str()),
            Some(device.entity_id.as_str()),
        ];
        for text in candidates.into_iter().flatten() {
            let text = text.to_lowercase();
            if let Some(&(_, ms)) = self
                .manufacturer_latency
                .iter()
                .find(|(key, _)| text.contains(key.as_str()))
            {
                return ms;
            }
        }
        self.unknown_latency_ms
    }

    /// Profiled latency if known, otherwise the manufacturer heuristic.
    pub fn device_latency(&self, device: &Device, profiles: &LatencyProfiles) -> f64 {
        profiles
            .get(&device.entity_id)
            .map(|p| p.latency_ms)
            .unwrap_or_else(|| self.heuristic_latency(device))
    }

    /// Latency of the fastest device; 0 for an empty set.
    pub fn reference_latency(&self, devices: &[Device], profiles: &LatencyProfiles) -> f64 {
        devices
            .iter()
            .map(|d| self.device_latency(d, profiles))
            .min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0)
    }

    /// Compensation in ms for every device, keyed by entity id.
    pub fn compensations(
        &self,
        devices: &[Device],
        profiles: &LatencyProfiles,
    ) -> HashMap<String, f64> {
        let reference = self.reference_latency(devices, profiles);
        log::debug!("Reference latency: {:.0}ms", reference);

        devices
            .iter()
            .map(|d| {
                let compensation = (self.device_latency(d, profiles) - reference).max(0.0);
                (d.entity_id.clone(), compensation)
            })
            .collect()
    }
}

/// Shifts a command earlier by `compensation_ms`, never below zero.
/// The pre-shift time stays in `original_timestamp`.
pub fn compensate(command: &LightCommand, compensation_ms: f64) -> LightCommand {
    LightCommand {
        timestamp: (command.original_timestamp - compensation_ms / 1000.0).max(0.0),
        ..command.clone()
    }
}

pub fn compensate_all(commands: &[LightCommand], compensation_ms: f64) -> Vec<LightCommand> {
    commands.iter().map(|c| compensate(c, compensation_ms)).collect()
}

/// Whether `to` lies at least `min_interval_ms` after `from`. A gap equal to
/// the interval counts even when the seconds subtraction rounds below it.
pub fn interval_elapsed(from: f64, to: f64, min_interval_ms: f64) -> bool {
    (to - from) * 1000.0 >= min_interval_ms - INTERVAL_TOLERANCE_MS
}

/// Buckets time-sorted commands into batches starting at least
/// `min_interval_ms` apart. Every command is kept.
pub fn group_commands(commands: &[LightCommand], min_interval_ms: f64) -> Vec<Vec<LightCommand>> {
    let min_interval_ms = min_interval_ms.max(0.0);
    let mut batches: Vec<Vec<LightCommand>> = Vec::new();
    let mut batch_start = f64::NEG_INFINITY;

    for command in commands {
        match batches.last_mut() {
            Some(batch) if !interval_elapsed(batch_start, command.timestamp, min_interval_ms) => {
                batch.push(command.clone())
            }
            _ => {
                batch_start = command.timestamp;
                batches.push(vec![command.clone()]);
            }
        }
    }

    batches
}

/// Whether shifting by `compensation_ms` keeps every command at or after 0.
pub fn validate_compensation(commands: &[LightCommand], compensation_ms: f64) -> bool {
    commands
        .iter()
        .map(|c| c.timestamp * 1000.0)
        .min_by(|a, b| a.total_cmp(b))
        .map_or(true, |min_ms| min_ms >= compensation_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lighting::command::{CommandParams, CommandType};
    use crate::lighting::device::{DeviceCapabilities, DeviceLatencyProfile};

    fn device(id: &str, name: &str) -> Device {
        Device::new(id, name, DeviceCapabilities::default())
    }

    fn command(t: f64) -> LightCommand {
        LightCommand::new(t, CommandType::SetBrightness, CommandParams::default())
    }

    #[test]
    fn profiled_latencies() {
        let sync = SynchronizationCalculator::new();
        let devices = vec![device("light.a", "A"), device("light.b", "B")];
        let mut profiles = LatencyProfiles::new();
        profiles.insert("light.a".into(), DeviceLatencyProfile::new(50.0));
        profiles.insert("light.b".into(), DeviceLatencyProfile::new(200.0));

        assert_eq!(sync.reference_latency(&devices, &profiles), 50.0);
        let comp = sync.compensations(&devices, &profiles);
        assert_eq!(comp["light.a"], 0.0);
        assert_eq!(comp["light.b"], 150.0);
    }

    #[test]
    fn heuristic_latencies() {
        let sync = SynchronizationCalculator::new();
        let devices = vec![
            device("light.desk", "Desk Hue Go"),
            device("light.porch", "Porch"),
            device("light.strip_tuya", "Strip"),
            device("light.x", "X").with_manufacturer("LIFX"),
        ];
        let profiles = LatencyProfiles::new();
        assert_eq!(sync.heuristic_latency(&devices[0]), 50.0);
        assert_eq!(sync.heuristic_latency(&devices[1]), UNKNOWN_LATENCY_MS);
        assert_eq!(sync.heuristic_latency(&devices[2]), 300.0);
        assert_eq!(sync.heuristic_latency(&devices[3]), 80.0);

        let comp = sync.compensations(&devices, &profiles);
        assert_eq!(comp["light.desk"], 0.0);
        assert_eq!(comp["light.porch"], 150.0);
        assert_eq!(comp["light.strip_tuya"], 250.0);
        assert_eq!(comp["light.x"], 30.0);
    }

    #[test]
    fn profile_overrides_heuristic() {
        let sync = SynchronizationCalculator::new();
        let hue = device("light.hue", "Hue");
        let mut profiles = LatencyProfiles::new();
        profiles.insert("light.hue".into(), DeviceLatencyProfile::new(420.0));
        assert_eq!(sync.device_latency(&hue, &profiles), 420.0);
    }

    #[test]
    fn table_is_per_instance() {
        let custom = SynchronizationCalculator::new().with_manufacturer_latency("Nanoleaf", 90.0);
        let nano = device("light.panels", "Nanoleaf Shapes");
        assert_eq!(custom.heuristic_latency(&nano), 90.0);
        assert_eq!(
            SynchronizationCalculator::new().heuristic_latency(&nano),
            UNKNOWN_LATENCY_MS
        );
    }

    #[test]
    fn empty_device_set() {
        let sync = SynchronizationCalculator::new();
        assert_eq!(sync.reference_latency(&[], &LatencyProfiles::new()), 0.0);
        assert!(sync.compensations(&[], &LatencyProfiles::new()).is_empty());
    }

    #[test]
    fn compensation_never_negative() {
        let commands: Vec<_> = [0.0, 0.1, 0.5, 2.0].iter().map(|&t| command(t)).collect();
        let shifted = compensate_all(&commands, 150.0);
        let times: Vec<f64> = shifted.iter().map(|c| c.timestamp).collect();
        assert_eq!(times[0], 0.0);
        assert_eq!(times[1], 0.0);
        assert!((times[2] - 0.35).abs() < 1e-12);
        assert!((times[3] - 1.85).abs() < 1e-12);
        assert!(shifted
            .iter()
            .zip(&commands)
            .all(|(s, c)| s.original_timestamp == c.timestamp));
    }

    #[test]
    fn zero_compensation_is_identity() {
        let commands: Vec<_> = [0.0, 0.5].iter().map(|&t| command(t)).collect();
        assert_eq!(compensate_all(&commands, 0.0), commands);
    }

    #[test]
    fn compensation_validity() {
        let commands: Vec<_> = [0.2, 0.5].iter().map(|&t| command(t)).collect();
        assert!(validate_compensation(&commands, 150.0));
        assert!(validate_compensation(&commands, 200.0));
        assert!(!validate_compensation(&commands, 250.0));
        assert!(validate_compensation(&[], 1000.0));
    }

    #[test]
    fn group_commands_batches_without_loss() {
        let commands: Vec<_> = [0.0, 0.03, 0.09, 0.1, 0.15, 0.5].iter().map(|&t| command(t)).collect();
        let batches = group_commands(&commands, 100.0);
        let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 2, 1]);
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), commands.len());
    }

    #[test]
    fn interval_boundary_survives_rounding() {
        // 0.3 - 0.2 is slightly below 0.1 in f64
        assert!((0.3 - 0.2) * 1000.0 < 100.0);
        assert!(interval_elapsed(0.2, 0.3, 100.0));
        assert!(!interval_elapsed(0.2, 0.29, 100.0));

        let commands: Vec<_> = [0.2, 0.3, 0.4].iter().map(|&t| command(t)).collect();
        assert_eq!(group_commands(&commands, 100.0).len(), 3);
    }
}
