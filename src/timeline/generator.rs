//! Per-device track synthesis and timeline assembly.
//!
//! For every device: map rate-limited slices to commands, add beat emphasis,
//! drop redundant commands, then shift for latency. Filtering happens before
//! the shift so it sees audio-relative times. Devices are built in parallel;
//! each build only reads shared inputs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use super::optimize::remove_redundant;
use super::{DeviceTrack, Timeline};
use crate::audio::features::AudioFeatures;
use crate::lighting::color::clamp_byte;
use crate::lighting::command::{CommandParams, LightCommand};
use crate::lighting::device::{Device, DeviceLatencyProfile, LatencyProfiles};
use crate::lighting::mapper::AudioLightMapper;
use crate::lighting::settings::RenderSettings;
use crate::sync::{compensate_all, interval_elapsed, SynchronizationCalculator};

/// A slice counts as on-beat when a beat lies within this many seconds.
pub const BEAT_TOLERANCE: f64 = 0.05;

/// Beats closer than this to an existing command boost it instead of
/// adding a new one.
pub const BEAT_EMPHASIS_WINDOW: f64 = 0.1;

const BEAT_EMPHASIS_BOOST: f32 = 1.3;
const BEAT_COMMAND_TRANSITION: f64 = 0.05;

#[derive(Clone, Debug, Default)]
pub struct TimelineGenerator {
    sync: SynchronizationCalculator,
}

impl TimelineGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_synchronization(sync: SynchronizationCalculator) -> Self {
        Self { sync }
    }

    pub fn synchronization(&self) -> &SynchronizationCalculator {
        &self.sync
    }

    pub fn generate_timeline(
        &self,
        name: &str,
        features: &AudioFeatures,
        devices: &[Device],
        profiles: &LatencyProfiles,
        settings: &RenderSettings,
    ) -> Timeline {
        let started = Instant::now();
        let tracks = self
            .build_tracks(features, devices, profiles, settings, None)
            .unwrap_or_default();
        self.finish(name, features, tracks, settings, started)
    }

    /// Like [`generate_timeline`](Self::generate_timeline), but returns `None`
    /// if `cancel` is set before every device track has been built.
    pub fn generate_timeline_cancellable(
        &self,
        name: &str,
        features: &AudioFeatures,
        devices: &[Device],
        profiles: &LatencyProfiles,
        settings: &RenderSettings,
        cancel: &AtomicBool,
    ) -> Option<Timeline> {
        let started = Instant::now();
        let tracks = self.build_tracks(features, devices, profiles, settings, Some(cancel))?;
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        Some(self.finish(name, features, tracks, settings, started))
    }

    fn build_tracks(
        &self,
        features: &AudioFeatures,
        devices: &[Device],
        profiles: &LatencyProfiles,
        settings: &RenderSettings,
        cancel: Option<&AtomicBool>,
    ) -> Option<Vec<DeviceTrack>> {
        let compensations = self.sync.compensations(devices, profiles);

        devices
            .par_iter()
            .map(|device| {
                if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                    return None;
                }
                let compensation_ms = compensations.get(&device.entity_id).copied().unwrap_or(0.0);
                Some(build_track(
                    device,
                    features,
                    profiles.get(&device.entity_id),
                    settings,
                    compensation_ms,
                ))
            })
            .collect()
    }

    fn finish(
        &self,
        name: &str,
        features: &AudioFeatures,
        tracks: Vec<DeviceTrack>,
        settings: &RenderSettings,
        started: Instant,
    ) -> Timeline {
        let processing_time = started.elapsed().as_secs_f64() * 1000.0;
        let timeline = Timeline::assemble(name, features, tracks, settings, processing_time);
        log::info!(
            "Timeline '{}': {} devices, {} commands ({:.1}ms)",
            timeline.name,
            timeline.metadata.device_count,
            timeline.metadata.command_count,
            processing_time
        );
        timeline
    }
}

/// Builds the complete command track for one device.
pub fn build_track(
    device: &Device,
    features: &AudioFeatures,
    profile: Option<&DeviceLatencyProfile>,
    settings: &RenderSettings,
    compensation_ms: f64,
) -> DeviceTrack {
    let mapper = AudioLightMapper::new(settings.effective_for(device.area.as_deref()));

    let mut commands = synthesize(device, features, profile, &mapper);
    let synthesized = commands.len();

    if settings.beat_sync && profile.is_some() {
        commands = emphasize_beats(commands, &features.beats, device, mapper.settings().intensity);
    }

    let filtered = remove_redundant(&commands);
    let commands = compensate_all(&filtered, compensation_ms);

    log::debug!(
        "{}: {} synthesized, {} after filtering, compensation {:.0}ms",
        device.entity_id,
        synthesized,
        commands.len(),
        compensation_ms
    );

    DeviceTrack {
        entity_id: device.entity_id.clone(),
        device_name: device.name.clone(),
        commands,
        compensation_ms,
    }
}

/// One command per slice, skipping slices that arrive sooner than the
/// minimum interval after the last emitted command.
fn synthesize(
    device: &Device,
    features: &AudioFeatures,
    profile: Option<&DeviceLatencyProfile>,
    mapper: &AudioLightMapper,
) -> Vec<LightCommand> {
    let caps = &device.capabilities;
    let min_interval = mapper.settings().min_command_interval;
    let mut last_emitted: Option<f64> = None;
    let mut commands = Vec::new();

    for slice in &features.frequency_data {
        if let Some(last) = last_emitted {
            if !interval_elapsed(last, slice.timestamp, min_interval) {
                continue;
            }
        }

        let on_beat = is_on_beat(&features.beats, slice.timestamp);
        let params = mapper.map(slice, on_beat, caps, profile);
        let command_type = params.command_type(caps);
        commands.push(LightCommand::new(slice.timestamp, command_type, params));
        last_emitted = Some(slice.timestamp);
    }

    commands
}

/// Whether a beat lies within [`BEAT_TOLERANCE`] of `time`.
pub fn is_on_beat(beats: &[f64], time: f64) -> bool {
    let idx = beats.partition_point(|&b| b < time);
    let after = beats.get(idx).map(|&b| b - time);
    let before = idx.checked_sub(1).map(|i| time - beats[i]);
    after
        .into_iter()
        .chain(before)
        .any(|gap| gap < BEAT_TOLERANCE)
}

/// Index of the command closest in time to `time` in a sorted list.
fn nearest_command(commands: &[LightCommand], time: f64) -> Option<usize> {
    let idx = commands.partition_point(|c| c.timestamp < time);
    let candidates = [idx.checked_sub(1), (idx < commands.len()).then_some(idx)];
    candidates
        .into_iter()
        .flatten()
        .min_by(|&a, &b| {
            let da = (commands[a].timestamp - time).abs();
            let db = (commands[b].timestamp - time).abs();
            da.total_cmp(&db)
        })
}

/// Boosts the command nearest each beat, or adds a short full-level
/// brightness hit when nothing is close enough.
fn emphasize_beats(
    mut commands: Vec<LightCommand>,
    beats: &[f64],
    device: &Device,
    intensity: f32,
) -> Vec<LightCommand> {
    let caps = &device.capabilities;
    let mut added = Vec::new();

    for &beat in beats {
        let near = nearest_command(&commands, beat)
            .filter(|&i| (commands[i].timestamp - beat).abs() <= BEAT_EMPHASIS_WINDOW);

        match near {
            Some(i) => {
                if let Some(level) = commands[i].params.brightness.as_mut() {
                    *level = clamp_byte(*level as f32 * BEAT_EMPHASIS_BOOST);
                }
            }
            None if caps.supports_brightness => {
                let params = CommandParams {
                    brightness: Some(clamp_byte(255.0 * intensity)),
                    transition: BEAT_COMMAND_TRANSITION,
                    ..Default::default()
                };
                let command_type = params.command_type(caps);
                added.push(LightCommand::new(beat, command_type, params));
            }
            None => {}
        }
    }

    if !added.is_empty() {
        commands.extend(added);
        commands.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    }
    commands
}
