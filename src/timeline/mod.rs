pub mod generator;
pub mod io;
pub mod optimize;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audio::features::AudioFeatures;
use crate::lighting::command::LightCommand;
use crate::lighting::settings::RenderSettings;

pub use generator::TimelineGenerator;
pub use io::{export_timeline, import_timeline, load_timeline, save_timeline};
pub use optimize::{optimize_timeline, remove_redundant};

/// Commands for one device, sorted by timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceTrack {
    pub entity_id: String,
    pub device_name: String,
    pub commands: Vec<LightCommand>,
    pub compensation_ms: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineMetadata {
    pub device_count: usize,
    pub command_count: usize,
    /// Wall time spent generating, in milliseconds
    pub processing_time: f64,
    pub settings: RenderSettings,
}

/// A finished lighting plan. Produced by [`TimelineGenerator`] and only
/// changed afterwards by [`optimize_timeline`], which returns a new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub id: String,
    pub name: String,
    pub audio_features: AudioFeatures,
    pub duration: f64,
    pub tracks: Vec<DeviceTrack>,
    pub metadata: TimelineMetadata,
    pub created_at: DateTime<Utc>,
}

impl Timeline {
    pub(crate) fn assemble(
        name: &str,
        features: &AudioFeatures,
        tracks: Vec<DeviceTrack>,
        settings: &RenderSettings,
        processing_time: f64,
    ) -> Self {
        let command_count = tracks.iter().map(|t| t.commands.len()).sum();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            audio_features: features.clone(),
            duration: features.duration,
            metadata: TimelineMetadata {
                device_count: tracks.len(),
                command_count,
                processing_time,
                settings: settings.clone(),
            },
            tracks,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }

    pub fn track(&self, entity_id: &str) -> Option<&DeviceTrack> {
        self.tracks.iter().find(|t| t.entity_id == entity_id)
    }

    pub fn stats(&self) -> TimelineStats {
        let per_track: Vec<(String, usize)> = self
            .tracks
            .iter()
            .map(|t| (t.entity_id.clone(), t.commands.len()))
            .collect();
        let total_commands = per_track.iter().map(|(_, n)| n).sum::<usize>();
        TimelineStats {
            total_commands,
            max_compensation_ms: self
                .tracks
                .iter()
                .map(|t| t.compensation_ms)
                .fold(0.0, f64::max),
            commands_per_second: if self.duration > 0.0 {
                total_commands as f64 / self.duration
            } else {
                0.0
            },
            per_track,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimelineStats {
    pub per_track: Vec<(String, usize)>,
    pub total_commands: usize,
    pub max_compensation_ms: f64,
    pub commands_per_second: f64,
}
