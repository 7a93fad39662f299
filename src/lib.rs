//! Music-to-light timeline generation.
//!
//! A decoded PCM buffer is reduced to [`FrequencySlice`]s, beats, tempo and a
//! mood label ([`audio`]); those features are mapped per device to light
//! commands, shifted for actuation latency and de-duplicated into a
//! [`Timeline`] that an external player executes.

pub mod audio;
pub mod config;
pub mod error;
pub mod lighting;
pub mod sync;
pub mod timeline;

pub use audio::analysis::{analyze, AudioAnalyzer};
pub use audio::features::{AudioBuffer, AudioFeatures, FrequencySlice, Mood};
pub use audio::spectrum::{FrameParams, SpectralFrameExtractor};
pub use error::{AnalysisError, Result, TimelineError};
pub use lighting::command::{CommandParams, CommandType, LightCommand};
pub use lighting::device::{Device, DeviceCapabilities, DeviceLatencyProfile, LatencyProfiles};
pub use lighting::settings::{BrightnessMapping, ColorMapping, RenderSettings, ZoneOverride};
pub use sync::SynchronizationCalculator;
pub use timeline::{
    export_timeline, import_timeline, optimize_timeline, DeviceTrack, Timeline, TimelineGenerator,
};
