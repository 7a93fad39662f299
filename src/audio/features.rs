use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Decoded PCM handed over by the caller.
///
/// Only constructible through [`AudioBuffer::new`], so every channel holds
/// the same number of frames.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    /// One sample sequence per channel, values in [-1, 1]
    channels: Vec<Vec<f32>>,
    /// Duration in seconds
    duration: f64,
}

impl AudioBuffer {
    /// Builds a buffer and derives its duration from the frame count.
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(AnalysisError::configuration("sample rate must be non-zero"));
        }
        let Some(first) = channels.first() else {
            return Err(AnalysisError::input("audio buffer has no channels"));
        };
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(AnalysisError::input("channel sample counts differ"));
        }

        Ok(Self {
            sample_rate,
            duration: frames as f64 / sample_rate as f64,
            channels,
        })
    }

    /// Convenience constructor for a single channel.
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Averages all channels into one sequence.
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels.as_slice() {
            [] => Vec::new(),
            [only] => only.clone(),
            channels => {
                let scale = 1.0 / channels.len() as f32;
                let mut mixed = vec![0.0f32; self.frame_count()];
                for channel in channels {
                    for (out, &sample) in mixed.iter_mut().zip(channel) {
                        *out += sample;
                    }
                }
                mixed.iter_mut().for_each(|s| *s *= scale);
                mixed
            }
        }
    }
}

/// Band features of one windowed FFT frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencySlice {
    /// Frame start in seconds
    pub timestamp: f64,
    pub bass: f32,   // 20-250 Hz
    pub mid: f32,    // 250-4000 Hz
    pub treble: f32, // 4-20 kHz
    pub amplitude: f32,
    /// Frequency of the loudest bin (Hz)
    pub dominant_frequency: f32,
}

impl FrequencySlice {
    pub fn mean_band_energy(&self) -> f32 {
        (self.bass + self.mid + self.treble) / 3.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Calm,
    Energetic,
    Intense,
    Dramatic,
    Ambient,
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mood::Calm => "calm",
            Mood::Energetic => "energetic",
            Mood::Intense => "intense",
            Mood::Dramatic => "dramatic",
            Mood::Ambient => "ambient",
        };
        f.write_str(name)
    }
}

/// Everything the timeline generator needs to know about a track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFeatures {
    pub bpm: f64,
    /// Beat times in seconds, strictly increasing
    pub beats: Vec<f64>,
    pub frequency_data: Vec<FrequencySlice>,
    /// Mean slice amplitude (0.0-1.0)
    pub energy: f32,
    pub mood: Mood,
    pub duration: f64,
}
