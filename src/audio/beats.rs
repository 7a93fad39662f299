//! Beat detection over extracted slices.
//!
//! Onset strength is a percussive-weighted spectral flux on the bass and mid
//! bands. Beats are strict local maxima above a single global threshold
//! (`mean + 1.5 * stddev`), spaced at least [`MIN_BEAT_GAP`] apart. The
//! threshold is not windowed, so tracks with large dynamic swings may lose
//! beats in their quiet sections.

use super::features::FrequencySlice;

pub const DEFAULT_BPM: f64 = 120.0;
pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 200.0;

/// Minimum spacing between accepted beats in seconds (caps tempo at 200 BPM)
pub const MIN_BEAT_GAP: f64 = 0.3;

const THRESHOLD_STDDEV: f32 = 1.5;
const MID_WEIGHT: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
pub struct BeatAnalysis {
    pub beats: Vec<f64>,
    pub bpm: f64,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BeatDetector;

impl BeatDetector {
    pub fn new() -> Self {
        Self
    }

    /// Detects beats and estimates tempo. Never fails; featureless input
    /// yields no beats and the default tempo.
    pub fn detect(&self, slices: &[FrequencySlice]) -> BeatAnalysis {
        let onsets = onset_strength(slices);
        let beats = pick_beats(slices, &onsets);
        let bpm = estimate_bpm(&beats);

        log::debug!("Detected {} beats, tempo {:.1} BPM", beats.len(), bpm);
        BeatAnalysis { beats, bpm }
    }
}

/// `max(0, Δbass + 0.5·Δmid)` per frame; frame 0 has no predecessor and is 0.
pub fn onset_strength(slices: &[FrequencySlice]) -> Vec<f32> {
    let mut onsets = vec![0.0f32; slices.len()];
    for i in 1..slices.len() {
        let d_bass = slices[i].bass - slices[i - 1].bass;
        let d_mid = slices[i].mid - slices[i - 1].mid;
        onsets[i] = (d_bass + MID_WEIGHT * d_mid).max(0.0);
    }
    onsets
}

fn pick_beats(slices: &[FrequencySlice], onsets: &[f32]) -> Vec<f64> {
    if onsets.len() < 3 {
        return Vec::new();
    }

    // Statistics over frames that have a defined onset
    let defined = &onsets[1..];
    let len = defined.len() as f32;
    let (sum, sum_sq) = defined
        .iter()
        .fold((0.0f32, 0.0f32), |(s, sq), &v| (s + v, sq + v * v));
    let mean = sum / len;
    let std_dev = (sum_sq / len - mean * mean).max(0.0).sqrt();
    let threshold = mean + THRESHOLD_STDDEV * std_dev;

    let mut beats: Vec<f64> = Vec::new();
    for i in 1..onsets.len() - 1 {
        let value = onsets[i];
        let is_peak = value > onsets[i - 1] && value > onsets[i + 1];
        if !is_peak || value <= threshold {
            continue;
        }

        let time = slices[i].timestamp;
        let far_enough = beats.last().map_or(true, |&last| time - last >= MIN_BEAT_GAP);
        if far_enough {
            beats.push(time);
        }
    }

    beats
}

/// `60 / median(inter-beat interval)`, clamped to [60, 200].
pub fn estimate_bpm(beats: &[f64]) -> f64 {
    if beats.len() < 2 {
        return DEFAULT_BPM;
    }

    let mut intervals: Vec<f64> = beats.windows(2).map(|w| w[1] - w[0]).collect();
    intervals.sort_by(|a, b| a.total_cmp(b));
    let n = intervals.len();
    let median = if n % 2 == 0 {
        (intervals[n / 2 - 1] + intervals[n / 2]) / 2.0
    } else {
        intervals[n / 2]
    };

    if median <= 0.0 {
        return DEFAULT_BPM;
    }
    (60.0 / median).clamp(MIN_BPM, MAX_BPM)
}
