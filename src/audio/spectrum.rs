//! Windowed FFT framing of mono PCM into [`FrequencySlice`]s.
//!
//! Each frame is Hamming-windowed, transformed, and reduced to three band
//! energies (bass/mid/treble), an overall amplitude and the dominant
//! frequency. The window is computed once per FFT size and owned by the
//! extractor, so independent extractors never share state.

use std::collections::HashMap;
use std::sync::Arc;

use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::{Deserialize, Serialize};

use super::features::FrequencySlice;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_HOP_SIZE: usize = 512;

const BASS_HZ: (f32, f32) = (20.0, 250.0);
const MID_HZ: (f32, f32) = (250.0, 4000.0);
const TREBLE_HZ: (f32, f32) = (4000.0, 20000.0);

/// Band sums are divided by `num_bins * NORMALIZATION`.
const NORMALIZATION: f32 = 0.1;

/// Framing parameters for one extraction run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParams {
    pub fft_size: usize,
    pub hop_size: usize,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
        }
    }
}

impl FrameParams {
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        Self { fft_size, hop_size }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fft_size < 2 || !self.fft_size.is_power_of_two() {
            return Err(AnalysisError::configuration(format!(
                "FFT size must be a power of two >= 2, got {}",
                self.fft_size
            )));
        }
        if self.hop_size == 0 {
            return Err(AnalysisError::configuration("hop size must be non-zero"));
        }
        Ok(())
    }

    /// Number of slices produced for `num_samples` input samples.
    pub fn slice_count(&self, num_samples: usize) -> usize {
        num_samples.saturating_sub(self.fft_size) / self.hop_size
    }
}

/// Hamming window `0.54 - 0.46 cos(2πi/(N-1))`.
pub fn hamming_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.54 - 0.46 * (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()
        })
        .collect()
}

pub struct SpectralFrameExtractor {
    planner: FftPlanner<f32>,
    windows: HashMap<usize, Arc<[f32]>>,
    window_computations: usize,
}

impl Default for SpectralFrameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SpectralFrameExtractor {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
            windows: HashMap::new(),
            window_computations: 0,
        }
    }

    /// How many windows this extractor has computed so far.
    pub fn window_computations(&self) -> usize {
        self.window_computations
    }

    /// Cached window for `fft_size`, computed on first use.
    pub fn window(&mut self, fft_size: usize) -> Arc<[f32]> {
        if let Some(window) = self.windows.get(&fft_size) {
            return Arc::clone(window);
        }
        log::debug!("Computing Hamming window for FFT size {}", fft_size);
        let window: Arc<[f32]> = hamming_window(fft_size).into();
        self.window_computations += 1;
        self.windows.insert(fft_size, Arc::clone(&window));
        window
    }

    /// Splits `samples` into FFT frames and reduces each to a [`FrequencySlice`].
    pub fn extract(
        &mut self,
        samples: &[f32],
        sample_rate: u32,
        params: FrameParams,
    ) -> Result<Vec<FrequencySlice>> {
        params.validate()?;
        if sample_rate == 0 {
            return Err(AnalysisError::configuration("sample rate must be non-zero"));
        }
        if samples.len() < params.fft_size {
            return Err(AnalysisError::input(format!(
                "need at least {} samples for one frame, got {}",
                params.fft_size,
                samples.len()
            )));
        }

        let fft_size = params.fft_size;
        let hop_size = params.hop_size;
        let window = self.window(fft_size);
        let fft = self.planner.plan_fft_forward(fft_size);
        let count = params.slice_count(samples.len());

        let slices: Vec<FrequencySlice> = (0..count)
            .into_par_iter()
            .map_init(
                || {
                    (
                        vec![Complex::new(0.0f32, 0.0); fft_size],
                        vec![Complex::new(0.0f32, 0.0); fft.get_inplace_scratch_len()],
                    )
                },
                |(buffer, scratch), i| {
                    let start = i * hop_size;
                    for (slot, (&s, &w)) in buffer
                        .iter_mut()
                        .zip(samples[start..start + fft_size].iter().zip(window.iter()))
                    {
                        *slot = Complex::new(s * w, 0.0);
                    }
                    fft.process_with_scratch(buffer, scratch);

                    let timestamp = start as f64 / sample_rate as f64;
                    slice_from_spectrum(&buffer[..fft_size / 2], sample_rate, timestamp)
                },
            )
            .collect();

        log::debug!(
            "Extracted {} slices (fft={}, hop={}, sr={})",
            slices.len(),
            fft_size,
            hop_size,
            sample_rate
        );
        Ok(slices)
    }
}

fn slice_from_spectrum(bins: &[Complex<f32>], sample_rate: u32, timestamp: f64) -> FrequencySlice {
    let num_bins = bins.len();
    let nyquist = sample_rate as f32 / 2.0;

    let mut bass = 0.0f32;
    let mut mid = 0.0f32;
    let mut treble = 0.0f32;
    let mut total = 0.0f32;
    let mut peak = (0usize, 0.0f32);

    for (bin, c) in bins.iter().enumerate() {
        let magnitude = c.norm();
        let freq = bin as f32 * nyquist / num_bins as f32;

        if (BASS_HZ.0..BASS_HZ.1).contains(&freq) {
            bass += magnitude;
        } else if (MID_HZ.0..MID_HZ.1).contains(&freq) {
            mid += magnitude;
        } else if (TREBLE_HZ.0..=TREBLE_HZ.1).contains(&freq) {
            treble += magnitude;
        }
        total += magnitude;

        if magnitude > peak.1 {
            peak = (bin, magnitude);
        }
    }

    let norm = num_bins as f32 * NORMALIZATION;
    let scale = |v: f32| (v / norm).clamp(0.0, 1.0);

    FrequencySlice {
        timestamp,
        bass: scale(bass),
        mid: scale(mid),
        treble: scale(treble),
        amplitude: scale(total),
        dominant_frequency: peak.0 as f32 * nyquist / num_bins as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sine(freq: f32, amplitude: f32, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| {
                amplitude
                    * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn rejects_non_power_of_two() {
        let mut extractor = SpectralFrameExtractor::new();
        let samples = vec![0.0; 4096];
        for size in [0, 1, 3, 1000, 1536] {
            let err = extractor
                .extract(&samples, 44100, FrameParams::new(size, 256))
                .unwrap_err();
            assert!(matches!(err, AnalysisError::Configuration(_)), "size {}", size);
        }
    }

    #[test]
    fn rejects_zero_hop() {
        let mut extractor = SpectralFrameExtractor::new();
        let err = extractor
            .extract(&[0.0; 4096], 44100, FrameParams::new(1024, 0))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Configuration(_)));
    }

    #[test]
    fn rejects_short_buffer() {
        let mut extractor = SpectralFrameExtractor::new();
        let err = extractor
            .extract(&[0.0; 100], 44100, FrameParams::new(1024, 256))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Input(_)));
    }

    #[test]
    fn slice_count_matches_formula() {
        let mut extractor = SpectralFrameExtractor::new();
        let samples = sine(440.0, 0.5, 22050, 10_007);
        for (fft_size, hop_size) in [(256, 128), (512, 100), (1024, 256), (2048, 512)] {
            let slices = extractor
                .extract(&samples, 22050, FrameParams::new(fft_size, hop_size))
                .unwrap();
            assert_eq!(slices.len(), (samples.len() - fft_size) / hop_size);
        }
    }

    #[test]
    fn exact_frame_gives_no_slices() {
        let mut extractor = SpectralFrameExtractor::new();
        let slices = extractor
            .extract(&[0.0; 1024], 44100, FrameParams::new(1024, 256))
            .unwrap();
        assert!(slices.is_empty());
    }

    #[test]
    fn hamming_shape() {
        for n in [64, 256, 1024, 2048] {
            let w = hamming_window(n);
            assert_abs_diff_eq!(w[0], 0.08, epsilon = 0.01);
            assert_abs_diff_eq!(w[n - 1], 0.08, epsilon = 0.01);
            assert_abs_diff_eq!(w[n / 2], 1.0, epsilon = 0.01);
        }
    }

    #[test]
    fn window_computed_once_per_size() {
        let mut extractor = SpectralFrameExtractor::new();
        let samples = sine(440.0, 0.5, 44100, 44100);
        let params = FrameParams::new(1024, 256);

        for _ in 0..3 {
            let slices = extractor.extract(&samples, 44100, params).unwrap();
            assert!(slices.len() > 100);
        }
        assert_eq!(extractor.window_computations(), 1);

        extractor
            .extract(&samples, 44100, FrameParams::new(512, 256))
            .unwrap();
        extractor.extract(&samples, 44100, params).unwrap();
        assert_eq!(extractor.window_computations(), 2);

        // Fresh extractor starts with a fresh cache
        assert_eq!(SpectralFrameExtractor::new().window_computations(), 0);
    }

    #[test]
    fn timestamps_follow_hop() {
        let mut extractor = SpectralFrameExtractor::new();
        let samples = sine(440.0, 0.5, 8000, 8000);
        let slices = extractor
            .extract(&samples, 8000, FrameParams::new(256, 80))
            .unwrap();
        for (i, slice) in slices.iter().enumerate() {
            assert_abs_diff_eq!(slice.timestamp, i as f64 * 80.0 / 8000.0, epsilon = 1e-12);
        }
        assert!(slices.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn mid_tone_lands_in_mid_band() {
        let mut extractor = SpectralFrameExtractor::new();
        let samples = sine(1000.0, 0.5, 44100, 16384);
        let slices = extractor
            .extract(&samples, 44100, FrameParams::new(2048, 1024))
            .unwrap();
        let bin_width = 44100.0 / 2048.0;
        for slice in &slices {
            assert!(slice.mid > slice.bass);
            assert!(slice.mid > slice.treble);
            assert!((slice.dominant_frequency - 1000.0).abs() <= bin_width);
            for v in [slice.bass, slice.mid, slice.treble, slice.amplitude] {
                assert!((0.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn silence_is_all_zero() {
        let mut extractor = SpectralFrameExtractor::new();
        let slices = extractor
            .extract(&[0.0; 8192], 44100, FrameParams::new(1024, 512))
            .unwrap();
        assert!(slices
            .iter()
            .all(|s| s.bass == 0.0 && s.mid == 0.0 && s.treble == 0.0 && s.amplitude == 0.0));
    }
}
