use super::beats::BeatDetector;
use super::features::{AudioBuffer, AudioFeatures, FrequencySlice};
use super::mood::{BandBalance, MoodClassifier};
use super::spectrum::{FrameParams, SpectralFrameExtractor};
use crate::error::Result;

/// Runs the full analysis pipeline on a decoded buffer.
///
/// Keeps its extractor between calls so repeated analyses at the same FFT
/// size reuse the cached window.
#[derive(Default)]
pub struct AudioAnalyzer {
    extractor: SpectralFrameExtractor,
    beats: BeatDetector,
    mood: MoodClassifier,
}

impl AudioAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extractor(&self) -> &SpectralFrameExtractor {
        &self.extractor
    }

    pub fn analyze(&mut self, audio: &AudioBuffer, params: FrameParams) -> Result<AudioFeatures> {
        let samples = audio.to_mono();

        log::info!(
            "Pass 1: Spectral frames (fft={}, hop={})...",
            params.fft_size,
            params.hop_size
        );
        let slices = self.extractor.extract(&samples, audio.sample_rate(), params)?;

        log::info!("Pass 2: Beat detection over {} slices...", slices.len());
        let beat_analysis = self.beats.detect(&slices);

        log::info!("Pass 3: Mood classification...");
        let energy = overall_energy(&slices);
        let balance = BandBalance::from_slices(&slices);
        let mood = self.mood.classify(energy, beat_analysis.bpm, balance);

        log::info!(
            "Global: slices={}, beats={}, tempo={:.1} BPM, energy={:.3}, mood={}",
            slices.len(),
            beat_analysis.beats.len(),
            beat_analysis.bpm,
            energy,
            mood
        );

        Ok(AudioFeatures {
            bpm: beat_analysis.bpm,
            beats: beat_analysis.beats,
            frequency_data: slices,
            energy,
            mood,
            duration: audio.duration(),
        })
    }
}

/// One-shot analysis with a fresh analyzer.
pub fn analyze(audio: &AudioBuffer, params: FrameParams) -> Result<AudioFeatures> {
    AudioAnalyzer::new().analyze(audio, params)
}

fn overall_energy(slices: &[FrequencySlice]) -> f32 {
    if slices.is_empty() {
        return 0.0;
    }
    slices.iter().map(|s| s.amplitude).sum::<f32>() / slices.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::features::Mood;
    use crate::error::AnalysisError;
    use approx::assert_abs_diff_eq;

    const SR: u32 = 44100;

    /// Hann-gated 100 Hz bursts, 40 ms long, every `period` seconds from 0.25 s.
    fn bass_pulses(period: f64, duration: f64) -> Vec<f32> {
        let len = (duration * SR as f64) as usize;
        let burst = (0.04 * SR as f64) as usize;
        let mut samples = vec![0.0f32; len];
        let mut start_time = 0.25;
        while start_time + 0.04 < duration {
            let start = (start_time * SR as f64) as usize;
            for i in 0..burst {
                let t = i as f32 / SR as f32;
                let env = (std::f32::consts::PI * i as f32 / burst as f32).sin().powi(2);
                samples[start + i] += 0.05 * env * (2.0 * std::f32::consts::PI * 100.0 * t).sin();
            }
            start_time += period;
        }
        samples
    }

    #[test]
    fn silent_track() {
        let audio = AudioBuffer::mono(SR, vec![0.0; SR as usize * 2]).unwrap();
        let features = analyze(&audio, FrameParams::default()).unwrap();
        assert!(features.beats.is_empty());
        assert_eq!(features.bpm, 120.0);
        assert_eq!(features.energy, 0.0);
        assert_eq!(features.mood, Mood::Calm);
        assert_eq!(features.duration, 2.0);
    }

    #[test]
    fn pulse_train_tempo() {
        let audio = AudioBuffer::mono(SR, bass_pulses(0.5, 8.0)).unwrap();
        let features = analyze(&audio, FrameParams::new(2048, 512)).unwrap();
        assert!(features.beats.len() >= 4, "beats: {:?}", features.beats);
        assert_abs_diff_eq!(features.bpm, 120.0, epsilon = 5.0);
        assert!(features
            .beats
            .iter()
            .all(|&b| (0.0..=features.duration).contains(&b)));
    }

    #[test]
    fn stereo_is_downmixed() {
        let left = bass_pulses(0.5, 3.0);
        let right = left.clone();
        let stereo = AudioBuffer::new(SR, vec![left.clone(), right]).unwrap();
        let mono = AudioBuffer::mono(SR, left).unwrap();
        let params = FrameParams::new(1024, 512);
        assert_eq!(
            analyze(&stereo, params).unwrap().frequency_data,
            analyze(&mono, params).unwrap().frequency_data
        );
    }

    #[test]
    fn extraction_errors_abort() {
        let audio = AudioBuffer::mono(SR, vec![0.0; 100]).unwrap();
        assert!(matches!(
            analyze(&audio, FrameParams::default()),
            Err(AnalysisError::Input(_))
        ));
        let audio = AudioBuffer::mono(SR, vec![0.0; 10_000]).unwrap();
        assert!(matches!(
            analyze(&audio, FrameParams::new(1000, 256)),
            Err(AnalysisError::Configuration(_))
        ));
    }

    #[test]
    fn analyzer_reuses_window() {
        let audio = AudioBuffer::mono(SR, vec![0.0; SR as usize]).unwrap();
        let mut analyzer = AudioAnalyzer::new();
        for _ in 0..4 {
            analyzer.analyze(&audio, FrameParams::default()).unwrap();
        }
        assert_eq!(analyzer.extractor().window_computations(), 1);
    }
}
