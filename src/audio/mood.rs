use super::features::{FrequencySlice, Mood};

/// Mean band energies across a track.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BandBalance {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
}

impl BandBalance {
    pub fn from_slices(slices: &[FrequencySlice]) -> Self {
        if slices.is_empty() {
            return Self::default();
        }
        let n = slices.len() as f32;
        let (bass, mid, treble) = slices.iter().fold((0.0, 0.0, 0.0), |(b, m, t), s| {
            (b + s.bass, m + s.mid, t + s.treble)
        });
        Self {
            bass: bass / n,
            mid: mid / n,
            treble: treble / n,
        }
    }

    fn bass_dominant(&self) -> bool {
        self.bass > self.mid && self.bass > self.treble
    }
}

/// Rule-based mood label from energy, tempo and band balance.
///
/// This is a fixed heuristic, not a trained model.
#[derive(Clone, Copy, Debug, Default)]
pub struct MoodClassifier;

impl MoodClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, energy: f32, bpm: f64, balance: BandBalance) -> Mood {
        if energy < 0.3 && bpm < 100.0 {
            if balance.treble > balance.bass {
                Mood::Ambient
            } else {
                Mood::Calm
            }
        } else if energy > 0.6 && bpm > 130.0 {
            Mood::Intense
        } else if energy > 0.5 || bpm > 120.0 {
            Mood::Energetic
        } else if balance.bass_dominant() {
            Mood::Dramatic
        } else {
            Mood::Calm
        }
    }
}
