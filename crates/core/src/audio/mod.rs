mod features;

pub use features::extract;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decoded mono audio, one analysis input. Capture and file decoding live
/// outside the core; this type only carries their output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Per-segment prosodic statistics. `speaking_rate` is words per second and
/// is filled in from the transcript once transcription completes.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct AcousticFeatureVector {
    pub pitch_mean: f32,
    pub pitch_var: f32,
    pub energy_mean: f32,
    pub speaking_rate: f32,
    pub pause_ratio: f32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AcousticError {
    #[error("audio shorter than minimum analysis window ({min_ms} ms)")]
    InsufficientAudio { min_ms: u64 },

    #[error("unsupported sample rate {rate} Hz (supported {min}..={max} Hz)")]
    UnsupportedSampleRate { rate: u32, min: u32, max: u32 },
}
