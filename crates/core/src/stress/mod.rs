use crate::audio::AcousticFeatureVector;
use crate::config::{LevelThresholds, StressWeights};
use crate::emotion::EmotionScore;
use serde::{Deserialize, Serialize};

/// Half-saturation point for pitch variance, in Hz^2.
const PITCH_VAR_SCALE: f32 = 1_000.0;
/// Half-saturation point for speaking rate, in words per second.
const SPEAKING_RATE_SCALE: f32 = 3.0;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

/// Derived stress/anxiety summary: a scalar in [0,1] plus the categorical
/// level it falls into under the configured thresholds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StressIndicator {
    pub value: f32,
    pub level: StressLevel,
}

/// Weighted combination of emotional and acoustic evidence. Negative-valence
/// emotion mass, elevated pitch variance, fast speech and sparse pauses all
/// raise the indicator. The weighted sum is divided by the mass of the
/// weights whose inputs are present, so a text-only estimate still spans the
/// full [0,1] range. Pure function of its inputs.
pub fn estimate(
    emotion: Option<&EmotionScore>,
    acoustic: Option<&AcousticFeatureVector>,
    weights: &StressWeights,
    thresholds: &LevelThresholds,
) -> StressIndicator {
    let mut weighted = 0.0f32;
    let mut mass = 0.0f32;

    if let Some(score) = emotion {
        weighted += weights.emotion * score.negative_mass();
        mass += weights.emotion;
    }
    if let Some(features) = acoustic {
        weighted += weights.pitch * squash(features.pitch_var, PITCH_VAR_SCALE);
        weighted += weights.rate * squash(features.speaking_rate, SPEAKING_RATE_SCALE);
        weighted += weights.pause * (1.0 - features.pause_ratio).clamp(0.0, 1.0);
        mass += weights.pitch + weights.rate + weights.pause;
    }

    let value = if mass > 0.0 {
        (weighted / mass).clamp(0.0, 1.0)
    } else {
        0.0
    };

    StressIndicator {
        value,
        level: level_for(value, thresholds),
    }
}

fn level_for(value: f32, thresholds: &LevelThresholds) -> StressLevel {
    if value >= thresholds.high {
        StressLevel::High
    } else if value >= thresholds.moderate {
        StressLevel::Moderate
    } else {
        StressLevel::Low
    }
}

fn squash(value: f32, scale: f32) -> f32 {
    if value <= 0.0 {
        0.0
    } else {
        value / (value + scale)
    }
}
