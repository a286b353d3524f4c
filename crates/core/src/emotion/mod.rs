use crate::runtime::{ModelRuntime, RuntimeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tolerance within which an emotion distribution counts as normalized.
pub const PROBABILITY_TOLERANCE: f32 = 1e-3;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Joy,
    Sadness,
    Anger,
    Fear,
    Surprise,
    Disgust,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Joy,
        Emotion::Sadness,
        Emotion::Anger,
        Emotion::Fear,
        Emotion::Surprise,
        Emotion::Disgust,
        Emotion::Neutral,
    ];

    /// Labels that contribute positively to the stress indicator.
    pub fn is_negative_valence(self) -> bool {
        matches!(self, Emotion::Sadness | Emotion::Fear | Emotion::Anger)
    }

    /// Screening hint attached to this label in reports. Not a diagnosis.
    pub fn indication(self) -> Option<&'static str> {
        match self {
            Emotion::Sadness => Some("depression risk"),
            Emotion::Fear => Some("anxiety signs"),
            Emotion::Anger => Some("stress markers"),
            Emotion::Neutral => Some("baseline state"),
            _ => None,
        }
    }
}

/// Probability distribution over the emotion label set. Always normalized:
/// construction clamps negative weights to zero and renormalizes any
/// distribution whose mass drifts beyond [`PROBABILITY_TOLERANCE`]. A
/// zero-mass input becomes all-neutral.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionScore(BTreeMap<Emotion, f32>);

impl EmotionScore {
    pub fn from_weights(weights: BTreeMap<Emotion, f32>) -> Self {
        let mut clamped: BTreeMap<Emotion, f32> = weights
            .into_iter()
            .map(|(emotion, w)| (emotion, w.max(0.0)))
            .collect();
        let sum: f32 = clamped.values().sum();
        if sum <= 0.0 {
            return Self(BTreeMap::from([(Emotion::Neutral, 1.0)]));
        }
        if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
            tracing::debug!(sum, "renormalizing emotion distribution");
            for w in clamped.values_mut() {
                *w /= sum;
            }
        }
        Self(clamped)
    }

    pub fn probability(&self, emotion: Emotion) -> f32 {
        self.0.get(&emotion).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> f32 {
        self.0.values().sum()
    }

    /// Most probable label; ties resolve to the earliest label in the
    /// canonical order.
    pub fn dominant(&self) -> Emotion {
        let mut best = Emotion::Neutral;
        let mut best_p = f32::MIN;
        for emotion in Emotion::ALL {
            let p = self.probability(emotion);
            if p > best_p {
                best = emotion;
                best_p = p;
            }
        }
        best
    }

    /// Combined mass of the negative-valence labels.
    pub fn negative_mass(&self) -> f32 {
        self.0
            .iter()
            .filter(|(emotion, _)| emotion.is_negative_valence())
            .map(|(_, p)| p)
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        self.0.iter().map(|(e, p)| (*e, *p))
    }
}

/// Maps normalized text (or transcript text) onto an emotion distribution by
/// delegating inference to the model runtime.
#[derive(Clone)]
pub struct EmotionClassifier {
    runtime: Arc<dyn ModelRuntime>,
}

impl EmotionClassifier {
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn classify(&self, text: String) -> Result<EmotionScore, RuntimeError> {
        self.runtime.classify_emotion(text).await
    }
}
