use super::{ModelRuntime, RuntimeError};
use crate::audio::Waveform;
use crate::emotion::{Emotion, EmotionScore};
use crate::transcribe::TranscriptSegment;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::BTreeMap;

const JOY_CUES: &[&str] = &[
    "happy", "joy", "joyful", "excited", "glad", "great", "wonderful", "love", "delighted",
];
const SADNESS_CUES: &[&str] = &[
    "sad", "depressed", "unhappy", "miserable", "terrible", "lonely", "hopeless", "crying",
];
const ANGER_CUES: &[&str] = &["angry", "mad", "furious", "annoyed", "hate", "frustrated"];
const FEAR_CUES: &[&str] = &[
    "scared", "afraid", "fear", "anxious", "worried", "nervous", "panic", "terrified",
];
const SURPRISE_CUES: &[&str] = &["surprised", "surprise", "wow", "unexpected", "amazing"];
const DISGUST_CUES: &[&str] = &["disgust", "disgusting", "gross", "awful", "revolting"];

/// Neutral mass mixed into every classification so cue-free text stays
/// neutral instead of degenerating to a zero distribution.
const NEUTRAL_BASELINE: f32 = 1.0;

/// Offline keyword-matching emotion backend. No transcription capability;
/// audio analysis needs a runtime backed by a real speech model.
#[derive(Clone, Copy, Debug, Default)]
pub struct LexiconRuntime;

impl LexiconRuntime {
    pub fn new() -> Self {
        Self
    }

    fn cue_hits(tokens: &[&str], cues: &[&str]) -> f32 {
        tokens.iter().filter(|t| cues.contains(*t)).count() as f32
    }
}

impl ModelRuntime for LexiconRuntime {
    fn speech_to_text(
        &self,
        _waveform: Waveform,
    ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, RuntimeError>> {
        async move {
            Err(RuntimeError::Unavailable(
                "lexicon runtime has no speech-to-text model".to_owned(),
            ))
        }
        .boxed()
    }

    fn classify_emotion(&self, text: String) -> BoxFuture<'_, Result<EmotionScore, RuntimeError>> {
        async move {
            let lower = text.to_lowercase();
            let tokens: Vec<&str> = lower.split_whitespace().collect();
            if tokens.is_empty() {
                return Err(RuntimeError::Rejected(
                    "no tokens to classify".to_owned(),
                ));
            }
            let weights = BTreeMap::from([
                (Emotion::Joy, Self::cue_hits(&tokens, JOY_CUES)),
                (Emotion::Sadness, Self::cue_hits(&tokens, SADNESS_CUES)),
                (Emotion::Anger, Self::cue_hits(&tokens, ANGER_CUES)),
                (Emotion::Fear, Self::cue_hits(&tokens, FEAR_CUES)),
                (Emotion::Surprise, Self::cue_hits(&tokens, SURPRISE_CUES)),
                (Emotion::Disgust, Self::cue_hits(&tokens, DISGUST_CUES)),
                (Emotion::Neutral, NEUTRAL_BASELINE),
            ]);
            Ok(EmotionScore::from_weights(weights))
        }
        .boxed()
    }
}
