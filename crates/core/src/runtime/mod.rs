mod lexicon;

pub use lexicon::LexiconRuntime;

use crate::audio::Waveform;
use crate::emotion::EmotionScore;
use crate::transcribe::TranscriptSegment;
use futures::future::BoxFuture;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("model runtime unavailable: {0}")]
    Unavailable(String),

    #[error("model runtime rejected input: {0}")]
    Rejected(String),
}

impl RuntimeError {
    /// Only unreachable/timed-out runtimes are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RuntimeError::Unavailable(_))
    }
}

/// Inference capabilities supplied by a pretrained-model backend. Both
/// operations are stateless and idempotent for a fixed model version, so any
/// backend can be substituted behind this trait.
pub trait ModelRuntime: Send + Sync {
    /// Time-aligned transcription. Segments are time-ordered and
    /// non-overlapping; all-silence audio yields an empty sequence.
    fn speech_to_text(
        &self,
        waveform: Waveform,
    ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, RuntimeError>>;

    /// Probability distribution over the emotion label set.
    fn classify_emotion(&self, text: String) -> BoxFuture<'_, Result<EmotionScore, RuntimeError>>;
}
