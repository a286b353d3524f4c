use crate::audio::Waveform;
use crate::runtime::{ModelRuntime, RuntimeError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// One time-bounded unit of transcribed speech. Segments within a transcript
/// are non-overlapping and ordered by start time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TranscriptSegment {
    pub start: Duration,
    pub end: Duration,
    pub text: String,
    pub confidence: Option<f32>,
}

impl TranscriptSegment {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

pub fn joined_text(segments: &[TranscriptSegment]) -> String {
    segments
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn word_count(segments: &[TranscriptSegment]) -> usize {
    segments.iter().map(TranscriptSegment::word_count).sum()
}

/// Thin wrapper over the runtime's speech-to-text capability. Restores the
/// start-time ordering invariant on the returned segments; an all-silence
/// waveform yields an empty transcript, not an error.
#[derive(Clone)]
pub struct Transcriber {
    runtime: Arc<dyn ModelRuntime>,
}

impl Transcriber {
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self { runtime }
    }

    pub async fn transcribe(
        &self,
        waveform: Waveform,
    ) -> Result<Vec<TranscriptSegment>, RuntimeError> {
        let mut segments = self.runtime.speech_to_text(waveform).await?;
        segments.sort_by_key(|s| s.start);
        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct StubRuntime {
        segments: Vec<TranscriptSegment>,
    }

    impl ModelRuntime for StubRuntime {
        fn speech_to_text(
            &self,
            _waveform: Waveform,
        ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, RuntimeError>> {
            let segments = self.segments.clone();
            async move { Ok(segments) }.boxed()
        }

        fn classify_emotion(
            &self,
            _text: String,
        ) -> BoxFuture<'_, Result<crate::emotion::EmotionScore, RuntimeError>> {
            async move { Err(RuntimeError::Unavailable("stub".to_owned())) }.boxed()
        }
    }

    fn segment(start_ms: u64, end_ms: u64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: text.to_owned(),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn segments_are_ordered_by_start_time() {
        let runtime = Arc::new(StubRuntime {
            segments: vec![segment(1_000, 1_800, "world"), segment(0, 900, "hello")],
        });
        let transcriber = Transcriber::new(runtime);
        let segments =
            futures::executor::block_on(transcriber.transcribe(Waveform::new(vec![], 16_000)))
                .expect("segments");
        assert_eq!(segments[0].text, "hello");
        assert_eq!(segments[1].text, "world");
    }

    #[test]
    fn empty_audio_yields_empty_transcript() {
        let runtime = Arc::new(StubRuntime { segments: vec![] });
        let transcriber = Transcriber::new(runtime);
        let segments =
            futures::executor::block_on(transcriber.transcribe(Waveform::new(vec![], 16_000)))
                .expect("segments");
        assert!(segments.is_empty());
    }

    #[test]
    fn joined_text_skips_blank_segments() {
        let segments = vec![
            segment(0, 500, "good morning"),
            segment(500, 700, "  "),
            segment(700, 1_200, "everyone"),
        ];
        assert_eq!(joined_text(&segments), "good morning everyone");
        assert_eq!(word_count(&segments), 3);
    }
}
