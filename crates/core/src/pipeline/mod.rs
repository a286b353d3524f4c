use crate::aggregate::{self, AggregateError, PatternSummary};
use crate::audio::{self, AcousticError, Waveform};
use crate::config::AnalysisConfig;
use crate::emotion::{EmotionClassifier, EmotionScore};
use crate::report::{self, Report, ReportError};
use crate::runtime::{ModelRuntime, RuntimeError};
use crate::session::{AnalysisResult, InputModality, SessionStore, StoreError};
use crate::stress;
use crate::text::{self, TextError};
use crate::transcribe::{self, Transcriber, TranscriptSegment};
use crate::util::retry::{retry_with_backoff, RetryConfig};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Text(#[from] TextError),

    #[error(transparent)]
    Acoustic(#[from] AcousticError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Orchestrates one synchronous analysis per call: feature extraction,
/// transcription, classification, stress estimation, then an append to the
/// session log. Model calls are the only blocking-prone steps; they run
/// under a timeout and a bounded retry.
pub struct Analyzer {
    transcriber: Transcriber,
    classifier: EmotionClassifier,
    store: Arc<dyn SessionStore>,
    config: AnalysisConfig,
}

impl Analyzer {
    pub fn new(
        runtime: Arc<dyn ModelRuntime>,
        store: Arc<dyn SessionStore>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            transcriber: Transcriber::new(Arc::clone(&runtime)),
            classifier: EmotionClassifier::new(runtime),
            store,
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Text path: normalize, classify, estimate stress, append.
    pub async fn analyze_text(
        &self,
        session_id: &str,
        raw_text: &str,
    ) -> Result<AnalysisResult, PipelineError> {
        let tokens = text::normalize(raw_text)?;
        let score = self.classify_with_retry(tokens.join(" ")).await?;
        let indicator = stress::estimate(
            Some(&score),
            None,
            &self.config.stress.weights,
            &self.config.stress.thresholds,
        );
        let result = AnalysisResult {
            modality: InputModality::Text,
            emotion_score: Some(score),
            stress: indicator,
            transcript: None,
            features: None,
            analyzed_at: SystemTime::now(),
        };
        self.store
            .append(session_id.to_owned(), result.clone())
            .await?;
        tracing::info!(
            session = session_id,
            stress = result.stress.value,
            "text analysis complete"
        );
        Ok(result)
    }

    /// Audio path: feature extraction and transcription run concurrently,
    /// then classification on the transcript. All-silence audio produces a
    /// result without an emotion score.
    pub async fn analyze_audio(
        &self,
        session_id: &str,
        waveform: Waveform,
    ) -> Result<AnalysisResult, PipelineError> {
        let (segments, features) = tokio::join!(self.transcribe_with_retry(&waveform), async {
            audio::extract(&waveform, &self.config)
        });
        // Input validation outranks a model failure on the same call.
        let mut features = features?;
        let segments = segments?;

        let transcript_text = transcribe::joined_text(&segments);
        let score = match text::normalize(&transcript_text) {
            Ok(tokens) => Some(self.classify_with_retry(tokens.join(" ")).await?),
            Err(TextError::EmptyInput) => None,
        };

        features.speaking_rate =
            transcribe::word_count(&segments) as f32 / waveform.duration().as_secs_f32();
        let indicator = stress::estimate(
            score.as_ref(),
            Some(&features),
            &self.config.stress.weights,
            &self.config.stress.thresholds,
        );
        let result = AnalysisResult {
            modality: InputModality::Audio,
            emotion_score: score,
            stress: indicator,
            transcript: (!segments.is_empty()).then_some(segments),
            features: Some(features),
            analyzed_at: SystemTime::now(),
        };
        self.store
            .append(session_id.to_owned(), result.clone())
            .await?;
        tracing::info!(
            session = session_id,
            stress = result.stress.value,
            "audio analysis complete"
        );
        Ok(result)
    }

    /// Recomputes the session's pattern summary from the stored history.
    pub async fn summarize(&self, session_id: &str) -> Result<PatternSummary, PipelineError> {
        let session = self.store.load(session_id.to_owned()).await?;
        let results = session.as_ref().map(|s| s.results()).unwrap_or(&[]);
        Ok(aggregate::summarize(
            results,
            self.config.trajectory_window,
            self.config.anomaly_threshold,
        )?)
    }

    /// Builds an exportable report for the session. Multi-result sessions
    /// get a pattern summary attached.
    pub async fn report(&self, session_id: &str) -> Result<Report, PipelineError> {
        let session = self
            .store
            .load(session_id.to_owned())
            .await?
            .ok_or(ReportError::IncompleteData)?;
        let summary = if session.results().len() > 1 {
            Some(aggregate::summarize(
                session.results(),
                self.config.trajectory_window,
                self.config.anomaly_threshold,
            )?)
        } else {
            None
        };
        Ok(report::generate(&session, summary)?)
    }

    async fn classify_with_retry(&self, text: String) -> Result<EmotionScore, RuntimeError> {
        let retry = self.retry_config();
        retry_with_backoff(
            &retry,
            || self.timed(self.classifier.classify(text.clone())),
            RuntimeError::is_retryable,
        )
        .await
    }

    async fn transcribe_with_retry(
        &self,
        waveform: &Waveform,
    ) -> Result<Vec<TranscriptSegment>, RuntimeError> {
        let retry = self.retry_config();
        retry_with_backoff(
            &retry,
            || self.timed(self.transcriber.transcribe(waveform.clone())),
            RuntimeError::is_retryable,
        )
        .await
    }

    /// Dropping the inner future on timeout is what cancels the model call.
    async fn timed<T>(
        &self,
        fut: impl Future<Output = Result<T, RuntimeError>>,
    ) -> Result<T, RuntimeError> {
        match tokio::time::timeout(self.config.model_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::Unavailable(format!(
                "model call exceeded {:?} timeout",
                self.config.model_timeout
            ))),
        }
    }

    fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.config.model_retries + 1, Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::Emotion;
    use crate::runtime::LexiconRuntime;
    use crate::session::MemorySessionStore;
    use crate::stress::StressLevel;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct ScriptedRuntime {
        segments: Vec<TranscriptSegment>,
        weights: BTreeMap<Emotion, f32>,
    }

    impl ModelRuntime for ScriptedRuntime {
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
        ) -> BoxFuture<'_, Result<EmotionScore, RuntimeError>> {
            let weights = self.weights.clone();
            async move { Ok(EmotionScore::from_weights(weights)) }.boxed()
        }
    }

    struct UnavailableRuntime {
        attempts: AtomicU32,
    }

    impl ModelRuntime for UnavailableRuntime {
        fn speech_to_text(
            &self,
            _waveform: Waveform,
        ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, RuntimeError>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(RuntimeError::Unavailable("down".to_owned())) }.boxed()
        }

        fn classify_emotion(
            &self,
            _text: String,
        ) -> BoxFuture<'_, Result<EmotionScore, RuntimeError>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(RuntimeError::Unavailable("down".to_owned())) }.boxed()
        }
    }

    struct HangingRuntime {
        attempts: AtomicU32,
    }

    impl ModelRuntime for HangingRuntime {
        fn speech_to_text(
            &self,
            _waveform: Waveform,
        ) -> BoxFuture<'_, Result<Vec<TranscriptSegment>, RuntimeError>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().boxed()
        }

        fn classify_emotion(
            &self,
            _text: String,
        ) -> BoxFuture<'_, Result<EmotionScore, RuntimeError>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            futures::future::pending().boxed()
        }
    }

    fn analyzer_with(
        runtime: Arc<dyn ModelRuntime>,
        config: AnalysisConfig,
    ) -> (Analyzer, Arc<MemorySessionStore>) {
        let store = Arc::new(MemorySessionStore::new());
        (Analyzer::new(runtime, store.clone(), config), store)
    }

    fn segment(start_ms: u64, end_ms: u64, text: &str) -> TranscriptSegment {
        TranscriptSegment {
            start: Duration::from_millis(start_ms),
            end: Duration::from_millis(end_ms),
            text: text.to_owned(),
            confidence: Some(0.9),
        }
    }

    fn speech_waveform() -> Waveform {
        Waveform::new(vec![0.1; 32_000], 16_000)
    }

    #[tokio::test]
    async fn text_analysis_end_to_end() {
        let (analyzer, store) = analyzer_with(
            Arc::new(LexiconRuntime::new()),
            AnalysisConfig::default(),
        );
        let result = analyzer
            .analyze_text("s1", "I am very happy and excited today!")
            .await
            .expect("result");

        assert_eq!(result.modality, InputModality::Text);
        let score = result.emotion_score.expect("score");
        assert_eq!(score.dominant(), Emotion::Joy);
        assert_eq!(result.stress.level, StressLevel::Low);

        let stored = store
            .load("s1".to_owned())
            .await
            .expect("load")
            .expect("session");
        assert_eq!(stored.results().len(), 1);
    }

    #[tokio::test]
    async fn punctuation_only_text_is_rejected() {
        let (analyzer, store) = analyzer_with(
            Arc::new(LexiconRuntime::new()),
            AnalysisConfig::default(),
        );
        let err = analyzer.analyze_text("s1", "?!?!").await.unwrap_err();
        assert!(matches!(err, PipelineError::Text(TextError::EmptyInput)));

        let stored = store.load("s1".to_owned()).await.expect("load");
        assert!(stored.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn runtime_failure_surfaces_after_configured_retries() {
        let runtime = Arc::new(UnavailableRuntime {
            attempts: AtomicU32::new(0),
        });
        let config = AnalysisConfig {
            model_retries: 2,
            ..AnalysisConfig::default()
        };
        let (analyzer, _) = analyzer_with(runtime.clone(), config);

        let err = analyzer.analyze_text("s1", "feeling fine").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Runtime(RuntimeError::Unavailable(_))
        ));
        assert_eq!(runtime.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn model_timeout_maps_to_unavailable() {
        let runtime = Arc::new(HangingRuntime {
            attempts: AtomicU32::new(0),
        });
        let config = AnalysisConfig {
            model_timeout: Duration::from_millis(50),
            model_retries: 1,
            ..AnalysisConfig::default()
        };
        let (analyzer, _) = analyzer_with(runtime.clone(), config);

        let err = analyzer.analyze_text("s1", "still waiting").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Runtime(RuntimeError::Unavailable(_))
        ));
        assert_eq!(runtime.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn audio_analysis_joins_transcript_and_features() {
        let runtime = Arc::new(ScriptedRuntime {
            segments: vec![segment(0, 1_900, "feeling very sad and hopeless today")],
            weights: BTreeMap::from([(Emotion::Sadness, 0.7), (Emotion::Neutral, 0.3)]),
        });
        let (analyzer, _) = analyzer_with(runtime, AnalysisConfig::default());

        let result = analyzer
            .analyze_audio("s1", speech_waveform())
            .await
            .expect("result");

        assert_eq!(result.modality, InputModality::Audio);
        assert_eq!(
            result.emotion_score.expect("score").dominant(),
            Emotion::Sadness
        );
        let features = result.features.expect("features");
        assert!((features.speaking_rate - 3.0).abs() < 1e-6);
        assert_eq!(result.transcript.expect("transcript").len(), 1);
        assert!(result.stress.value > 0.0);
    }

    #[tokio::test]
    async fn silent_audio_yields_result_without_emotion() {
        let runtime = Arc::new(ScriptedRuntime {
            segments: vec![],
            weights: BTreeMap::new(),
        });
        let (analyzer, _) = analyzer_with(runtime, AnalysisConfig::default());

        let result = analyzer
            .analyze_audio("s1", Waveform::new(vec![0.0; 16_000], 16_000))
            .await
            .expect("result");

        assert!(result.emotion_score.is_none());
        assert!(result.transcript.is_none());
        let features = result.features.expect("features");
        assert_eq!(features.pause_ratio, 1.0);
        assert_eq!(result.stress.level, StressLevel::Low);
    }

    #[tokio::test]
    async fn short_audio_is_rejected_despite_working_models() {
        let runtime = Arc::new(ScriptedRuntime {
            segments: vec![segment(0, 100, "hi")],
            weights: BTreeMap::from([(Emotion::Neutral, 1.0)]),
        });
        let (analyzer, _) = analyzer_with(runtime, AnalysisConfig::default());

        let err = analyzer
            .analyze_audio("s1", Waveform::new(vec![0.1; 1_600], 16_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Acoustic(AcousticError::InsufficientAudio { .. })
        ));
    }

    #[tokio::test]
    async fn multi_result_report_carries_a_summary() {
        let (analyzer, _) = analyzer_with(
            Arc::new(LexiconRuntime::new()),
            AnalysisConfig::default(),
        );
        analyzer
            .analyze_text("s1", "what a wonderful happy morning")
            .await
            .expect("first");
        analyzer
            .analyze_text("s1", "now everything feels sad and hopeless")
            .await
            .expect("second");

        let report = analyzer.report("s1").await.expect("report");
        assert_eq!(report.session_id, "s1");
        assert!(report.emotion_score.is_some());
        let summary = report.pattern_summary.expect("summary");
        assert_eq!(summary.trajectory.len(), 2);

        let single = analyzer.report("s2").await;
        assert!(matches!(
            single,
            Err(PipelineError::Report(ReportError::IncompleteData))
        ));
    }

    #[tokio::test]
    async fn single_result_report_has_no_summary() {
        let (analyzer, _) = analyzer_with(
            Arc::new(LexiconRuntime::new()),
            AnalysisConfig::default(),
        );
        analyzer
            .analyze_text("s1", "a perfectly ordinary sentence")
            .await
            .expect("result");
        let report = analyzer.report("s1").await.expect("report");
        assert!(report.pattern_summary.is_none());
    }

    #[tokio::test]
    async fn summarizing_an_empty_session_fails() {
        let (analyzer, _) = analyzer_with(
            Arc::new(LexiconRuntime::new()),
            AnalysisConfig::default(),
        );
        let err = analyzer.summarize("nobody").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Aggregate(AggregateError::EmptySession)
        ));
    }
}
