use crate::audio::AcousticFeatureVector;
use crate::emotion::EmotionScore;
use crate::stress::StressIndicator;
use crate::transcribe::TranscriptSegment;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::SystemTime;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputModality {
    Text,
    Audio,
}

/// Outcome of analyzing one input unit. `emotion_score` is absent only when
/// an audio input transcribed to nothing (all silence).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub modality: InputModality,
    pub emotion_score: Option<EmotionScore>,
    pub stress: StressIndicator,
    pub transcript: Option<Vec<TranscriptSegment>>,
    pub features: Option<AcousticFeatureVector>,
    pub analyzed_at: SystemTime,
}

/// Append-only log of analysis results. Past results are never edited;
/// aggregation is order-sensitive, so insertion order is the ground truth.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Session {
    id: String,
    started_at: SystemTime,
    results: Vec<AnalysisResult>,
}

impl Session {
    pub fn new(id: String) -> Self {
        Self {
            id,
            started_at: SystemTime::now(),
            results: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> SystemTime {
        self.started_at
    }

    pub fn append(&mut self, result: AnalysisResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for session history. The core depends only on these
/// two operations; storage technology is a collaborator concern.
pub trait SessionStore: Send + Sync {
    fn append(
        &self,
        session_id: String,
        result: AnalysisResult,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    fn load(&self, session_id: String) -> BoxFuture<'_, Result<Option<Session>, StoreError>>;
}

/// In-memory store. The mutex serializes appends, which is what preserves
/// per-session result ordering under concurrent callers.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: tokio::sync::Mutex<BTreeMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn append(
        &self,
        session_id: String,
        result: AnalysisResult,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            let mut sessions = self.sessions.lock().await;
            sessions
                .entry(session_id)
                .or_insert_with_key(|id| Session::new(id.clone()))
                .append(result);
            Ok(())
        }
        .boxed()
    }

    fn load(&self, session_id: String) -> BoxFuture<'_, Result<Option<Session>, StoreError>> {
        async move {
            let sessions = self.sessions.lock().await;
            Ok(sessions.get(&session_id).cloned())
        }
        .boxed()
    }
}
