use crate::aggregate::PatternSummary;
use crate::emotion::{Emotion, EmotionScore};
use crate::session::{InputModality, Session};
use crate::stress::StressIndicator;
use crate::transcribe;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

pub const DISCLAIMER: &str = "This report offers general insights, not a medical diagnosis. \
     If you're struggling or need support, please consult a qualified mental health professional.";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("nothing to report: no emotion score or transcript available")]
    IncompleteData,
}

/// One row of the per-label breakdown shown to the user, carrying the
/// screening hint the label maps to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EmotionBreakdown {
    pub emotion: Emotion,
    pub probability: f32,
    pub indication: Option<String>,
}

/// Immutable, exportable snapshot of an analysis. `emotion_score` is the raw
/// label-to-probability mapping; `emotion_breakdown` repeats it row by row
/// with screening hints attached. Regenerating a report for the same inputs
/// yields identical content apart from `generated_at`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub session_id: String,
    pub session_started_at: SystemTime,
    pub generated_at: SystemTime,
    pub input_modality: InputModality,
    pub emotion_score: Option<EmotionScore>,
    pub emotion_breakdown: Vec<EmotionBreakdown>,
    pub stress_indicator: StressIndicator,
    pub transcript: Option<String>,
    pub pattern_summary: Option<PatternSummary>,
    pub disclaimer: String,
}

/// Assembles a report from the most recent result carrying an emotion score
/// or a transcript, attaching the session summary when one is supplied.
/// Fails when no result in the session has anything to report.
pub fn generate(session: &Session, summary: Option<PatternSummary>) -> Result<Report, ReportError> {
    let reported = session
        .results()
        .iter()
        .rev()
        .find(|r| r.emotion_score.is_some() || r.transcript.is_some())
        .ok_or(ReportError::IncompleteData)?;

    let emotion_breakdown = reported
        .emotion_score
        .as_ref()
        .map(|score| {
            score
                .iter()
                .map(|(emotion, probability)| EmotionBreakdown {
                    emotion,
                    probability,
                    indication: emotion.indication().map(str::to_owned),
                })
                .collect()
        })
        .unwrap_or_default();

    let transcript = reported
        .transcript
        .as_deref()
        .map(transcribe::joined_text)
        .filter(|t| !t.is_empty());

    Ok(Report {
        session_id: session.id().to_owned(),
        session_started_at: session.started_at(),
        generated_at: SystemTime::now(),
        input_modality: reported.modality,
        emotion_score: reported.emotion_score.clone(),
        emotion_breakdown,
        stress_indicator: reported.stress,
        transcript,
        pattern_summary: summary,
        disclaimer: DISCLAIMER.to_owned(),
    })
}
