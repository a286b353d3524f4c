use crate::emotion::Emotion;
use crate::session::AnalysisResult;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    #[error("cannot aggregate an empty session")]
    EmptySession,
}

/// Session-level view over an ordered result sequence. Order-sensitive:
/// callers must pass results in insertion order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PatternSummary {
    /// Modal per-result dominant emotion; ties break toward the most recent
    /// occurrence.
    pub dominant_emotion: Emotion,
    /// Simple moving average of the stress values, one entry per result.
    pub trajectory: Vec<f32>,
    /// Indices of results whose stress deviates from the trailing average by
    /// more than the anomaly threshold.
    pub anomalies: Vec<usize>,
}

pub fn summarize(
    results: &[AnalysisResult],
    window: usize,
    anomaly_threshold: f32,
) -> Result<PatternSummary, AggregateError> {
    if results.is_empty() {
        return Err(AggregateError::EmptySession);
    }
    let window = window.max(1);
    let values: Vec<f32> = results.iter().map(|r| r.stress.value).collect();

    Ok(PatternSummary {
        dominant_emotion: dominant_emotion(results),
        trajectory: trajectory(&values, window),
        anomalies: anomalies(&values, window, anomaly_threshold),
    })
}

fn dominant_emotion(results: &[AnalysisResult]) -> Emotion {
    let mut tally: Vec<(Emotion, usize, usize)> = Vec::new();
    for (index, result) in results.iter().enumerate() {
        let Some(score) = &result.emotion_score else {
            continue;
        };
        let label = score.dominant();
        match tally.iter_mut().find(|(e, _, _)| *e == label) {
            Some(entry) => {
                entry.1 += 1;
                entry.2 = index;
            }
            None => tally.push((label, 1, index)),
        }
    }
    tally
        .into_iter()
        .max_by_key(|(_, count, last_seen)| (*count, *last_seen))
        .map(|(label, _, _)| label)
        .unwrap_or(Emotion::Neutral)
}

/// Trailing mean ending at each index, over at most `window` values.
fn trajectory(values: &[f32], window: usize) -> Vec<f32> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<f32>() / slice.len() as f32
        })
        .collect()
}

/// An anomaly is a strict deviation from the average of the preceding
/// window; equality at the threshold does not flag, and the first result has
/// no trailing context to deviate from.
fn anomalies(values: &[f32], window: usize, threshold: f32) -> Vec<usize> {
    (1..values.len())
        .filter(|&i| {
            let start = i.saturating_sub(window);
            let trailing = &values[start..i];
            let mean = trailing.iter().sum::<f32>() / trailing.len() as f32;
            (values[i] - mean).abs() > threshold
        })
        .collect()
}
