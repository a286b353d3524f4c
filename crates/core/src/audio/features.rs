use super::{AcousticError, AcousticFeatureVector, Waveform};
use crate::config::AnalysisConfig;

const PITCH_MIN_HZ: u32 = 50;
const PITCH_MAX_HZ: u32 = 500;

/// Minimum normalized autocorrelation peak, relative to frame power, for a
/// frame to count as voiced.
const PERIODICITY_FLOOR: f32 = 0.3;

/// Frames the waveform, computes short-time energy and a fundamental
/// frequency estimate per frame, and aggregates them into per-segment
/// statistics. Deterministic for a fixed waveform and configuration.
pub fn extract(
    waveform: &Waveform,
    config: &AnalysisConfig,
) -> Result<AcousticFeatureVector, AcousticError> {
    let rate = waveform.sample_rate;
    if !config.sample_rate_range.contains(&rate) {
        return Err(AcousticError::UnsupportedSampleRate {
            rate,
            min: *config.sample_rate_range.start(),
            max: *config.sample_rate_range.end(),
        });
    }
    if waveform.duration() < config.min_audio_duration {
        return Err(AcousticError::InsufficientAudio {
            min_ms: config.min_audio_duration.as_millis() as u64,
        });
    }

    let frame_len = ((config.frame.size.as_secs_f64() * f64::from(rate)) as usize).max(1);
    let hop_len = ((config.frame.hop.as_secs_f64() * f64::from(rate)) as usize).max(1);

    let mut energies = Vec::new();
    let mut pitches = Vec::new();
    let mut silent_frames = 0usize;

    let mut start = 0usize;
    while start + frame_len <= waveform.samples.len() {
        let frame = &waveform.samples[start..start + frame_len];
        let rms = frame_rms(frame);
        energies.push(rms);
        if rms <= config.silence_threshold {
            silent_frames += 1;
        } else if let Some(pitch) = estimate_pitch(frame, rate) {
            pitches.push(pitch);
        }
        start += hop_len;
    }

    if energies.is_empty() {
        return Err(AcousticError::InsufficientAudio {
            min_ms: config.frame.size.as_millis() as u64,
        });
    }

    let energy_mean = mean(&energies);
    let pitch_mean = mean(&pitches);
    let pitch_var = variance(&pitches, pitch_mean);
    let pause_ratio = silent_frames as f32 / energies.len() as f32;

    Ok(AcousticFeatureVector {
        pitch_mean,
        pitch_var,
        energy_mean,
        speaking_rate: 0.0,
        pause_ratio,
    })
}

fn frame_rms(frame: &[f32]) -> f32 {
    let power: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    power.sqrt()
}

/// Autocorrelation pitch estimate over the 50-500 Hz band. Returns `None`
/// for frames without a clear periodic peak.
fn estimate_pitch(frame: &[f32], sample_rate: u32) -> Option<f32> {
    let min_lag = (sample_rate / PITCH_MAX_HZ) as usize;
    let max_lag = ((sample_rate / PITCH_MIN_HZ) as usize).min(frame.len().saturating_sub(1));
    if min_lag == 0 || min_lag >= max_lag {
        return None;
    }

    let power = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    if power <= f32::EPSILON {
        return None;
    }

    let mut best_lag = 0usize;
    let mut best = 0.0f32;
    for lag in min_lag..=max_lag {
        let mut acc = 0.0f32;
        for i in 0..frame.len() - lag {
            acc += frame[i] * frame[i + lag];
        }
        let normalized = acc / (frame.len() - lag) as f32;
        if normalized > best {
            best = normalized;
            best_lag = lag;
        }
    }

    if best_lag == 0 || best < PERIODICITY_FLOOR * power {
        return None;
    }
    Some(sample_rate as f32 / best_lag as f32)
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn variance(values: &[f32], mean: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32
}
