use serde::{Deserialize, Serialize};
use std::{ops::RangeInclusive, time::Duration};

pub const DEFAULT_SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8_000..=48_000;
pub const DEFAULT_MIN_AUDIO_MS: u64 = 500;
pub const DEFAULT_FRAME_MS: u64 = 25;
pub const DEFAULT_HOP_MS: u64 = 10;
pub const DEFAULT_SILENCE_THRESHOLD: f32 = 0.01;
pub const DEFAULT_TRAJECTORY_WINDOW: usize = 3;
pub const DEFAULT_ANOMALY_THRESHOLD: f32 = 0.25;
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MODEL_RETRIES: u32 = 1;

pub const ENV_SESSION_ID: &str = "SPEECHMIND_SESSION_ID";
pub const ENV_LOG_LEVEL: &str = "SPEECHMIND_LOG";

/// Framing parameters for short-time acoustic analysis.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameConfig {
    pub size: Duration,
    pub hop: Duration,
}

impl FrameConfig {
    pub fn new(size: Duration, hop: Duration) -> Result<Self, ConfigError> {
        if hop.is_zero() {
            return Err(ConfigError::ZeroHop);
        }
        if size < hop {
            return Err(ConfigError::FrameShorterThanHop);
        }
        Ok(Self { size, hop })
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            size: Duration::from_millis(DEFAULT_FRAME_MS),
            hop: Duration::from_millis(DEFAULT_HOP_MS),
        }
    }
}

/// Weights for combining emotion and acoustic evidence into a stress value.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct StressWeights {
    pub emotion: f32,
    pub pitch: f32,
    pub rate: f32,
    pub pause: f32,
}

impl StressWeights {
    pub fn new(emotion: f32, pitch: f32, rate: f32, pause: f32) -> Result<Self, ConfigError> {
        if [emotion, pitch, rate, pause].iter().any(|v| *v < 0.0) {
            return Err(ConfigError::NegativeWeight);
        }
        if emotion + pitch + rate + pause <= 0.0 {
            return Err(ConfigError::ZeroWeightMass);
        }
        Ok(Self {
            emotion,
            pitch,
            rate,
            pause,
        })
    }
}

impl Default for StressWeights {
    fn default() -> Self {
        Self {
            emotion: 0.6,
            pitch: 0.15,
            rate: 0.15,
            pause: 0.1,
        }
    }
}

/// Cut points between the categorical stress levels. A value equal to a
/// threshold belongs to the level above it.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct LevelThresholds {
    pub moderate: f32,
    pub high: f32,
}

impl LevelThresholds {
    pub fn new(moderate: f32, high: f32) -> Result<Self, ConfigError> {
        if !(0.0 < moderate && moderate < high && high <= 1.0) {
            return Err(ConfigError::UnorderedThresholds);
        }
        Ok(Self { moderate, high })
    }
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.33,
            high: 0.66,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StressConfig {
    pub weights: StressWeights,
    pub thresholds: LevelThresholds,
}

/// Full configuration surface of the analysis pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    pub sample_rate_range: RangeInclusive<u32>,
    pub min_audio_duration: Duration,
    pub frame: FrameConfig,
    pub silence_threshold: f32,
    pub stress: StressConfig,
    pub trajectory_window: usize,
    pub anomaly_threshold: f32,
    pub model_timeout: Duration,
    pub model_retries: u32,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate_range.is_empty() {
            return Err(ConfigError::EmptySampleRateRange);
        }
        if self.trajectory_window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.anomaly_threshold < 0.0 {
            return Err(ConfigError::NegativeAnomalyThreshold);
        }
        if self.model_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        FrameConfig::new(self.frame.size, self.frame.hop)?;
        StressWeights::new(
            self.stress.weights.emotion,
            self.stress.weights.pitch,
            self.stress.weights.rate,
            self.stress.weights.pause,
        )?;
        LevelThresholds::new(self.stress.thresholds.moderate, self.stress.thresholds.high)?;
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate_range: DEFAULT_SAMPLE_RATE_RANGE,
            min_audio_duration: Duration::from_millis(DEFAULT_MIN_AUDIO_MS),
            frame: FrameConfig::default(),
            silence_threshold: DEFAULT_SILENCE_THRESHOLD,
            stress: StressConfig::default(),
            trajectory_window: DEFAULT_TRAJECTORY_WINDOW,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            model_retries: DEFAULT_MODEL_RETRIES,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("frame hop must be > 0")]
    ZeroHop,
    #[error("frame size must be >= hop")]
    FrameShorterThanHop,
    #[error("stress weights must be non-negative")]
    NegativeWeight,
    #[error("stress weights must not all be zero")]
    ZeroWeightMass,
    #[error("level thresholds must satisfy 0 < moderate < high <= 1")]
    UnorderedThresholds,
    #[error("sample rate range must not be empty")]
    EmptySampleRateRange,
    #[error("trajectory window must be >= 1")]
    ZeroWindow,
    #[error("anomaly threshold must be >= 0")]
    NegativeAnomalyThreshold,
    #[error("model timeout must be > 0")]
    ZeroTimeout,
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AnalysisConfig::default().validate().expect("valid");
    }

    #[test]
    fn negative_weight_rejected() {
        assert_eq!(
            StressWeights::new(-0.1, 0.2, 0.2, 0.2),
            Err(ConfigError::NegativeWeight)
        );
    }

    #[test]
    fn all_zero_weights_rejected() {
        assert_eq!(
            StressWeights::new(0.0, 0.0, 0.0, 0.0),
            Err(ConfigError::ZeroWeightMass)
        );
    }

    #[test]
    fn thresholds_must_be_ordered() {
        assert_eq!(
            LevelThresholds::new(0.7, 0.3),
            Err(ConfigError::UnorderedThresholds)
        );
        LevelThresholds::new(0.33, 0.66).expect("valid");
    }

    #[test]
    fn hop_larger_than_frame_rejected() {
        assert_eq!(
            FrameConfig::new(Duration::from_millis(10), Duration::from_millis(25)),
            Err(ConfigError::FrameShorterThanHop)
        );
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = AnalysisConfig {
            trajectory_window: 0,
            ..AnalysisConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroWindow));
    }

    #[test]
    fn cli_value_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_LOG_LEVEL, "debug");
        let v = resolve_string_with_default(Some("trace".to_owned()), ENV_LOG_LEVEL, &env, "info");
        assert_eq!(v, "trace");
    }

    #[test]
    fn env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_LOG_LEVEL, "debug");
        let v = resolve_string_with_default(None, ENV_LOG_LEVEL, &env, "info");
        assert_eq!(v, "debug");
    }

    #[test]
    fn default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_LOG_LEVEL, &env, "info");
        assert_eq!(v, "info");
    }
}
