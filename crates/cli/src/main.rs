#![deny(warnings)]

use anyhow::Context;
use clap::{ArgGroup, Parser};
use speechmind_core::audio::Waveform;
use speechmind_core::config::{
    resolve_string_with_default, AnalysisConfig, StdEnv, DEFAULT_ANOMALY_THRESHOLD,
    DEFAULT_MODEL_RETRIES, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_TRAJECTORY_WINDOW, ENV_LOG_LEVEL,
    ENV_SESSION_ID,
};
use speechmind_core::pipeline::Analyzer;
use speechmind_core::runtime::LexiconRuntime;
use speechmind_core::session::MemorySessionStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "speechmind")]
#[command(about = "Multimodal emotion and stress analysis for text and speech")]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(false)
        .args(["text", "text_file", "audio"])
))]
struct Args {
    /// Analyze a text snippet given on the command line
    #[arg(long)]
    text: Option<String>,

    /// Analyze the contents of a UTF-8 text file
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Analyze a WAV file
    #[arg(long)]
    audio: Option<PathBuf>,

    #[arg(long, env = ENV_SESSION_ID, default_value = "default")]
    session: String,

    #[arg(long, default_value_t = DEFAULT_TRAJECTORY_WINDOW)]
    trajectory_window: usize,

    #[arg(long, default_value_t = DEFAULT_ANOMALY_THRESHOLD)]
    anomaly_threshold: f32,

    #[arg(long, default_value_t = DEFAULT_MODEL_TIMEOUT_SECS)]
    model_timeout_secs: u64,

    #[arg(long, default_value_t = DEFAULT_MODEL_RETRIES)]
    model_retries: u32,

    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let env = StdEnv;
    let level = resolve_string_with_default(args.log_level.clone(), ENV_LOG_LEVEL, &env, "info");
    init_tracing(&level)?;

    let config = build_config(&args);
    config.validate().context("invalid configuration")?;

    tracing::info!(
        session = %args.session,
        timeout_secs = args.model_timeout_secs,
        "config loaded"
    );

    let analyzer = Analyzer::new(
        Arc::new(LexiconRuntime::new()),
        Arc::new(MemorySessionStore::new()),
        config,
    );

    if let Some(text) = &args.text {
        analyzer.analyze_text(&args.session, text).await?;
    } else if let Some(path) = &args.text_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        analyzer.analyze_text(&args.session, &text).await?;
    } else if let Some(path) = &args.audio {
        let waveform = read_waveform(path)?;
        analyzer.analyze_audio(&args.session, waveform).await?;
    }

    let report = analyzer.report(&args.session).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn init_tracing(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("invalid --log-level: {level}"))?,
        )
        .from_env_lossy();

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

fn build_config(args: &Args) -> AnalysisConfig {
    AnalysisConfig {
        trajectory_window: args.trajectory_window,
        anomaly_threshold: args.anomaly_threshold,
        model_timeout: Duration::from_secs(args.model_timeout_secs),
        model_retries: args.model_retries,
        ..AnalysisConfig::default()
    }
}

fn read_waveform(path: &Path) -> anyhow::Result<Waveform> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening wav file {}", path.display()))?;
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .context("decoding f32 samples")?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .context("decoding integer samples")?
        }
    };
    Ok(Waveform::new(
        downmix(&samples, spec.channels),
        spec.sample_rate,
    ))
}

fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks(usize::from(channels))
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect()
}
