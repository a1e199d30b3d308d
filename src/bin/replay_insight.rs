//! replay_insight CLI
//!
//! Analyze a JSON replay export and print the match summary as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use replay_insight::clips;
use replay_insight::summary::failure_json;
use replay_insight::{analyze, AnalysisError, AnalyzerConfig, JsonReplay};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "replay_insight")]
#[command(about = "Aggregate replay events into a match summary and flag anomalies", long_about = None)]
struct Cli {
    /// Replay export (single JSON document or JSON lines)
    replay: PathBuf,

    /// Analyzer config JSON file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pretty-print the output
    #[arg(long, default_value = "false")]
    pretty: bool,

    /// Also select up to N review clips and add them as "reviewClips"
    #[arg(long)]
    clips: Option<usize>,

    /// Clip sensitivity, 1 (strict) to 5 (lenient)
    #[arg(long, default_value = "3")]
    sensitivity: u8,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("replay_insight=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalyzerConfig> {
    let Some(path) = path else {
        return Ok(AnalyzerConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    Ok(AnalyzerConfig::from_json(&text)?)
}

fn run(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_ref())?;
    let mut replay = JsonReplay::open(&cli.replay)?;
    let summary = analyze(&mut replay, config.clone())?;

    let Some(max_clips) = cli.clips else {
        return Ok(summary.to_json(cli.pretty)?);
    };

    let selected = clips::select_for_review(&summary.suspicious_moments, cli.sensitivity, max_clips, &config);
    tracing::info!(clips = selected.len(), sensitivity = cli.sensitivity, "review clips selected");

    let mut value = serde_json::to_value(&summary)?;
    if let Some(object) = value.as_object_mut() {
        object.insert("reviewClips".to_string(), serde_json::to_value(&selected)?);
    }
    let json = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(json)
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    match run(&cli) {
        Ok(json) => println!("{}", json),
        Err(err) => {
            tracing::error!("{:#}", err);
            let failure = match err.downcast_ref::<AnalysisError>() {
                Some(analysis) => failure_json(analysis),
                None => serde_json::json!({ "success": false, "error": format!("{:#}", err) }).to_string(),
            };
            println!("{}", failure);
            std::process::exit(1);
        }
    }
}
