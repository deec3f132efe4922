use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use seasonal_core::{KnowledgeBase, LazyDetector, Season, SeasonAnalyzer};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::Config;

#[derive(Parser)]
#[command(name = "seasonal", about = "Find your color season from a photo")]
struct Cli {
    /// Directory containing det_10g.onnx (overrides SEASONAL_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
    /// Knowledge base TOML file (overrides SEASONAL_KNOWLEDGE_PATH)
    #[arg(long, global = true)]
    knowledge: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a frontal photo (JPEG or PNG)
    Analyze {
        photo: PathBuf,
        /// Occasion to show an outfit for (default: the first listed)
        #[arg(short, long)]
        occasion: Option<String>,
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// List the seasons the classifier can produce
    Seasons,
    /// Validate the knowledge base and exit
    Check,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }
    if let Some(path) = cli.knowledge {
        config.knowledge_path = Some(path);
    }

    let knowledge = load_knowledge(&config)?;

    match cli.command {
        Commands::Check => {
            println!("knowledge base OK: {} seasons covered", Season::ALL.len());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Seasons => {
            for season in Season::ALL {
                let status = if knowledge.get(season.name()).is_some() { "ok" } else { "missing" };
                println!("{season:<14} {status}");
            }
            let extra: Vec<&str> = knowledge
                .names()
                .filter(|name| name.parse::<Season>().is_err())
                .collect();
            if !extra.is_empty() {
                println!("not produced by the classifier: {}", extra.join(", "));
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Analyze { photo, occasion, json } => {
            analyze(&config, &knowledge, &photo, occasion.as_deref(), json)
        }
    }
}

/// Load the knowledge base and refuse to continue unless it covers every season.
fn load_knowledge(config: &Config) -> Result<KnowledgeBase> {
    let knowledge = match &config.knowledge_path {
        Some(path) => KnowledgeBase::from_path(path)?,
        None => KnowledgeBase::embedded()?,
    };
    knowledge
        .validate_covers(&Season::ALL)
        .context("knowledge base does not cover every season")?;
    Ok(knowledge)
}

fn analyze(
    config: &Config,
    knowledge: &KnowledgeBase,
    photo: &std::path::Path,
    occasion: Option<&str>,
    json: bool,
) -> Result<ExitCode> {
    if !seasonal_core::loader::has_supported_extension(photo) {
        eprintln!(
            "Unsupported file type. Accepted: {}",
            seasonal_core::loader::supported_extensions().join(", ")
        );
        return Ok(ExitCode::FAILURE);
    }
    let bytes = std::fs::read(photo).with_context(|| format!("reading {}", photo.display()))?;

    let model_path = config.detector_model_path();
    tracing::debug!(path = %model_path.display(), "using detection model");
    let detector = LazyDetector::new(model_path, config.pipeline.detector.clone());
    let analyzer = SeasonAnalyzer::new(Arc::new(detector), config.pipeline.clone());

    let outcome = analyzer.analyze(&bytes).and_then(|report| {
        let entry = knowledge.lookup(report.season)?;
        Ok((report, entry))
    });

    let (report, entry) = match outcome {
        Ok(found) => found,
        Err(err) => {
            if err.is_user_correctable() {
                tracing::warn!(error = %err, "analysis rejected photo");
            } else {
                tracing::error!(error = %err, "analysis failed");
            }
            eprintln!("{}", err.user_message());
            return Ok(ExitCode::FAILURE);
        }
    };

    let chosen = entry.occasion(occasion);
    if let (Some(name), None) = (occasion, chosen) {
        eprintln!("Unknown occasion {name:?}; showing the default");
    }
    let chosen = chosen.or_else(|| entry.occasion(None));

    if json {
        println!("{}", serde_json::to_string_pretty(&render::json(&report, entry, chosen))?);
    } else {
        print!("{}", render::text(&report, entry, chosen));
    }
    Ok(ExitCode::SUCCESS)
}
