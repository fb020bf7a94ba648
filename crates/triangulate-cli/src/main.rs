//! `triangulate`: arbitrate multi-model race summaries from the command line
//!
//! Results are written to stdout as JSON; logs go to stderr.

mod input;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use triangulation::config::ArbitrationConfig;
use triangulation::ensemble::{ArbitrationEngine, RaceCoordinator, TextSimilarityScorer};
use triangulation::summary::Summary;

use input::{read_json, RaceBundle};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file (TRIANGULATION_* env vars still apply on top)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit compact instead of pretty-printed JSON
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Arbitrate one topic from a JSON array of summaries
    Arbitrate {
        /// Input file, or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Arbitrate every topic of a race bundle
    Race {
        /// Bundle file `{race_id, topics: [{topic, summaries}]}`, or `-` for stdin
        #[arg(long, short)]
        input: PathBuf,
    },

    /// Show how similar two texts are
    Similarity { first: String, second: String },
}

fn load_config(path: Option<&PathBuf>) -> Result<ArbitrationConfig> {
    let base = match path {
        Some(path) => ArbitrationConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ArbitrationConfig::default(),
    };
    base.with_env_overrides()
        .context("Invalid TRIANGULATION_* environment override")
}

fn emit<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let rendered = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match &args.command {
        Command::Arbitrate { input } => {
            let config = load_config(args.config.as_ref())?;
            let summaries: Vec<Summary> = read_json(input)?;
            info!(summaries = summaries.len(), "Arbitrating topic");

            let engine = ArbitrationEngine::new(config.shared());
            emit(&engine.arbitrate(&summaries), args.compact)?;
        }
        Command::Race { input } => {
            let config = load_config(args.config.as_ref())?;
            let bundle: RaceBundle = read_json(input)?;
            info!(
                race_id = %bundle.race_id,
                topics = bundle.topics.len(),
                "Arbitrating race bundle"
            );

            let engine = ArbitrationEngine::new(config.shared()).shared();
            let coordinator = RaceCoordinator::offline(engine);
            let race = coordinator
                .arbitrate_topics(&bundle.race_id, bundle.topics)
                .await;

            info!(
                run_id = %race.run_id,
                consensus_rate = race.consensus_rate(),
                low_confidence = race.low_confidence_topics().len(),
                "Race arbitration complete"
            );
            emit(&race, args.compact)?;
        }
        Command::Similarity { first, second } => {
            let breakdown = TextSimilarityScorer::new().breakdown(first, second);
            emit(&breakdown, args.compact)?;
        }
    }

    Ok(())
}
