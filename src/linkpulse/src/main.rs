//! LinkPulse: engagement hotness scoring for tracked-link customers.
//!
//! Loads customer event histories, recomputes their hotness summaries in
//! parallel, and prints the results as JSON.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use linkpulse_core::config::AppConfig;
use linkpulse_core::types::{CustomerHistory, RawCustomerHistory};
use linkpulse_scoring::{BatchRecomputer, CustomerScore, HotnessEngine};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "linkpulse")]
#[command(about = "Engagement hotness scoring for tracked-link customers")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, global = true, env = "LINKPULSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score every customer history in a JSON file
    Score {
        /// JSON array of `{customer_id, clicks, events}` records
        #[arg(long)]
        input: PathBuf,

        /// Score as of this RFC 3339 instant instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,

        /// Maximum customers scored concurrently (overrides config)
        #[arg(long, env = "LINKPULSE__BATCH__MAX_CONCURRENCY")]
        concurrency: Option<usize>,

        /// Emit only `{customer_id, score}` pairs
        #[arg(long, default_value_t = false)]
        simple: bool,

        /// Drop customers with malformed events instead of failing the run
        #[arg(long, default_value_t = false)]
        skip_invalid: bool,
    },
    /// Print the effective scoring configuration
    Defaults,
}

#[derive(Serialize)]
struct SimpleScore<'a> {
    customer_id: &'a str,
    score: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries results only.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linkpulse=info,linkpulse_scoring=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Command::Defaults => {
            println!("{}", serde_json::to_string_pretty(&config.scoring)?);
        }
        Command::Score {
            input,
            now,
            concurrency,
            simple,
            skip_invalid,
        } => {
            if let Some(concurrency) = concurrency {
                config.batch.max_concurrency = concurrency;
            }
            let now = now.unwrap_or_else(Utc::now);

            let engine = Arc::new(HotnessEngine::new(config.scoring.clone())?);
            let histories = load_histories(&input, skip_invalid)?;

            info!(
                customers = histories.len(),
                concurrency = config.batch.max_concurrency,
                as_of = %now,
                "Scoring customers"
            );

            let recomputer = BatchRecomputer::new(engine, config.batch.max_concurrency);
            let scores = recomputer.recompute(histories, now).await;

            print_scores(&scores, simple)?;
        }
    }

    Ok(())
}

fn load_histories(path: &Path, skip_invalid: bool) -> anyhow::Result<Vec<CustomerHistory>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<RawCustomerHistory> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut histories = Vec::with_capacity(records.len());
    for record in &records {
        match record.validate() {
            Ok(history) => histories.push(history),
            Err(e) if skip_invalid => {
                warn!(customer_id = %record.customer_id, error = %e, "Skipping customer");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(histories)
}

fn print_scores(scores: &[CustomerScore], simple: bool) -> anyhow::Result<()> {
    let out = if simple {
        let pairs: Vec<_> = scores
            .iter()
            .map(|s| SimpleScore {
                customer_id: &s.customer_id,
                score: s.summary.score,
            })
            .collect();
        serde_json::to_string_pretty(&pairs)?
    } else {
        serde_json::to_string_pretty(scores)?
    };
    println!("{out}");
    Ok(())
}
