use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wn8_tracker::config::TrackerConfig;
use wn8_tracker::expected::ExpectedValuesCache;
use wn8_tracker::models::{AccountId, ExpectedValues};
use wn8_tracker::registry::{load_registry, resolve_names, save_registry, RegistryFile};
use wn8_tracker::score::{Scorer, StatKind};
use wn8_tracker::source::WargamingApi;

#[derive(Parser)]
#[command(name = "wn8-tracker")]
#[command(about = "World of Tanks WN8 tracker backed by the Wargaming API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score accounts from registries and/or explicit ids
    Score {
        /// Registry CSV files providing account ids
        #[arg(long)]
        registry: Vec<PathBuf>,

        /// Additional account ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,

        /// Stat to compute: "wn8" or "wr"
        #[arg(long, default_value = "wn8")]
        stat: String,

        /// Output a JSON object instead of CSV lines
        #[arg(long)]
        json: bool,
    },

    /// Force-refresh the cached expected-values dataset
    RefreshExpected,

    /// Resolve player names to account ids into a registry CSV
    Identify {
        /// File with one player name per line
        #[arg(long)]
        names: PathBuf,

        /// Registry CSV to create or update
        #[arg(long)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting wn8-tracker v{}", env!("CARGO_PKG_VERSION"));

    let config = TrackerConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {:?}", cli.config))?;

    match cli.command {
        Commands::Score {
            registry,
            ids,
            stat,
            json,
        } => {
            let stat = match stat.as_str() {
                "wn8" => StatKind::Wn8,
                "wr" => StatKind::WinRatio,
                other => bail!("Unknown stat: {}. Use 'wn8' or 'wr'.", other),
            };

            let mut account_ids: Vec<AccountId> = Vec::new();
            for path in &registry {
                let file = load_registry(path)
                    .with_context(|| format!("loading registry {:?}", path))?;
                account_ids.extend(file.account_ids());
            }
            account_ids.extend(ids.into_iter().map(AccountId::new));
            account_ids.sort();
            account_ids.dedup();

            if account_ids.is_empty() {
                bail!("No account ids given. Use --registry and/or --ids.");
            }

            // The win-ratio stat does not consult the reference table; skip
            // loading it so first runs stay offline.
            let expected_values = match stat {
                StatKind::Wn8 => {
                    let cache = ExpectedValuesCache::new(
                        config.data.expected_values_path(),
                        Duration::from_secs(config.api.timeout_seconds),
                    )?;
                    cache.load().await.context("loading expected values")?
                }
                StatKind::WinRatio => ExpectedValues::new(),
            };

            let api = WargamingApi::new(config.api.clone())?;
            let scorer = Scorer::new(api, expected_values, config.api.batch_size);

            let outcome = scorer.run(&account_ids, stat).await;

            if !outcome.errors.is_empty() {
                eprintln!(
                    "{} batch(es) failed; {} of {} accounts scored",
                    outcome.errors.len(),
                    outcome.scores.len(),
                    account_ids.len()
                );
            }

            let ordered: BTreeMap<u64, f64> = outcome
                .scores
                .iter()
                .map(|(id, score)| (id.value(), *score))
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&ordered)?);
            } else {
                for (id, score) in ordered {
                    println!("{},{}", id, score);
                }
            }
        }

        Commands::RefreshExpected => {
            let cache = ExpectedValuesCache::new(
                config.data.expected_values_path(),
                Duration::from_secs(config.api.timeout_seconds),
            )?;
            let values = cache.refresh().await.context("refreshing expected values")?;
            println!(
                "Cached {} vehicle entries to {:?}",
                values.len(),
                cache.cache_path()
            );
        }

        Commands::Identify { names, output } => {
            let raw = std::fs::read_to_string(&names)
                .with_context(|| format!("reading names from {:?}", names))?;
            let names: Vec<String> = raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();

            let known = if output.exists() {
                load_registry(&output)?
            } else {
                RegistryFile::default()
            };

            let api = WargamingApi::new(config.api.clone())?;
            let registry = resolve_names(&api, &names, known, config.api.batch_size).await?;
            save_registry(&output, &registry)?;

            println!(
                "Registered {} accounts ({} unresolved) to {:?}",
                registry.resolved.len(),
                registry.unresolved.len(),
                output
            );
        }
    }

    Ok(())
}
