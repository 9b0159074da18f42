//! Ingestor CLI
//!
//! Local entry point for article extraction, guard checks and duplicate
//! matching against a candidate file.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};
use ingestor::{
    error::{AppError, Result},
    models::{Config, DedupCandidate, DedupFields},
    pipeline::{ContentGuards, DedupMatcher, Extractor},
};

/// ingestor - Vietnamese disaster-news content ingestion
#[derive(Parser, Debug)]
#[command(
    name = "ingestor",
    version,
    about = "Content ingestion core for disaster-news monitoring"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract full articles from one or more URLs
    Extract {
        /// Article URLs to extract
        #[arg(required = true)]
        urls: Vec<String>,

        /// Article language hint passed to the reconstruction tier
        #[arg(long, default_value = "vi")]
        language: String,

        /// Write results as JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the content guards over a UTF-8 text file
    Check {
        /// Path to the text file
        file: PathBuf,

        /// Article title, for the title-repetition guard
        #[arg(long, default_value = "")]
        title: String,
    },

    /// Match a new item against a JSON array of recent candidates
    Dedup {
        /// Path to the candidate file
        candidates: PathBuf,

        /// Title of the new item
        #[arg(long)]
        title: String,

        /// Description of the new item
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Show the comparison fields computed for a new item
    Normalize {
        /// Title of the item
        title: String,

        /// Description of the item
        #[arg(long, default_value = "")]
        description: String,

        /// Source URL of the item
        #[arg(long, default_value = "")]
        url: String,
    },

    /// Validate the configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("Ingestor starting...");

    let config = Arc::new(Config::load_or_default(&cli.config));

    match cli.command {
        Command::Extract {
            urls,
            language,
            output,
        } => {
            config.validate()?;
            let extractor = Extractor::new(Arc::clone(&config));
            let results = extractor.extract_batch(&urls, &language).await;

            for (url, result) in urls.iter().zip(&results) {
                log::info!(
                    "{} -> {} via {} ({} chars, {} ms)",
                    url,
                    result.status.as_str(),
                    result.tier_used.as_str(),
                    result.char_count,
                    result.extraction_time_ms
                );
            }
            extractor.stats().log_summary();

            let json = serde_json::to_string_pretty(&results)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("Results written to {}", path.display());
                }
                None => println!("{json}"),
            }
        }

        Command::Check { file, title } => {
            let text = std::fs::read_to_string(&file)?;
            let guards = ContentGuards::new(config.guards.clone());
            let verdict = guards.validate(&text, &title);

            for name in &verdict.passed {
                log::info!("✓ {name}");
            }
            for reason in &verdict.failed {
                log::warn!("✗ {reason}");
            }

            if !verdict.overall_pass {
                return Err(AppError::validation(format!(
                    "content rejected ({} guard(s) failed)",
                    verdict.failed.len()
                )));
            }
            log::info!("Content accepted");
        }

        Command::Dedup {
            candidates,
            title,
            description,
        } => {
            let content = std::fs::read_to_string(&candidates)?;
            let items: Vec<DedupCandidate> = serde_json::from_str(&content)?;
            log::info!(
                "Loaded {} candidates from {}",
                items.len(),
                candidates.display()
            );

            let fields = DedupFields::compute(&title, &description, "");
            let matcher = DedupMatcher::new(config.dedup.clone());
            match matcher.find_duplicate(&items, &fields, Utc::now()) {
                Some(found) => {
                    log::info!(
                        "Duplicate of item {} ({}, similarity {:.3})",
                        found.duplicate_id,
                        found.match_type.as_str(),
                        found.similarity
                    );
                    println!("{}", serde_json::to_string_pretty(&found)?);
                }
                None => log::info!("No duplicate found"),
            }
        }

        Command::Normalize {
            title,
            description,
            url,
        } => {
            let fields = DedupFields::compute(&title, &description, &url);
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let config = Config::load(&cli.config)?;
            config.validate()?;
            log::info!("✓ Config OK ({} site profiles)", config.sites.len());
        }
    }

    log::info!("Done!");

    Ok(())
}
