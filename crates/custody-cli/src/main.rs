//! Custody CLI.
//!
//! Drives the owner-thread store, the locked store, quorum votes and atomic
//! counters from the command line.
//!
//! # Quick Start
//!
//! ```bash
//! # 100 readers and 10 writers against the owner thread for one second
//! custody owned
//!
//! # Same load against the mutex-guarded store, as JSON
//! custody locked --duration-ms 500 --json
//!
//! # Ten voters, win with five positive ballots
//! custody vote --voters 10 --threshold 5
//!
//! # 50 threads x 1000 atomic increments
//! custody count
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use custody_config::{ConfigLoader, CustodyConfig};

/// Custody - shared state by ownership, by lock, and by atomics.
#[derive(Parser)]
#[command(name = "custody")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory containing custody.toml.
    #[arg(short = 'C', long, global = true, default_value = ".")]
    project: PathBuf,

    /// Print the report as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Run the reader/writer workload against the owner-thread store.
    Owned {
        #[command(flatten)]
        workload: WorkloadArgs,

        /// Request channel capacity (0 for rendezvous).
        #[arg(long)]
        request_capacity: Option<usize>,

        /// Keep a journal of this many processed requests.
        #[arg(long)]
        journal: Option<usize>,
    },

    /// Run the reader/writer workload against the mutex-guarded store.
    Locked {
        #[command(flatten)]
        workload: WorkloadArgs,
    },

    /// Hold a vote and wait for the outcome.
    Vote {
        /// Number of voter threads.
        #[arg(short = 'n', long)]
        voters: Option<usize>,

        /// Positive ballots needed to win.
        #[arg(short = 'k', long)]
        threshold: Option<usize>,

        /// Chance that a voter casts a positive ballot.
        #[arg(short, long, default_value = "0.5")]
        probability: f64,
    },

    /// Increment one shared atomic counter from many threads.
    Count {
        /// Number of threads.
        #[arg(short, long)]
        threads: Option<usize>,

        /// Increments per thread.
        #[arg(short, long)]
        increments: Option<u64>,
    },

    /// Show the effective configuration.
    Config {
        /// Output format (toml, json).
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
}

/// Workload overrides shared by `owned` and `locked`.
#[derive(Args, Default)]
struct WorkloadArgs {
    /// Number of reader threads.
    #[arg(short, long)]
    readers: Option<usize>,

    /// Number of writer threads.
    #[arg(short, long)]
    writers: Option<usize>,

    /// Keys are drawn from 0..KEY_SPACE.
    #[arg(long)]
    key_space: Option<i64>,

    /// Run length in milliseconds.
    #[arg(short, long)]
    duration_ms: Option<u64>,
}

impl WorkloadArgs {
    fn apply(&self, config: &mut CustodyConfig) {
        let section = &mut config.workload;
        if let Some(readers) = self.readers {
            section.readers = readers;
        }
        if let Some(writers) = self.writers {
            section.writers = writers;
        }
        if let Some(key_space) = self.key_space {
            section.key_space = key_space;
        }
        if let Some(duration_ms) = self.duration_ms {
            section.duration_ms = duration_ms;
        }
    }
}

impl Cli {
    /// Loads the merged configuration and applies command-line overrides.
    fn resolve_config(&self) -> Result<CustodyConfig> {
        let mut config = ConfigLoader::new()
            .with_project_dir(&self.project)
            .load()
            .context("Failed to load configuration")?;

        match &self.command {
            Commands::Owned {
                workload,
                request_capacity,
                journal,
            } => {
                workload.apply(&mut config);
                if let Some(capacity) = request_capacity {
                    config.store.request_capacity = *capacity;
                }
                if let Some(capacity) = journal {
                    config.store.journal_capacity = *capacity;
                }
            }
            Commands::Locked { workload } => workload.apply(&mut config),
            Commands::Vote {
                voters, threshold, ..
            } => {
                if let Some(voters) = voters {
                    config.quorum.voters = *voters;
                }
                if let Some(threshold) = threshold {
                    config.quorum.threshold = *threshold;
                }
            }
            Commands::Count {
                threads,
                increments,
            } => {
                if let Some(threads) = threads {
                    config.counting.threads = *threads;
                }
                if let Some(increments) = increments {
                    config.counting.increments = *increments;
                }
            }
            Commands::Version | Commands::Config { .. } => {}
        }

        config.validate().context("Invalid command-line overrides")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        commands::version::run();
        return Ok(());
    }

    let config = cli.resolve_config()?;

    match cli.command {
        Commands::Version => Ok(()),
        Commands::Owned { .. } => commands::owned::run(&config, cli.json),
        Commands::Locked { .. } => commands::locked::run(&config, cli.json),
        Commands::Vote { probability, .. } => commands::vote::run(&config, probability, cli.json),
        Commands::Count { .. } => commands::count::run(&config, cli.json),
        Commands::Config { format } => {
            let format = if cli.json { "json" } else { format.as_str() };
            commands::config::show(&config, format)
        }
    }
}
