//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod browse;
mod config_cmd;
mod registry;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use hymnal::config::{Config, Settings};
use hymnal::patterns::PatternPolicy;
use hymnal::resolver::ProbeStrategy;

/// Probe scheduling for one number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// One probe at a time in candidate order
    Sequential,
    /// All candidates at once; first hit wins
    Parallel,
}

impl From<StrategyArg> for ProbeStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => ProbeStrategy::Sequential,
            StrategyArg::Parallel => ProbeStrategy::Parallel,
        }
    }
}

/// Which combined-file names to guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Single files and two-page pairs
    Narrow,
    /// Also wider ranges and category-prefixed names
    Wide,
}

impl From<PolicyArg> for PatternPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Narrow => PatternPolicy::Narrow,
            PolicyArg::Wide => PatternPolicy::Wide,
        }
    }
}

#[derive(Parser)]
#[command(name = "hymnal")]
#[command(about = "Resolve scanned hymn sheet images on a static file server")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Asset server root URL
    #[arg(long, global = true, env = "HYMNAL_BASE_URL")]
    base_url: Option<String>,

    /// Probe a local mirror directory instead of the server
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Probe scheduling strategy
    #[arg(long, global = true, value_enum)]
    strategy: Option<StrategyArg>,

    /// Filename guessing policy
    #[arg(long, global = true, value_enum)]
    policy: Option<PolicyArg>,

    /// Per-probe deadline in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// List configured categories
    Categories,

    /// Show the filenames that would be probed for a number
    Candidates {
        /// Category ID
        category: String,
        /// Hymn number
        number: String,
    },

    /// Find one number (and the one after it)
    Search {
        /// Category ID
        category: String,
        /// Hymn number
        number: String,
        /// Print the search report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve every number in a category
    Load {
        /// Category ID (defaults to the configured default category)
        category: Option<String>,
        /// Print the final slots as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective settings
    Config,
}

impl Cli {
    /// Load config (explicit path or discovery), then apply flag overrides.
    async fn settings(&self) -> anyhow::Result<Settings> {
        let config = match &self.config {
            Some(path) => Config::load_from_path(path)
                .await
                .with_context(|| format!("Loading {}", path.display()))?,
            None => Config::load().await,
        };

        let mut settings = config.to_settings();
        if let Some(ref url) = self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(ref root) = self.root {
            settings.asset_root = Some(root.clone());
        }
        if let Some(strategy) = self.strategy {
            settings.strategy = strategy.into();
        }
        if let Some(policy) = self.policy {
            settings.pattern_policy = policy.into();
        }
        if let Some(ms) = self.timeout_ms {
            settings.probe_timeout_ms = ms;
        }
        Ok(settings)
    }
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings().await?;

    match cli.command {
        Commands::Categories => registry::cmd_categories(&settings),
        Commands::Candidates { category, number } => {
            registry::cmd_candidates(&settings, &category, &number)
        }
        Commands::Search {
            category,
            number,
            json,
        } => browse::cmd_search(&settings, &category, &number, json).await,
        Commands::Load { category, json } => {
            browse::cmd_load(&settings, category.as_deref(), json).await
        }
        Commands::Config => config_cmd::cmd_config(&settings),
    }
}
