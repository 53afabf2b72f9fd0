// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `rollout`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rollout",
    version,
    about = "Deploy timestamped releases of a web application to a remote host.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Rollout.toml` in the current working directory. Values can
    /// also be supplied (or overridden) through environment variables.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ROLLOUT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Stage, activate and provision a new release.
    Deploy {
        /// Branch of the repository to deploy (overrides config).
        #[arg(long, value_name = "NAME")]
        branch: Option<String>,

        /// Skip the interactive confirmation.
        #[arg(long, short = 'y')]
        yes: bool,

        /// Print the resolved configuration and step plan, touch nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Delete old releases beyond the retention window.
    Cleanup {
        /// Number of most recent releases to keep (overrides config).
        #[arg(long, value_name = "N")]
        keep: Option<usize>,

        /// Show what would be deleted without deleting it.
        #[arg(long)]
        dry_run: bool,
    },

    /// List release directories on the target and which one is live.
    Releases,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
