//! CLI for snaprev.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use snaprev_core::config;
use snaprev_core::platform::{Architecture, Platform};
use snaprev_core::Revision;
use std::path::PathBuf;

use commands::{run_fetch, run_platforms, run_probe, run_resolve};

/// Top-level CLI for snaprev.
#[derive(Debug, Parser)]
#[command(name = "snaprev")]
#[command(about = "Find the nearest published Chromium snapshot revision per platform", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Where the revision walk starts.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct BaseArgs {
    /// Chromium version (e.g. 72.0.3586.2), looked up to its base revision.
    #[arg(long = "version", value_name = "VERSION")]
    pub chrome_version: Option<String>,
    /// Start from this revision without a version lookup.
    #[arg(long, value_name = "N")]
    pub base_revision: Option<Revision>,
}

/// Where `fetch` gets its starting revision.
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct FetchSource {
    /// Chromium version (e.g. 72.0.3586.2), looked up to its base revision.
    #[arg(long = "version", value_name = "VERSION")]
    pub chrome_version: Option<String>,
    /// Start from this revision without a version lookup.
    #[arg(long, value_name = "N")]
    pub base_revision: Option<Revision>,
    /// Use the running platform's revision from a table written by `resolve`.
    #[arg(long, value_name = "PATH")]
    pub table: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Resolve every fleet platform and write the revision table.
    Resolve {
        #[command(flatten)]
        base: BaseArgs,
        /// Decrements allowed below the base revision (overrides config).
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
        /// Revision table path (overrides config `output_path`).
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Download the running platform's archive, falling back to lower revisions.
    Fetch {
        #[command(flatten)]
        source: FetchSource,
        /// Decrements allowed below the starting revision (overrides config).
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
        /// Extract the archive into this directory.
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
        /// Keep the downloaded archive at this path instead of deleting it.
        #[arg(long, value_name = "PATH")]
        keep_archive: Option<PathBuf>,
    },

    /// Check whether one revision has an archive for one platform.
    Probe {
        #[arg(long, value_name = "N")]
        revision: Revision,
        /// linux, win32 or darwin.
        #[arg(long)]
        platform: Platform,
        /// x32 or x64; omit for darwin.
        #[arg(long)]
        arch: Option<Architecture>,
    },

    /// Show the configured fleet.
    Platforms,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Resolve {
                base,
                max_attempts,
                output,
            } => run_resolve(&cfg, &base, max_attempts, output).await?,
            CliCommand::Fetch {
                source,
                max_attempts,
                out_dir,
                keep_archive,
            } => run_fetch(&cfg, &source, max_attempts, out_dir, keep_archive).await?,
            CliCommand::Probe {
                revision,
                platform,
                arch,
            } => run_probe(&cfg, revision, platform, arch).await?,
            CliCommand::Platforms => run_platforms(&cfg),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
