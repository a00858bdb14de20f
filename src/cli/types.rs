//! CLI type definitions

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bts-github-sync")]
#[command(about = "Mirror Debian BTS bug reports into GitHub issues", long_about = None)]
#[command(version)]
pub struct Cli {
    /// YAML configuration file
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Fetch everything but only log the changes that would be made on GitHub
    #[arg(short = 's', long)]
    pub dry_run: bool,

    /// Always query the BTS, bypassing the local cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print the final report as JSON
    #[arg(long)]
    pub json: bool,
}
