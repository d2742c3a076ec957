//! CLI module for Reel.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::pipeline::audio::{parse_source_url, Balance};
use clap::{Args, Parser, Subcommand};
use url::Url;

/// Reel - clip montage builder
///
/// Remuxes and concatenates the video clips in a directory, lays a soundtrack
/// over the result (a local audio file or one downloaded from a URL), and
/// opens the finished montage in a media player.
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "REEL_CONFIG")]
    pub config: Option<String>,

    #[command(flatten)]
    pub montage: MontageArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options for building a montage.
#[derive(Args, Debug, Clone)]
pub struct MontageArgs {
    /// Download the soundtrack from this URL instead of using a local audio file
    #[arg(short = 'y', long, visible_alias = "yt", value_name = "URL", value_parser = parse_url)]
    pub youtube: Option<Url>,

    /// Mix the soundtrack under the clip audio at this volume (0.0-1.0).
    /// Without a value the configured default balance is used.
    #[arg(short, long, value_name = "F", num_args = 0..=1)]
    pub balance: Option<Option<Balance>>,

    /// Directory containing the clips
    #[arg(short, long, default_value = ".")]
    pub dir: String,

    /// Output file name (overrides general.output_name)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of clips remuxed concurrently (overrides normalize.max_concurrent)
    #[arg(short, long, value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Do not open the result in the media player
    #[arg(long)]
    pub no_play: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check external tools and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}

fn parse_url(s: &str) -> Result<Url, String> {
    parse_source_url(s).map_err(|e| e.to_string())
}

fn parse_jobs(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{}' is not a positive number", s)),
    }
}
