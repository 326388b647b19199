//! Command-line interface for stillwave
//!
//! Provides argument parsing using clap derive macros.

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Guided meditation player
#[derive(Parser, Debug)]
#[command(name = "stillwave", version, about = "Guided meditation player")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug logs, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Options shared by every command that builds a timeline.
#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Voice for speech synthesis (alloy, ash, coral, echo, onyx, nova, sage, shimmer, random)
    #[arg(long, value_name = "VOICE")]
    pub voice: Option<String>,

    /// WAV file to use as the bell
    #[arg(long, value_name = "PATH")]
    pub bell: Option<PathBuf>,

    /// Use a local test tone instead of the speech endpoint, and a synthesized bell
    #[arg(long)]
    pub offline: bool,

    /// Speech requests in flight at once
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,
}

/// Parse a position such as `90`, `1m30s` or `2.5` into seconds.
///
/// Bare numbers are seconds; anything else goes through `humantime`.
fn parse_position_secs(s: &str) -> Result<f64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        if secs.is_finite() && secs >= 0.0 {
            return Ok(secs);
        }
        return Err(format!("invalid position: {}", s));
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f64())
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a timeline from a script and play it with interactive controls
    Play {
        /// Script file, or `-` for stdin
        script: PathBuf,

        /// Start playback at this position (e.g. 90, 1m30s)
        #[arg(long, value_name = "POSITION", value_parser = parse_position_secs)]
        start_at: Option<f64>,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Build a timeline and write it to a WAV file
    Render {
        /// Script file, or `-` for stdin
        script: PathBuf,

        /// Output WAV path
        #[arg(long, short = 'o', value_name = "PATH")]
        output: PathBuf,

        #[command(flatten)]
        build: BuildArgs,
    },

    /// Show how a script is split into segments
    Parse {
        /// Script file, or `-` for stdin
        script: PathBuf,

        /// Print segments as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available audio output devices
    Devices,

    /// Inspect configuration
    Config {
        /// Action to perform
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
}
