//! CLI module for Podsum.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Podsum - Podcast episode processing pipeline
///
/// Transcribes, chunks and summarizes podcast episodes through the configured
/// services and keeps the results in a local episode store.
#[derive(Parser, Debug)]
#[command(name = "podsum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PODSUM_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level for the `podsum` target; `-v` flags win over `configured`.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one episode through the whole pipeline
    Process {
        /// Episode audio URL (http or https)
        audio_url: String,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List stored episodes
    List {
        /// Only show episodes missing a transcript or summaries
        #[arg(long)]
        incomplete: bool,
    },

    /// Show one stored episode
    Show {
        /// Episode id
        episode_id: String,
    },

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

    /// Show configuration file path
    Path,
}
