//! Command-line interface for codenames_server.

use clap::{Args, Parser, Subcommand};
use codenames_server::ConfigOverrides;
use std::path::PathBuf;

/// Codenames server - session store and HTTP API for a Codenames board
#[derive(Parser, Debug)]
#[command(name = "codenames_server")]
#[command(about = "HTTP server for browser-playable Codenames", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP game server
    Serve(ConfigArgs),

    /// Load the word lists and report what was found
    CheckWords(ConfigArgs),
}

/// Config file plus per-field overrides
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served under /static/
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Directory holding index.html
    #[arg(long)]
    pub frontend_dir: Option<PathBuf>,

    /// Play-word list
    #[arg(long)]
    pub word_file: Option<PathBuf>,

    /// Game-id word list
    #[arg(long)]
    pub game_id_file: Option<PathBuf>,

    /// Analytics tracking id for the index page
    #[arg(long, env = "CODENAMES_ANALYTICS_ID")]
    pub analytics_id: Option<String>,
}

impl ConfigArgs {
    /// Splits the config path from the field overrides.
    pub fn into_parts(self) -> (Option<PathBuf>, ConfigOverrides) {
        let overrides = ConfigOverrides {
            host: self.host,
            port: self.port,
            static_dir: self.static_dir,
            frontend_dir: self.frontend_dir,
            word_file: self.word_file,
            game_id_file: self.game_id_file,
            analytics_id: self.analytics_id,
        };
        (self.config, overrides)
    }
}
