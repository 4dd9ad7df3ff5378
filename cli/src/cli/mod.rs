pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "soc-gateway")]
#[command(author, version, about = "SOC console gateway - forwards /api traffic to the backend origin")]
pub struct Cli {
    /// Path to config file (checked in order: local config.toml, ~/.config/soc-gateway/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the gateway server
    Start {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Probe a running gateway's health endpoint
    Status {
        /// Gateway base URL (defaults to the configured host and port)
        #[arg(short, long)]
        url: Option<String>,
    },
}
