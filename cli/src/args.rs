//! Command-line parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pacer")]
#[command(about = "Command-line client for the Pacer API")]
#[command(after_help = "\
Environment:
  PACER_CONFIG                    Config file (default ~/.pacer/config.toml)
  PACER_BASE_URL                  Overrides api.base_url
  PACER_EMAIL, PACER_PASSWORD     Credentials used to sign in when no session exists
  RUST_LOG                        Log filter (default info)")]
pub struct Cli {
    /// Config file to load instead of ~/.pacer/config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show who is signed in
    #[command(name = "whoami")]
    WhoAmI,
    /// GET each API path and print the JSON body
    Get {
        /// API paths, e.g. /api/backlog
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<String>,
    },
    /// Sign out
    Logout,
    /// List navigation entries
    Nav,
    /// Print this device's identifier
    DeviceId {
        /// Discard the stored identifier and generate a new one
        #[arg(long)]
        reset: bool,
    },
}
