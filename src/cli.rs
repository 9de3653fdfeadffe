//! CLI definitions for the taskdeck server.

use clap::Parser;

/// Task tracker REST server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Listening port (overrides the PORT environment variable)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to the SQLite database file (overrides TASKDECK_DB)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2")]
    pub log: String,
}
