//! Command-line interface

use clap::Parser;

/// YouTube clip generation service
#[derive(Debug, Parser)]
#[command(name = "clipsmith", version, about)]
pub struct Cli {
    /// HTTP listen port (overrides WEB_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Log file path (overrides LOG_FILE_PATH)
    #[arg(long)]
    pub log_file: Option<String>,
}
