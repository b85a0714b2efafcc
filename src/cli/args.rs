//! CLI argument definitions using clap
//!
//! Commands:
//! - dirql run <QUERY> <PATH>... [--json] [--no-headers] [--config <FILE>] [-v]
//! - dirql explain <QUERY>

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

/// dirql - query filesystem metadata with SQL-like statements
#[derive(Parser, Debug)]
#[command(name = "dirql")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a query over one or more directory trees
    Run(RunArgs),

    /// Print the parsed form of a query without running it
    Explain {
        /// Query text, e.g. "select name where size > 1024"
        query: String,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Query text
    pub query: String,

    /// Root paths to walk
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Write JSON lines instead of CSV
    #[arg(long)]
    pub json: bool,

    /// Omit the CSV header row
    #[arg(long)]
    pub no_headers: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log more: -v for info, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
