//! Command-line interface
//!
//! - run: execute a query over directory trees, results on stdout
//! - explain: print the parsed statement as JSON
//!
//! Logs go to stderr.

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, RunArgs};
pub use commands::{execute, explain, explain_document, run_command};
pub use config::{Config, OutputFormat};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{row_writer, write_json, CsvRowWriter, JsonRowWriter, RowWriter};

/// Parse process arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}
