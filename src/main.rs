//! dirql entry point
//!
//! Parsing and dispatch live in `cli::run`; this only reports the error and
//! sets the exit status.

use dirql::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
