//! fsbridge CLI entry point
//!
//! Minimal: init logging, dispatch to the CLI module, print the error and
//! exit non-zero on failure.

use fsbridge::cli;

fn main() {
    env_logger::init();
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
