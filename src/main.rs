//! qdl CLI - command line console for the Quandl financial data API.

use std::process;

use clap::Parser;

use qdl::cli::Cli;
use qdl::commands;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = commands::run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
