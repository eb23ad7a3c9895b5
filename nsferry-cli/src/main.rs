//! nsferry command-line interface
//!
//! Hands the holder's Linux namespace descriptors to a receiver over a
//! Unix-domain socket, so the receiver (or a program it runs) can join
//! those namespaces later.

use clap::Parser;
use std::process;
use tracing::Level;

mod cli;
mod run;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Diagnostics go to stderr; stdout belongs to any program the
    // client runs after the handoff.
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Server { socket } => run::server(&socket),
        Commands::Client { socket, command } => run::client(&socket, &command),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
