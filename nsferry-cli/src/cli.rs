//! CLI argument definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nsferry")]
#[command(about = "Namespace descriptor handoff over a Unix socket", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Hold this process's namespace descriptors and serve one receiver
    Server {
        /// Rendezvous socket path
        socket: PathBuf,
    },

    /// Receive the descriptors, then optionally run a program with them
    Client {
        /// Rendezvous socket path
        socket: PathBuf,

        /// Program to run once the descriptors arrive, followed by its
        /// argument vector (argv[0] onward)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}
