//! Command-line interface, clap-based.
//!
//! Defines the [`Cli`] struct with [`Command`] subcommands (run, demo) and
//! global flags (--max-concurrency, --verbose).

use clap::{Parser, Subcommand};

/// mapio — bounded-concurrency plan/map job orchestrator.
#[derive(Debug, Parser)]
#[command(name = "mapio", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Maximum simultaneous item invocations for this session.
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Enable verbose output.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download a list of resources through the plan/map pipeline.
    Run {
        /// Base URL every resource path is resolved against.
        #[arg(long)]
        base_url: String,

        /// Resource paths to download.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Directory the downloaded bodies are stored under.
        #[arg(long, default_value = "downloads")]
        out_dir: String,
    },

    /// Run the embedded demonstration against a simulated worker.
    Demo,
}
