//! Command-line interface for the `mentora` recommendation engine.
//!
//! Loads a marketplace snapshot into the in-memory stores and prints one
//! page of ranked recommendations.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Recommend(args) => commands::handle_recommend_command(args),
        Commands::Settings => commands::handle_settings_command(),
    }
}
