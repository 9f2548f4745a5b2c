// SPDX-FileCopyrightText: 2026 Amica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Amica - a desktop AI companion agent.
//!
//! This is the binary entry point for the Amica agent.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod shell;

/// Amica - a desktop AI companion agent.
#[derive(Parser, Debug)]
#[command(name = "amica", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Launch an interactive chat session.
    Shell,
    /// Print the resolved configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match amica_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            amica_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.agent.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => println!("{rendered}"),
            Err(e) => {
                eprintln!("amica: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        // The shell is the default surface.
        Some(Commands::Shell) | None => {
            if let Err(e) = shell::run_shell(config).await {
                eprintln!("amica: {e}");
                std::process::exit(1);
            }
        }
    }
}
