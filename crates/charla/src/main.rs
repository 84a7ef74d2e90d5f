// SPDX-FileCopyrightText: 2026 Charla Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Charla - conversational routing and scheduling engine.
//!
//! This is the binary entry point for the Charla engine.

use clap::{Parser, Subcommand};
use colored::Colorize;

mod console;
mod serve;

/// Charla - conversational routing and scheduling engine.
#[derive(Parser, Debug)]
#[command(name = "charla", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the engine with a local console transport.
    Serve,
    /// Manage Charla configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Load and print the effective configuration.
    Check,
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match charla_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {e}", "config error".red());
            std::process::exit(1);
        }
    };
    init_tracing(&config.agent.log_level);

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("{}: {e}", "error".red());
                std::process::exit(1);
            }
        }
        Some(Commands::Config {
            action: ConfigAction::Check,
        }) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                std::process::exit(1);
            }
        },
        None => {
            println!("charla: use --help for available commands");
        }
    }
}
