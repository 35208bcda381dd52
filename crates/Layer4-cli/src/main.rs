//! Switchboard CLI - Main entry point

mod bench;
mod demo;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use switchboard_foundation::{JsonStore, SwitchboardConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Switchboard - in-process typed event dispatch
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Load config.json from this directory instead of the global/project layers
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the built-in commands against sample listeners
    Demo {
        /// Publish the tick events asynchronously
        #[arg(long = "async")]
        asynchronous: bool,

        /// Number of tick events to publish
        #[arg(short, long, default_value = "3")]
        events: usize,
    },
    /// Measure dispatch throughput
    Bench {
        /// Number of registered listeners
        #[arg(short, long, default_value = "16")]
        listeners: usize,

        /// Number of events to publish
        #[arg(short, long, default_value = "100000")]
        events: usize,

        /// Publish through the execution engine
        #[arg(long = "async")]
        asynchronous: bool,
    },
    /// Print the effective configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config = load_config(args.config.as_ref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        SwitchboardConfig::default()
    });

    match args.command {
        Command::Demo {
            asynchronous,
            events,
        } => demo::run(&config, asynchronous, events),
        Command::Bench {
            listeners,
            events,
            asynchronous,
        } => bench::run(&config, listeners, events, asynchronous),
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn load_config(dir: Option<&PathBuf>) -> switchboard_foundation::Result<SwitchboardConfig> {
    match dir {
        Some(dir) => SwitchboardConfig::load_from(&JsonStore::new(dir.clone())),
        None => SwitchboardConfig::load(),
    }
}
