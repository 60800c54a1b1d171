//! nodo CLI - command-line interface for the nodo audio engine.

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nodo")]
#[command(author, version, about = "Pull-based audio node engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available audio devices
    Devices(commands::devices::DevicesArgs),

    /// Play a live sine test tone through the node graph
    Sine(commands::sine::SineArgs),

    /// Play a WAV file through the node graph
    Play(commands::play::PlayArgs),

    /// Render a sine patch offline to a WAV file
    Render(commands::render::RenderArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Sine(args) => commands::sine::run(args),
        Commands::Play(args) => commands::play::run(args),
        Commands::Render(args) => commands::render::run(args),
    }
}
