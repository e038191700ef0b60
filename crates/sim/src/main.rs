//! Headless battle simulator.
//!
//! Runs a scripted PvE or PvP battle through the runtime and prints each
//! round as text.
mod commands;
mod driver;
mod narrate;

use anyhow::Result;
use clap::Parser;
use commands::{Pve, Pvp};

/// Scripted battles against the combat engine
#[derive(Parser)]
#[command(name = "battle-sim")]
#[command(about = "Run scripted battles and narrate every round", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Party versus one catalog monster
    Pve(Pve),

    /// Player versus player
    Pvp(Pvp),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (for RUST_LOG and BATTLE_* overrides)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Pve(cmd) => cmd.execute().await,
        Command::Pvp(cmd) => cmd.execute().await,
    }
}
