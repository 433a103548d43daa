//! Demonstration server for the trie router.
//!
//! ```text
//! trie-router --config router.toml --bind 127.0.0.1:8080
//! ```

use std::path::PathBuf;

use clap::Parser;

use trie_router::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "trie-router")]
#[command(about = "Trie-based HTTP router demo server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    startup::run(StartupOptions {
        config_path: cli.config,
        bind_address: cli.bind,
    })
    .await?;

    Ok(())
}
