//! gist-shell - GitHub Gists from the command line
//!
//! Available as the `gist` command.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use gist_shell::cli::commands::{Cli, Commands};
use gist_shell::cli::{auth, config, gist, Context};
use gist_shell::error::Result;

#[tokio::main]
async fn main() {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Config commands only touch the configuration file
        Commands::Config(args) => config::handle_config(args.command),

        Commands::Auth(args) => {
            let ctx = Context::new(&cli.global)?;
            auth::handle_auth(&ctx, args.command).await
        }

        Commands::Gist(command) => {
            let ctx = Context::new(&cli.global)?;
            gist::handle_gist(&ctx, command).await
        }
    }
}
