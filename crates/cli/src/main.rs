//! Mathwise CLI — the main entry point.
//!
//! Commands:
//! - `onboard` — Write a default config file
//! - `chat`    — Interactive or single-question tutoring in the terminal
//! - `serve`   — Start the web chat and HTTP API
//! - `doctor`  — Diagnose configuration and provider health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "mathwise",
    about = "Mathwise — a step-by-step math problem solver",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Ask the math tutor questions in the terminal
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Print the agent's thoughts and tool calls as they happen
        #[arg(long)]
        show_thoughts: bool,
    },

    /// Start the web chat and HTTP API
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Onboard => commands::onboard::run()?,
        Commands::Chat {
            message,
            show_thoughts,
        } => commands::chat::run(message, show_thoughts).await?,
        Commands::Serve { port, host } => commands::serve::run(port, host).await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with chat output.
fn init_tracing(verbose: bool, json: bool) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
