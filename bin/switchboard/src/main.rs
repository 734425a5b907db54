mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Intent-routed multi-agent chat assistant", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (default: ~/.switchboard/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Talk to the agents (interactive mode if no message is given)
    Chat {
        /// Message to send (one-shot)
        #[arg(short, long)]
        message: Option<String>,

        /// Thread identifier
        #[arg(short, long, default_value = "cli:default")]
        thread: String,
    },

    /// Show which agent a message would route to
    Route {
        /// The message text to classify
        text: String,
    },

    /// Score a report file with the quality engine
    Score {
        /// Path to the text file to score
        file: PathBuf,
    },

    /// List registered capabilities
    Capabilities,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration (keys redacted)
    Show,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Chat { message, thread } => {
            commands::chat::run(message, thread, cli.config).await?;
        }
        Commands::Route { text } => {
            commands::route::run(&text, cli.config)?;
        }
        Commands::Score { file } => {
            commands::score::run(&file, cli.config)?;
        }
        Commands::Capabilities => {
            commands::capabilities::run()?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => commands::config_cmd::show(cli.config)?,
            ConfigCommands::Path => commands::config_cmd::path()?,
        },
    }

    Ok(())
}
