mod commands;
mod render;
mod utils;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use davfixture_core::FixtureConfig;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_LOG_FILTER: &str = "davfixture=info,davfixture_core=info";

#[derive(Parser)]
#[command(name = "davfixture")]
#[command(about = "Run a disposable CalDAV server seeded with calendar fixtures")]
struct Cli {
    /// Read settings from this file instead of the standard locations
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server, seed it, and keep it running until Ctrl-C
    Serve {
        /// Use this port instead of probing for a free one
        #[arg(short, long)]
        port: Option<u16>,

        /// Seed file (TOML or JSON) mapping identities to events; repeatable
        #[arg(short, long)]
        seed: Vec<PathBuf>,

        /// Wait until the server accepts connections before seeding
        #[arg(long)]
        wait: bool,
    },
    /// Print the server config that would be generated
    Config {
        /// Port to render (defaults to the configured start port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the iCalendar feeds a seed file produces
    Feed {
        seed: PathBuf,

        /// Only render this identity
        #[arg(short, long)]
        identity: Option<String>,
    },
    /// Print the first free port at or above the start port
    Port {
        #[arg(short, long)]
        start: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port, seed, wait } => {
            commands::serve::run(config, port, &seed, wait).await
        }
        Commands::Config { port } => commands::config::run(config, port),
        Commands::Feed { seed, identity } => commands::feed::run(&seed, identity.as_deref()),
        Commands::Port { start } => commands::port::run(start.unwrap_or(config.start_port)).await,
    }
}

/// Logs go to stderr so `config` and `feed` output can be piped.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<FixtureConfig> {
    let config = match path {
        Some(path) => FixtureConfig::load_from_file(path)?,
        None => FixtureConfig::load()?,
    };
    tracing::debug!(config = ?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_accepts_repeated_seeds() {
        let cli = Cli::parse_from([
            "davfixture", "serve", "--port", "51234", "--seed", "a.toml", "--seed", "b.json",
        ]);
        match cli.command {
            Commands::Serve { port, seed, wait } => {
                assert_eq!(port, Some(51234));
                assert_eq!(seed, vec![PathBuf::from("a.toml"), PathBuf::from("b.json")]);
                assert!(!wait);
            }
            _ => panic!("expected serve"),
        }
    }
}
