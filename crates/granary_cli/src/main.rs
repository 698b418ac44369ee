//! Granary CLI - command-line interface for the GitHub warehouse loader.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::limits::OutputFormat;
use crate::commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "granary")]
#[command(version)]
#[command(about = "Load raw GitHub API data into a Postgres warehouse")]
#[command(
    long_about = "Granary extracts raw JSON from the GitHub REST API and appends it to \
per-endpoint raw_* tables in a Postgres warehouse. Payloads are stored verbatim so \
downstream models can be rebuilt without refetching."
)]
#[command(after_long_help = r#"EXAMPLES
    Load every endpoint for one repository:
        $ granary run --owner rust-lang --repo rust

    Load an organization's repository list only:
        $ granary run --owner rust-lang

    Load a user's repositories:
        $ granary run --owner alice --user

    Incremental commits and issues since a timestamp:
        $ granary run --owner acme --repo widget --endpoints commits,issues --since 2024-01-01T00:00:00Z

    Row counts for the raw tables:
        $ granary status

    Remaining API quota as JSON:
        $ granary limits --output json

CONFIGURATION
    Granary reads configuration from:
      1. ~/.config/granary/config.toml (or $XDG_CONFIG_HOME/granary/config.toml)
      2. ./granary.toml in the current directory
      3. Environment variables (GRANARY_* prefix, e.g., GRANARY_GITHUB_TOKEN)
      4. .env file in the current directory

ENVIRONMENT VARIABLES
    GRANARY_GITHUB_TOKEN     GitHub personal access token (legacy: GITHUB_PAT)
    GRANARY_WAREHOUSE_URL    Postgres connection string (legacy: POSTGRES_URL)
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract GitHub endpoints and load them into the warehouse
    Run(RunArgs),
    /// Show row counts for the raw warehouse tables
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
    /// Show remaining GitHub API quota
    Limits {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new("granary=info,granary_cli=info"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();

    // Load configuration (config files -> env vars)
    let config = config::Config::load();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            commands::run::handle_run(args, &config).await?;
        }
        Commands::Status { output } => {
            commands::status::handle_status(&config, output).await?;
        }
        Commands::Limits { output } => {
            commands::limits::handle_limits(&config, output).await?;
        }
    }

    Ok(())
}
