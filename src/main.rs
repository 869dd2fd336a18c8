mod api;
mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::services::WindowSize;

#[derive(Parser)]
#[command(name = "teamform")]
#[command(about = "Team game-log ingestion and rolling performance metrics")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Fetch a team's season game log and store it
    Fetch {
        /// Team abbreviation, e.g. PHX
        #[arg(short, long)]
        team: Option<String>,
        /// Season, e.g. 2024-25
        #[arg(short, long)]
        season: Option<String>,
    },
    /// Initialize the database
    InitDb,
    /// Load a demo game log
    Seed,
    /// Print the stored game log
    Games,
    /// Print rolling metrics
    Metrics {
        #[arg(short, long, value_parser = parse_window)]
        window: Option<WindowSize>,
    },
    /// Write rolling metrics to a CSV or JSON file
    Export {
        #[arg(short, long, value_parser = parse_window)]
        window: Option<WindowSize>,
        #[arg(short, long, default_value = "csv")]
        format: String,
        #[arg(short, long, default_value = "data/exports/team_metrics.csv")]
        output: PathBuf,
    },
}

fn parse_window(raw: &str) -> Result<WindowSize, String> {
    WindowSize::parse(raw).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(settings.port);
            tracing::info!("Starting team metrics API server on port {}", port);
            api::serve(&settings, port).await?;
        }
        Some(Commands::Fetch { team, season }) => {
            let team = team.unwrap_or_else(|| settings.team_abbrev.clone());
            let season = season.unwrap_or_else(|| settings.season.clone());
            tracing::info!("Fetching game log for {} {}", team, season);
            cli::fetch_data(&settings, &team, &season).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database().await?;
        }
        Some(Commands::Seed) => {
            cli::seed(&settings).await?;
        }
        Some(Commands::Games) => {
            cli::show_games(&settings).await?;
        }
        Some(Commands::Metrics { window }) => {
            cli::show_metrics(&settings, window.unwrap_or(settings.default_window)).await?;
        }
        Some(Commands::Export { window, format, output }) => {
            let window = window.unwrap_or(settings.default_window);
            cli::export_metrics(&settings, window, &format, &output).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting team metrics API server on port {}", settings.port);
            api::serve(&settings, settings.port).await?;
        }
    }

    Ok(())
}
