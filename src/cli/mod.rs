use anyhow::{anyhow, Result};
use std::path::Path;

use crate::config::Settings;
use crate::db::{create_pool_with_url, get_games_ordered, init_database_with_pool, seed_demo_games};
use crate::models::MetricRecord;
use crate::services::{compute_rolling_metrics, run_pipeline, DataFetcher, WindowSize};
use crate::utils::{results_to_form, win_loss_record};

pub async fn fetch_data(settings: &Settings, team: &str, season: &str) -> Result<()> {
    let pool = create_pool_with_url(&settings.database_url).await?;
    let fetcher = DataFetcher::new(&settings.nba_stats_base_url)?;

    println!("🏀 Fetching {} {} game log...", team.to_uppercase(), season);

    let stored = run_pipeline(&pool, &fetcher, team, season).await?;

    println!("✅ Stored {} games!", stored);
    Ok(())
}

pub async fn seed(settings: &Settings) -> Result<()> {
    let pool = create_pool_with_url(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;
    seed_demo_games(&pool).await?;
    println!("✅ Demo game log loaded");
    Ok(())
}

pub async fn show_games(settings: &Settings) -> Result<()> {
    let pool = create_pool_with_url(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let games = get_games_ordered(&pool).await?;

    if games.is_empty() {
        println!("📭 No games found. Try fetching data first with: teamform fetch --team PHX");
        return Ok(());
    }

    let (wins, losses) = win_loss_record(&games);
    println!("📅 Game Log ({} games, {}-{}, last 5: {}):\n", games.len(), wins, losses, results_to_form(&games, 5));

    for game in &games {
        println!("   {} {:<14} {} {:>3}-{:<3} ({:+})",
            game.date.format("%Y-%m-%d"),
            game.matchup,
            game.outcome.map_or("?", |o| o.as_str()),
            game.points_for,
            game.points_against,
            game.margin()
        );
    }

    Ok(())
}

async fn load_metrics(settings: &Settings, window: WindowSize) -> Result<Vec<MetricRecord>> {
    let pool = create_pool_with_url(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;
    let games = get_games_ordered(&pool).await?;
    Ok(compute_rolling_metrics(&games, window))
}

pub async fn show_metrics(settings: &Settings, window: WindowSize) -> Result<()> {
    let metrics = load_metrics(settings, window).await?;

    if metrics.is_empty() {
        println!("📭 Not enough games for rolling metrics yet.");
        return Ok(());
    }

    println!("📈 Rolling Metrics (window = {} games):\n", window.get());
    println!("   {:<10}  {:>8}  {:>8}  {:>8}", "Date", "Pts", "Allowed", "Net");
    for m in &metrics {
        println!("   {}  {:>8.1}  {:>8.1}  {:>+8.1}",
            m.date.format("%Y-%m-%d"),
            m.avg_points_for,
            m.avg_points_against,
            m.net_differential
        );
    }

    Ok(())
}

pub async fn export_metrics(settings: &Settings, window: WindowSize, format: &str, output: &Path) -> Result<()> {
    let metrics = load_metrics(settings, window).await?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    match format {
        "csv" => write_metrics_csv(&metrics, output)?,
        "json" => {
            let json_str = serde_json::to_string_pretty(&metrics)?;
            tokio::fs::write(output, json_str).await?;
        }
        _ => return Err(anyhow!("Unsupported format: {}", format)),
    }

    println!("💾 Wrote {} rows to {}", metrics.len(), output.display());
    Ok(())
}

fn write_metrics_csv(metrics: &[MetricRecord], output: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output)?;
    for m in metrics {
        writer.serialize(m)?;
    }
    writer.flush()?;
    Ok(())
}
