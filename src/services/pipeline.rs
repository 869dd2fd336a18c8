use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::{init_database_with_pool, replace_games};
use crate::services::DataFetcher;

/// Fetch a team's season game log and make it the stored log. Returns games stored.
pub async fn run_pipeline(
    pool: &SqlitePool,
    fetcher: &DataFetcher,
    team_abbrev: &str,
    season: &str,
) -> Result<usize> {
    tracing::info!("Initializing DB...");
    init_database_with_pool(pool).await?;

    tracing::info!("Fetching games for {} {} ...", team_abbrev, season);
    let games = fetcher.fetch_team_games(team_abbrev, season).await?;
    tracing::info!("{} games fetched.", games.len());

    tracing::info!("Loading into SQLite...");
    let stored = replace_games(pool, &games).await?;
    tracing::info!("Done.");

    Ok(stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_with_url, get_games_ordered, seed_demo_games, test_pool};
    use crate::services::data_fetcher::stats_stub::{self, phx_payload};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::time::Duration;

    fn local_fetcher(base_url: &str) -> DataFetcher {
        DataFetcher::local(base_url, Duration::from_millis(1)).unwrap()
    }

    #[tokio::test]
    async fn test_pipeline_stores_fetched_log() {
        let stub = stats_stub::spawn(vec![(StatusCode::OK, phx_payload())]).await;
        // fresh pool: the pipeline creates the schema itself
        let pool = create_pool_with_url("sqlite::memory:").await.unwrap();

        let stored = run_pipeline(&pool, &local_fetcher(&stub.base_url), "PHX", "2024-25")
            .await
            .unwrap();
        assert_eq!(stored, 2);

        let games = get_games_ordered(&pool).await.unwrap();
        let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["0022400061", "0022400075"]);
        assert_eq!(games[1].points_against, 105);
    }

    #[tokio::test]
    async fn test_pipeline_replaces_previous_log() {
        let pool = test_pool().await;
        seed_demo_games(&pool).await.unwrap();

        let stub = stats_stub::spawn(vec![
            (StatusCode::TOO_MANY_REQUESTS, json!({})),
            (StatusCode::OK, phx_payload()),
        ])
        .await;
        let stored = run_pipeline(&pool, &local_fetcher(&stub.base_url), "PHX", "2024-25")
            .await
            .unwrap();

        assert_eq!(stored, 2);
        assert_eq!(get_games_ordered(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_stored_log() {
        let pool = test_pool().await;
        seed_demo_games(&pool).await.unwrap();
        let before = get_games_ordered(&pool).await.unwrap();

        let stub = stats_stub::spawn(vec![(StatusCode::TOO_MANY_REQUESTS, json!({}))]).await;
        let result = run_pipeline(&pool, &local_fetcher(&stub.base_url), "PHX", "2024-25").await;

        assert!(result.is_err());
        assert_eq!(get_games_ordered(&pool).await.unwrap(), before);
    }
}
