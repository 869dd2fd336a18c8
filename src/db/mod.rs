pub mod seed;
pub use seed::seed_demo_games;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::env;
use std::str::FromStr;

use crate::config::DEFAULT_DATABASE_URL;
use crate::models::{GameRecord, Outcome};

pub async fn create_pool() -> Result<SqlitePool> {
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    create_pool_with_url(&database_url).await
}

pub async fn create_pool_with_url(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true);

    // An in-memory database lives only as long as its connection, so keep exactly one open.
    if database_url.contains(":memory:") {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        return Ok(pool);
    }

    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if let Some(parent) = std::path::Path::new(file_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.ok();
        }
    }

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database() -> Result<()> {
    let pool = create_pool().await?;
    init_database_with_pool(&pool).await
}

/// Called from the server and the pipeline so schema creation shares their pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS team_games (
            game_id TEXT PRIMARY KEY,
            game_date TEXT NOT NULL,
            matchup TEXT NOT NULL,
            wl TEXT,
            pts INTEGER NOT NULL,
            pts_allowed INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_team_games_date ON team_games(game_date)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

fn game_from_row(row: &SqliteRow) -> Result<GameRecord> {
    let outcome = row
        .get::<Option<String>, _>("wl")
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Outcome>())
        .transpose()?;

    Ok(GameRecord {
        id: row.get("game_id"),
        date: chrono::NaiveDate::parse_from_str(&row.get::<String, _>("game_date"), "%Y-%m-%d")?,
        matchup: row.get("matchup"),
        outcome,
        points_for: row.get("pts"),
        points_against: row.get("pts_allowed"),
    })
}

// Game operations
const UPSERT_GAME_SQL: &str = r#"
    INSERT OR REPLACE INTO team_games
    (game_id, game_date, matchup, wl, pts, pts_allowed)
    VALUES (?, ?, ?, ?, ?, ?)
"#;

/// Shared by the pool and transaction paths so both store rows the same way.
async fn upsert_game<'e, E>(executor: E, game: &GameRecord) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(UPSERT_GAME_SQL)
        .bind(&game.id)
        .bind(game.date.format("%Y-%m-%d").to_string())
        .bind(&game.matchup)
        .bind(game.outcome.map(|o| o.as_str()))
        .bind(game.points_for)
        .bind(game.points_against)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn insert_game(pool: &SqlitePool, game: &GameRecord) -> Result<()> {
    upsert_game(pool, game).await
}

/// Swap the stored game log for `games` in one transaction.
pub async fn replace_games(pool: &SqlitePool, games: &[GameRecord]) -> Result<usize> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM team_games").execute(&mut *tx).await?;

    for game in games {
        upsert_game(&mut *tx, game).await?;
    }

    tx.commit().await?;
    tracing::info!("Stored {} games", games.len());
    Ok(games.len())
}

pub async fn get_games_ordered(pool: &SqlitePool) -> Result<Vec<GameRecord>> {
    let rows = sqlx::query(
        "SELECT game_id, game_date, matchup, wl, pts, pts_allowed FROM team_games ORDER BY game_date, game_id"
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(game_from_row).collect()
}

pub async fn count_games(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM team_games")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = create_pool_with_url("sqlite::memory:").await.unwrap();
    init_database_with_pool(&pool).await.unwrap();
    pool
}
