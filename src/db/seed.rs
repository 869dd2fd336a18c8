use anyhow::Result;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::db::{count_games, insert_game};
use crate::models::{GameRecord, Outcome};

// (game_id, date, matchup, pts, pts_allowed)
const DEMO_GAMES: [(&str, &str, &str, i32, i32); 12] = [
    ("0022400061", "2024-10-23", "PHX @ LAC", 116, 113),
    ("0022400075", "2024-10-25", "PHX vs. LAL", 109, 105),
    ("0022400093", "2024-10-26", "PHX vs. DAL", 114, 102),
    ("0022400106", "2024-10-28", "PHX vs. LAL", 109, 123),
    ("0022400121", "2024-10-30", "PHX vs. LAC", 125, 119),
    ("0022400137", "2024-11-01", "PHX @ SAS", 96, 104),
    ("0022400153", "2024-11-03", "PHX @ LAC", 118, 111),
    ("0022400165", "2024-11-05", "PHX vs. PHI", 118, 116),
    ("0022400178", "2024-11-07", "PHX vs. MIA", 115, 112),
    ("0022400193", "2024-11-09", "PHX vs. UTA", 120, 112),
    ("0022400207", "2024-11-11", "PHX vs. OKC", 103, 99),
    ("0022400217", "2024-11-12", "PHX vs. SAC", 108, 127),
];

pub fn demo_games() -> Result<Vec<GameRecord>> {
    DEMO_GAMES
        .iter()
        .map(|(id, date, matchup, pts, allowed)| -> Result<GameRecord> {
            Ok(GameRecord {
                id: id.to_string(),
                date: NaiveDate::parse_from_str(date, "%Y-%m-%d")?,
                matchup: matchup.to_string(),
                outcome: Some(if pts > allowed { Outcome::Win } else { Outcome::Loss }),
                points_for: *pts,
                points_against: *allowed,
            })
        })
        .collect()
}

/// Load a short demo game log so the API and dashboard work without provider access.
pub async fn seed_demo_games(pool: &SqlitePool) -> Result<()> {
    let count = count_games(pool).await?;

    if count > 0 {
        tracing::info!("Database already seeded ({} games found), skipping.", count);
        return Ok(());
    }

    tracing::info!("Seeding database with demo game log...");

    for game in demo_games()? {
        insert_game(pool, &game).await?;
    }

    tracing::info!("Database seeded successfully.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_games_ordered, test_pool};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = test_pool().await;
        seed_demo_games(&pool).await.unwrap();
        seed_demo_games(&pool).await.unwrap();

        let games = get_games_ordered(&pool).await.unwrap();
        assert_eq!(games.len(), DEMO_GAMES.len());
        assert!(games.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
