use anyhow::{anyhow, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::models::{GameRecord, Outcome};

/// Parse a provider game date. Accepts "2024-10-23" and "2024-10-23T00:00:00".
pub fn parse_game_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .map_err(|e| anyhow!("Bad game date '{}': {}", raw, e))
}

/// Validate an NBA season string such as "2024-25".
pub fn validate_season(season: &str) -> Result<()> {
    let (start, end) = season
        .split_once('-')
        .ok_or_else(|| anyhow!("Season must look like 2024-25, got '{}'", season))?;

    if start.len() != 4 || end.len() != 2 {
        return Err(anyhow!("Season must look like 2024-25, got '{}'", season));
    }

    let start: i32 = start.parse().map_err(|_| anyhow!("Bad season start year in '{}'", season))?;
    let end: i32 = end.parse().map_err(|_| anyhow!("Bad season end year in '{}'", season))?;

    if (start + 1) % 100 != end {
        return Err(anyhow!("Season years must be consecutive, got '{}'", season));
    }
    Ok(())
}

/// Season a given date belongs to. Seasons roll over in October.
pub fn season_for_date(date: NaiveDate) -> String {
    let start = if date.month() >= 10 { date.year() } else { date.year() - 1 };
    format!("{}-{:02}", start, (start + 1) % 100)
}

/// Convert a game log to a form string, most recent first (e.g., "WLWWL")
pub fn results_to_form(games: &[GameRecord], last: usize) -> String {
    games
        .iter()
        .rev()
        .filter_map(|g| g.outcome)
        .take(last)
        .map(|o| match o {
            Outcome::Win => 'W',
            Outcome::Loss => 'L',
        })
        .collect()
}

/// (wins, losses) over games with a recorded outcome
pub fn win_loss_record(games: &[GameRecord]) -> (u32, u32) {
    games.iter().fold((0, 0), |(w, l), g| match g.outcome {
        Some(Outcome::Win) => (w + 1, l),
        Some(Outcome::Loss) => (w, l + 1),
        None => (w, l),
    })
}
