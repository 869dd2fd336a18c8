use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of a single game from the tracked team's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "W",
            Outcome::Loss => "L",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "W" => Ok(Outcome::Win),
            "L" => Ok(Outcome::Loss),
            other => Err(anyhow::anyhow!("Unknown game outcome '{}'", other)),
        }
    }
}

/// One row of the team's game log. Keyed by the provider's game id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    #[serde(rename = "game_id")]
    pub id: String,
    #[serde(rename = "game_date")]
    pub date: NaiveDate,
    /// Provider matchup descriptor, e.g. "PHX vs. LAL" or "PHX @ DEN".
    pub matchup: String,
    #[serde(rename = "wl")]
    pub outcome: Option<Outcome>,
    #[serde(rename = "pts")]
    pub points_for: i32,
    #[serde(rename = "pts_allowed")]
    pub points_against: i32,
}

impl GameRecord {
    pub fn margin(&self) -> i32 {
        self.points_for - self.points_against
    }
}

/// Rolling averages at one point of the game log. Derived on request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "game_date")]
    pub date: NaiveDate,
    #[serde(rename = "avg_pts")]
    pub avg_points_for: f64,
    #[serde(rename = "avg_pts_allowed")]
    pub avg_points_against: f64,
    #[serde(rename = "net_rating")]
    pub net_differential: f64,
}

// API Response types
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
