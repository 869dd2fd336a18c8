use anyhow::{anyhow, Result};
use std::env;

use crate::services::metrics::WindowSize;
use crate::utils::season_for_date;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/nba_team.db";
pub const DEFAULT_NBA_STATS_BASE_URL: &str = "https://stats.nba.com";

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub team_abbrev: String,
    pub season: String,
    pub default_window: WindowSize,
    pub nba_stats_base_url: String,
    pub port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            team_abbrev: "PHX".to_string(),
            season: season_for_date(chrono::Local::now().date_naive()),
            default_window: WindowSize::default(),
            nba_stats_base_url: DEFAULT_NBA_STATS_BASE_URL.to_string(),
            port: 8000,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let default_window = match lookup("DEFAULT_WINDOW") {
            Some(raw) => WindowSize::parse(&raw).map_err(|e| anyhow!("DEFAULT_WINDOW: {}", e))?,
            None => defaults.default_window,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("PORT must be a valid port number, got '{}'", raw))?,
            None => defaults.port,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            team_abbrev: lookup("TEAM_ABBREV").unwrap_or(defaults.team_abbrev),
            season: lookup("SEASON").unwrap_or(defaults.season),
            default_window,
            nba_stats_base_url: lookup("NBA_STATS_BASE_URL").unwrap_or(defaults.nba_stats_base_url),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(vars: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.team_abbrev, "PHX");
        assert_eq!(settings.season, season_for_date(chrono::Local::now().date_naive()));
        assert_eq!(settings.default_window.get(), 5);
        assert_eq!(settings.port, 8000);
    }

    #[test]
    fn test_overrides() {
        let settings = settings_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("TEAM_ABBREV", "BOS"),
            ("DEFAULT_WINDOW", "10"),
            ("PORT", "3000"),
        ])
        .unwrap();
        assert_eq!(settings.database_url, "sqlite::memory:");
        assert_eq!(settings.team_abbrev, "BOS");
        assert_eq!(settings.default_window.get(), 10);
        assert_eq!(settings.port, 3000);
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(settings_from(&[("DEFAULT_WINDOW", "0")]).is_err());
        assert!(settings_from(&[("PORT", "http")]).is_err());
    }
}
