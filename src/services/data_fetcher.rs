use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ORIGIN, REFERER, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use crate::models::GameRecord;
use crate::services::teams::find_team_by_abbrev;
use crate::utils::{parse_game_date, validate_season};

const GAME_FINDER_RESULT_SET: &str = "LeagueGameFinderResults";
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE: Duration = Duration::from_secs(5);

// ── stats.nba.com structures ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFinderResponse {
    pub result_sets: Vec<ResultSet>,
}

/// Tabular payload: column names in `headers`, one JSON array per row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    #[serde(default)]
    pub name: String,
    pub headers: Vec<String>,
    pub row_set: Vec<Vec<Value>>,
}

impl ResultSet {
    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    fn required_column(&self, name: &str) -> Result<usize> {
        self.column(name)
            .ok_or_else(|| anyhow!("Game finder response has no {} column", name))
    }
}

fn cell<'a>(row: &'a [Value], idx: Option<usize>) -> Option<&'a Value> {
    idx.and_then(|i| row.get(i)).filter(|v| !v.is_null())
}

fn cell_string(row: &[Value], idx: Option<usize>) -> Option<String> {
    match cell(row, idx)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn cell_points(row: &[Value], idx: Option<usize>) -> Option<i32> {
    let value = cell(row, idx)?;
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).ok();
    }
    value.as_f64().map(|f| f.round() as i32)
}

/// Turn a league game finder payload into a date-ordered game log.
///
/// Points allowed come from `PTS_OPP` when the endpoint provides it, otherwise
/// from `PTS - PLUS_MINUS`. Rows where neither is available, or where the team
/// has no points yet (game not played), are skipped.
pub fn parse_game_finder(response: GameFinderResponse) -> Result<Vec<GameRecord>> {
    let set = response
        .result_sets
        .iter()
        .find(|s| s.name == GAME_FINDER_RESULT_SET)
        .or_else(|| response.result_sets.first())
        .ok_or_else(|| anyhow!("Game finder response contained no result sets"))?;

    let game_id = Some(set.required_column("GAME_ID")?);
    let game_date = Some(set.required_column("GAME_DATE")?);
    let matchup = Some(set.required_column("MATCHUP")?);
    let pts = Some(set.required_column("PTS")?);
    let wl = set.column("WL");
    let pts_opp = set.column("PTS_OPP");
    let plus_minus = set.column("PLUS_MINUS");

    let mut games = Vec::with_capacity(set.row_set.len());
    let mut skipped = 0usize;

    for row in &set.row_set {
        let Some(id) = cell_string(row, game_id) else {
            skipped += 1;
            continue;
        };

        let Some(points_for) = cell_points(row, pts) else {
            tracing::debug!("Game {} has no points yet, skipping", id);
            skipped += 1;
            continue;
        };

        let derived = cell_points(row, pts_opp).or_else(|| {
            cell_points(row, plus_minus).and_then(|pm| points_for.checked_sub(pm))
        });
        let Some(points_against) = derived else {
            tracing::warn!("Game {}: cannot derive points allowed, skipping", id);
            skipped += 1;
            continue;
        };

        let raw_date = cell_string(row, game_date).unwrap_or_default();
        let date = match parse_game_date(&raw_date) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Game {}: {}", id, e);
                skipped += 1;
                continue;
            }
        };

        let outcome = cell_string(row, wl).and_then(|s| s.parse().ok());

        games.push(GameRecord {
            id,
            date,
            matchup: cell_string(row, matchup).unwrap_or_default(),
            outcome,
            points_for,
            points_against,
        });
    }

    games.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    games.dedup_by(|a, b| a.id == b.id);

    if skipped > 0 {
        tracing::warn!("Skipped {} game finder rows", skipped);
    }

    Ok(games)
}

// ── DataFetcher ──────────────────────────────────────────────────────────────

pub struct DataFetcher {
    client: Client,
    base_url: String,
    retry_base: Duration,
}

impl DataFetcher {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::build(Client::builder(), base_url, RETRY_BASE)
    }

    /// Fetcher for a stats server on this machine: no proxy, millisecond backoff.
    #[cfg(test)]
    pub(crate) fn local(base_url: &str, retry_base: Duration) -> Result<Self> {
        Self::build(Client::builder().no_proxy(), base_url, retry_base)
    }

    fn build(builder: reqwest::ClientBuilder, base_url: &str, retry_base: Duration) -> Result<Self> {
        // stats.nba.com drops requests that don't look like they come from nba.com
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
            ),
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.nba.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.nba.com"));
        headers.insert("x-nba-stats-origin", HeaderValue::from_static("stats"));
        headers.insert("x-nba-stats-token", HeaderValue::from_static("true"));

        let client = builder
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_base,
        })
    }

    /// Fetch every regular season game for a team, e.g. ("PHX", "2024-25").
    pub async fn fetch_team_games(&self, team_abbrev: &str, season: &str) -> Result<Vec<GameRecord>> {
        let team = find_team_by_abbrev(team_abbrev)?;
        validate_season(season)?;

        tracing::info!("Fetching {} {} games from {}…", team.full_name, season, self.base_url);

        let url = format!("{}/stats/leaguegamefinder", self.base_url);
        let team_id = team.id.to_string();
        let params = [
            ("PlayerOrTeam", "T"),
            ("LeagueID", "00"),
            ("TeamID", team_id.as_str()),
            ("Season", season),
            ("SeasonType", "Regular Season"),
        ];

        // Retry up to 3 times on 429 with exponential backoff
        let data: GameFinderResponse = {
            let mut attempts = 0u32;
            loop {
                attempts += 1;
                let resp = self.client.get(&url).query(&params).send().await?;

                if resp.status() == 429 {
                    if attempts >= MAX_ATTEMPTS {
                        return Err(anyhow!("Stats API rate limit exceeded after {} attempts", attempts));
                    }
                    let wait = self.retry_base * 2u32.pow(attempts); // 10s, 20s
                    tracing::warn!("Stats API rate-limited, waiting {:?} (attempt {})", wait, attempts);
                    tokio::time::sleep(wait).await;
                    continue;
                }

                if !resp.status().is_success() {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(anyhow!("Game finder API error {}: {}", status, body));
                }

                break resp.json().await?;
            }
        };

        let games = parse_game_finder(data)?;
        tracing::info!("{} games fetched for {}", games.len(), team.abbreviation);
        Ok(games)
    }
}

/// In-process stand-in for the league game finder endpoint.
#[cfg(test)]
pub(crate) mod stats_stub {
    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone)]
    pub(crate) struct StatsStub {
        pub(crate) base_url: String,
        replies: Arc<Mutex<Vec<(StatusCode, Value)>>>,
        requests: Arc<Mutex<Vec<HashMap<String, String>>>>,
    }

    impl StatsStub {
        /// Query strings received so far, in order.
        pub(crate) fn requests(&self) -> Vec<HashMap<String, String>> {
            self.requests.lock().unwrap().clone()
        }
    }

    /// Two PHX games in the game finder's tabular shape.
    pub(crate) fn phx_payload() -> Value {
        json!({
            "resource": "leaguegamefinder",
            "resultSets": [{
                "name": "LeagueGameFinderResults",
                "headers": ["TEAM_ID", "GAME_ID", "GAME_DATE", "MATCHUP", "WL", "PTS", "PLUS_MINUS"],
                "rowSet": [
                    [1610612756, "0022400075", "2024-10-25", "PHX vs. LAL", "W", 109, 4],
                    [1610612756, "0022400061", "2024-10-23", "PHX @ LAC", "W", 116, 3],
                ]
            }]
        })
    }

    async fn game_finder(
        State(stub): State<StatsStub>,
        Query(params): Query<HashMap<String, String>>,
    ) -> (StatusCode, Json<Value>) {
        stub.requests.lock().unwrap().push(params);
        let mut replies = stub.replies.lock().unwrap();
        // the last reply repeats once the queue runs down
        let (status, body) = if replies.len() > 1 {
            replies.remove(0)
        } else {
            replies[0].clone()
        };
        (status, Json(body))
    }

    /// Serve `replies` in order from `127.0.0.1` on an ephemeral port.
    pub(crate) async fn spawn(replies: Vec<(StatusCode, Value)>) -> StatsStub {
        assert!(!replies.is_empty());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stub = StatsStub {
            base_url: format!("http://{}", listener.local_addr().unwrap()),
            replies: Arc::new(Mutex::new(replies)),
            requests: Arc::new(Mutex::new(Vec::new())),
        };

        let app = Router::new()
            .route("/stats/leaguegamefinder", get(game_finder))
            .with_state(stub.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        stub
    }
}
