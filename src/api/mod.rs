use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Settings;
use crate::db::{create_pool_with_url, get_games_ordered, init_database_with_pool};
use crate::models::{ApiResponse, GameRecord, MetricRecord};
use crate::services::{compute_rolling_metrics, MetricsError, WindowSize};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub default_window: WindowSize,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    BadRequest(#[from] MetricsError),
    #[error("invalid query: {}", .0.body_text())]
    InvalidQuery(#[from] QueryRejection),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

pub async fn serve(settings: &Settings, port: u16) -> anyhow::Result<()> {
    let pool = create_pool_with_url(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let app = create_router(AppState {
        pool,
        default_window: settings.default_window,
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Team metrics API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/games", get(get_games_handler))
        .route("/team_metrics", get(get_team_metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("Team metrics API is running"))
}

// GET /games - Full game log, oldest first
async fn get_games_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    let games = get_games_ordered(&state.pool).await?;
    Ok(Json(games))
}

// GET /team_metrics?window=5 - Rolling scoring averages over the game log
#[derive(Deserialize)]
struct TeamMetricsQuery {
    window: Option<String>,
}

async fn get_team_metrics_handler(
    State(state): State<AppState>,
    query: Result<Query<TeamMetricsQuery>, QueryRejection>,
) -> Result<Json<Vec<MetricRecord>>, ApiError> {
    let Query(params) = query?;
    let window = match params.window.as_deref() {
        Some(raw) => WindowSize::parse(raw)?,
        None => state.default_window,
    };

    let games = get_games_ordered(&state.pool).await?;
    Ok(Json(compute_rolling_metrics(&games, window)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{seed_demo_games, test_pool};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn app(seeded: bool) -> Router {
        let pool = test_pool().await;
        if seeded {
            seed_demo_games(&pool).await.unwrap();
        }
        create_router(AppState {
            pool,
            default_window: WindowSize::default(),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(app(false).await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn test_empty_database_returns_empty_arrays() {
        let (status, body) = get(app(false).await, "/games").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(vec![]));

        let (status, body) = get(app(false).await, "/team_metrics?window=3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_games_are_ordered_by_date() {
        let (status, body) = get(app(true).await, "/games").await;
        assert_eq!(status, StatusCode::OK);

        let games = body.as_array().unwrap();
        assert_eq!(games.len(), 12);
        assert_eq!(games[0]["game_date"], "2024-10-23");
        assert_eq!(games[0]["matchup"], "PHX @ LAC");
        assert_eq!(games[0]["pts_allowed"], 113);
        let dates: Vec<&str> = games.iter().map(|g| g["game_date"].as_str().unwrap()).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_team_metrics_window() {
        let (status, body) = get(app(true).await, "/team_metrics?window=2").await;
        assert_eq!(status, StatusCode::OK);

        let metrics = body.as_array().unwrap();
        assert_eq!(metrics.len(), 12);
        assert_eq!(metrics[0]["avg_pts"], 116.0);
        assert_eq!(metrics[1]["avg_pts"], 112.5);
        assert_eq!(metrics[1]["avg_pts_allowed"], 109.0);
        assert_eq!(metrics[1]["net_rating"], 3.5);
        assert_eq!(metrics[1]["game_date"], "2024-10-25");
    }

    #[tokio::test]
    async fn test_team_metrics_defaults_window() {
        let (_, defaulted) = get(app(true).await, "/team_metrics").await;
        let (_, explicit) = get(app(true).await, "/team_metrics?window=5").await;
        assert_eq!(defaulted, explicit);
    }

    #[tokio::test]
    async fn test_malformed_window_is_rejected() {
        for uri in [
            "/team_metrics?window=0",
            "/team_metrics?window=-2",
            "/team_metrics?window=abc",
            "/team_metrics?window=",
        ] {
            let (status, body) = get(app(true).await, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("window"));
        }
    }

    #[tokio::test]
    async fn test_unparseable_query_gets_error_envelope() {
        let (status, body) = get(app(true).await, "/team_metrics?window=3&window=4").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("window"));
    }

    #[tokio::test]
    async fn test_window_larger_than_any_season() {
        let (status, body) = get(app(true).await, "/team_metrics?window=1000000000000").await;
        assert_eq!(status, StatusCode::OK);

        let metrics = body.as_array().unwrap();
        assert_eq!(metrics.len(), 12);
        let (_, whole_log) = get(app(true).await, "/team_metrics?window=12").await;
        assert_eq!(body, whole_log);
    }
}
