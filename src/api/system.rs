use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use deadpool_redis::redis::AsyncCommands;
use serde::Serialize;

use crate::errors::AppError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/counter", get(counter))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub redis: String,
    pub database: String,
}

#[derive(Debug, Serialize)]
pub struct CounterResponse {
    pub counter: i64,
}

/// Liveness endpoint that also reports whether Postgres and Redis answer.
/// Always responds 200; broken dependencies show up in the body.
#[tracing::instrument(name = "Health check", skip(state))]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let AppState { db, redis, .. } = state;

    let database = match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&db).await {
        Ok(_) => "ok".to_string(),
        Err(err) => format!("error: {}", err),
    };

    let redis = match redis.get().await {
        Ok(mut conn) => {
            let pong: Result<String, _> =
                deadpool_redis::redis::cmd("PING").query_async(&mut conn).await;
            match pong {
                Ok(_) => "ok".to_string(),
                Err(err) => format!("error: {}", err),
            }
        }
        Err(err) => format!("error: {}", err),
    };

    Json(HealthResponse {
        status: "ok",
        redis,
        database,
    })
}

/// Demo endpoint backed by a Redis counter.
#[tracing::instrument(name = "Counter", skip(state))]
pub async fn counter(State(state): State<AppState>) -> Result<Json<CounterResponse>, AppError> {
    let mut conn = state.redis.get().await.map_err(anyhow::Error::new)?;
    let counter: i64 = conn.incr("counter", 1).await.map_err(anyhow::Error::new)?;
    Ok(Json(CounterResponse { counter }))
}
