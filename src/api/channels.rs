use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::{self, urls, ChannelImportReport};
use crate::models::{Channel, ChannelSummary};
use crate::AppState;

use super::timeout_query;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/channels", get(list_channels))
        .route("/channels/import", post(import_channel))
        .route("/channels/:channel_id", get(get_channel))
}

#[derive(Debug, Deserialize)]
pub struct ChannelListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelImportParams {
    pub rutube_channel_url: String,
    pub channel_videos_limit: Option<i64>,
    pub scan_playlists: Option<bool>,
    pub per_playlist_limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChannelImportResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: ChannelImportReport,
}

#[tracing::instrument(name = "List channels", skip(state))]
pub async fn list_channels(
    State(state): State<AppState>,
    Query(params): Query<ChannelListParams>,
) -> Result<Json<Vec<ChannelSummary>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 500);

    let channels = timeout_query(
        sqlx::query_as::<_, ChannelSummary>(
            r#"
            SELECT c.id, c.title, c.avatar_url,
                   COUNT(m.id) FILTER (WHERE m.is_active) AS videos_count
            FROM channels c
            LEFT JOIN movies m ON m.channel_id = c.id
            GROUP BY c.id
            ORDER BY c.id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&db),
    )
    .await?;

    Ok(Json(channels))
}

#[tracing::instrument(name = "Get channel", skip(state))]
pub async fn get_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<Channel>, AppError> {
    let AppState { db, .. } = state;

    let channel = timeout_query(
        sqlx::query_as::<_, Channel>("SELECT * FROM channels WHERE id = $1")
            .bind(channel_id)
            .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    Ok(Json(channel))
}

/// Imports a channel by its Rutube URL: metadata, optionally its latest
/// uploads, and optionally every playlist it owns.
#[tracing::instrument(name = "Import channel from Rutube", skip(state, params))]
pub async fn import_channel(
    State(state): State<AppState>,
    Query(params): Query<ChannelImportParams>,
) -> Result<Json<ChannelImportResponse>, AppError> {
    let rutube_channel_id = urls::parse_channel_url(&params.rutube_channel_url)?;
    let video_limit = params.channel_videos_limit.filter(|limit| *limit > 0);
    let scan_playlists = params.scan_playlists.unwrap_or(true);
    let per_playlist_limit = params.per_playlist_limit.unwrap_or(100).max(1);

    let report = ingest::import_channel(
        &state.db,
        state.source.as_ref(),
        &rutube_channel_id,
        &params.rutube_channel_url,
        video_limit,
        scan_playlists,
        per_playlist_limit,
    )
    .await?;

    Ok(Json(ChannelImportResponse {
        status: "ok",
        report,
    }))
}
