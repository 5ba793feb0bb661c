use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::{self, urls, PlaylistImportReport};
use crate::models::{Movie, PlaylistDetail, PlaylistSummary};
use crate::AppState;

use super::timeout_query;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/playlists", get(list_playlists))
        .route("/playlists/import", post(import_playlist))
        .route("/playlists/:playlist_id", get(get_playlist))
        .route("/playlists/:playlist_id/videos", get(list_playlist_videos))
}

#[derive(Debug, Deserialize)]
pub struct PlaylistListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistVideosParams {
    pub channel_id: Option<i64>,
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub order: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistImportRequest {
    pub rutube_playlist_url: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PlaylistImportResponse {
    pub status: &'static str,
    #[serde(flatten)]
    pub report: PlaylistImportReport,
}

#[tracing::instrument(name = "List playlists", skip(state))]
pub async fn list_playlists(
    State(state): State<AppState>,
    Query(params): Query<PlaylistListParams>,
) -> Result<Json<Vec<PlaylistSummary>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 500);

    let playlists = timeout_query(
        sqlx::query_as::<_, PlaylistSummary>(
            r#"
            SELECT p.id, p.title, p.image_url,
                   COUNT(m.id) FILTER (WHERE m.is_active) AS videos_count
            FROM playlists p
            LEFT JOIN playlist_movies pm ON pm.playlist_id = p.id
            LEFT JOIN movies m ON m.id = pm.movie_id
            GROUP BY p.id
            ORDER BY p.id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(skip)
        .bind(limit)
        .fetch_all(&db),
    )
    .await?;

    Ok(Json(playlists))
}

#[tracing::instrument(name = "Get playlist", skip(state))]
pub async fn get_playlist(
    State(state): State<AppState>,
    Path(playlist_id): Path<i64>,
) -> Result<Json<PlaylistDetail>, AppError> {
    let AppState { db, .. } = state;

    let playlist = timeout_query(
        sqlx::query_as::<_, PlaylistDetail>(
            r#"
            SELECT p.id, p.rutube_id, p.title, p.description, p.image_url,
                   p.is_active, p.created_at,
                   COUNT(m.id) FILTER (WHERE m.is_active) AS videos_count
            FROM playlists p
            LEFT JOIN playlist_movies pm ON pm.playlist_id = p.id
            LEFT JOIN movies m ON m.id = pm.movie_id
            WHERE p.id = $1
            GROUP BY p.id
            "#,
        )
        .bind(playlist_id)
        .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Playlist not found".to_string()))?;

    Ok(Json(playlist))
}

/// Videos of one playlist, newest first by default, optionally narrowed
/// to a single channel.
#[tracing::instrument(name = "List playlist videos", skip(state))]
pub async fn list_playlist_videos(
    State(state): State<AppState>,
    Path(playlist_id): Path<i64>,
    Query(params): Query<PlaylistVideosParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(24).clamp(1, 100);

    let exists = timeout_query(
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM playlists WHERE id = $1)")
            .bind(playlist_id)
            .fetch_one(&db),
    )
    .await?;
    if !exists {
        return Err(AppError::NotFound("Playlist not found".to_string()));
    }

    let order_clause = match params.order.as_deref() {
        Some("-channel_added_at") | None => "ORDER BY m.channel_added_at DESC NULLS LAST",
        Some("channel_added_at") => "ORDER BY m.channel_added_at ASC NULLS LAST",
        _ => "ORDER BY m.id",
    };
    let sql = format!(
        r#"
        SELECT m.*
        FROM movies m
        INNER JOIN playlist_movies pm ON pm.movie_id = m.id
        WHERE pm.playlist_id = $1
          AND m.is_active = TRUE
          AND ($2::bigint IS NULL OR m.channel_id = $2)
        {}
        OFFSET $3 LIMIT $4
        "#,
        order_clause
    );

    let movies = timeout_query(
        sqlx::query_as::<_, Movie>(&sql)
            .bind(playlist_id)
            .bind(params.channel_id)
            .bind(skip)
            .bind(limit)
            .fetch_all(&db),
    )
    .await?;

    Ok(Json(movies))
}

/// Imports a playlist by its Rutube URL and links its videos.
#[tracing::instrument(name = "Import playlist from Rutube", skip(state, payload))]
pub async fn import_playlist(
    State(state): State<AppState>,
    Json(payload): Json<PlaylistImportRequest>,
) -> Result<Json<PlaylistImportResponse>, AppError> {
    let rutube_playlist_id = urls::parse_playlist_url(&payload.rutube_playlist_url)?;
    let limit = payload.limit.unwrap_or(100).max(1);

    let report = ingest::import_playlist(
        &state.db,
        state.source.as_ref(),
        &rutube_playlist_id,
        &payload.rutube_playlist_url,
        limit,
    )
    .await?;

    Ok(Json(PlaylistImportResponse {
        status: "ok",
        report,
    }))
}
