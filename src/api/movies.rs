use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::{self, UNKNOWN_CHANNEL_KEY, UNKNOWN_CHANNEL_TITLE};
use crate::models::{Movie, MovieCreate, MovieUpdate};
use crate::AppState;

use super::timeout_query;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/movies", post(create_movie).get(list_movies))
        .route(
            "/movies/:movie_id",
            get(get_movie).put(update_movie).delete(delete_movie),
        )
        .route("/movies/year/:year", get(list_movies_by_year))
        .route("/movies/genre/:genre", get(list_movies_by_genre))
        .route("/movies/:movie_id/increment-views", post(increment_views))
        .route("/scrape/rutube", post(trigger_scrape))
}

#[derive(Debug, Deserialize)]
pub struct MovieListParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScrapeParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub status: &'static str,
    pub scraped: usize,
}

#[derive(Debug, Serialize)]
pub struct ViewsResponse {
    pub views: i64,
}

#[tracing::instrument(name = "Create movie", skip(state, payload))]
pub async fn create_movie(
    State(state): State<AppState>,
    Json(payload): Json<MovieCreate>,
) -> Result<Json<Movie>, AppError> {
    let AppState { db, .. } = state;

    let channel_id = match payload.channel_id {
        Some(id) => {
            let exists = timeout_query(
                sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM channels WHERE id = $1)")
                    .bind(id)
                    .fetch_one(&db),
            )
            .await?;
            if !exists {
                return Err(AppError::Validation(format!("Channel {} does not exist", id)));
            }
            id
        }
        // Movies never live without a channel; adopt the placeholder.
        None => {
            timeout_query(
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO channels (rutube_id, title)
                    VALUES ($1, $2)
                    ON CONFLICT (rutube_id) DO UPDATE SET title = channels.title
                    RETURNING id
                    "#,
                )
                .bind(UNKNOWN_CHANNEL_KEY)
                .bind(UNKNOWN_CHANNEL_TITLE)
                .fetch_one(&db),
            )
            .await?
        }
    };

    let movie = timeout_query(
        sqlx::query_as::<_, Movie>(
            r#"
            INSERT INTO movies (
                title, year, image_url, thumbnail_url, views, source_url, duration,
                description, genre, rating, is_active, channel_id, rutube_video_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(&payload.title)
        .bind(payload.year)
        .bind(&payload.image_url)
        .bind(&payload.thumbnail_url)
        .bind(payload.views.unwrap_or(0))
        .bind(&payload.source_url)
        .bind(&payload.duration)
        .bind(&payload.description)
        .bind(&payload.genre)
        .bind(payload.rating)
        .bind(payload.is_active.unwrap_or(true))
        .bind(channel_id)
        .bind(&payload.rutube_video_id)
        .fetch_one(&db),
    )
    .await?;

    Ok(Json(movie))
}

#[tracing::instrument(name = "List movies", skip(state))]
pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<MovieListParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let is_active = params.is_active.unwrap_or(true);

    let movies = timeout_query(
        sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE is_active = $1 ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(is_active)
        .bind(skip)
        .bind(limit)
        .fetch_all(&db),
    )
    .await?;

    Ok(Json(movies))
}

#[tracing::instrument(name = "Get movie", skip(state))]
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<Movie>, AppError> {
    let AppState { db, .. } = state;

    let movie = timeout_query(
        sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = $1")
            .bind(movie_id)
            .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    Ok(Json(movie))
}

#[tracing::instrument(name = "Update movie", skip(state, payload))]
pub async fn update_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
    Json(payload): Json<MovieUpdate>,
) -> Result<Json<Movie>, AppError> {
    let AppState { db, .. } = state;

    let movie = timeout_query(
        sqlx::query_as::<_, Movie>(
            r#"
            UPDATE movies SET
                title = COALESCE($2, title),
                year = COALESCE($3, year),
                image_url = COALESCE($4, image_url),
                thumbnail_url = COALESCE($5, thumbnail_url),
                views = COALESCE($6, views),
                source_url = COALESCE($7, source_url),
                duration = COALESCE($8, duration),
                description = COALESCE($9, description),
                genre = COALESCE($10, genre),
                rating = COALESCE($11, rating),
                is_active = COALESCE($12, is_active),
                channel_added_at = COALESCE($13, channel_added_at),
                channel_id = COALESCE($14, channel_id),
                rutube_video_id = COALESCE($15, rutube_video_id)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(movie_id)
        .bind(&payload.title)
        .bind(payload.year)
        .bind(&payload.image_url)
        .bind(&payload.thumbnail_url)
        .bind(payload.views)
        .bind(&payload.source_url)
        .bind(&payload.duration)
        .bind(&payload.description)
        .bind(&payload.genre)
        .bind(payload.rating)
        .bind(payload.is_active)
        .bind(payload.channel_added_at)
        .bind(payload.channel_id)
        .bind(&payload.rutube_video_id)
        .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    Ok(Json(movie))
}

/// Soft delete: flips `is_active` off and returns the hidden movie.
#[tracing::instrument(name = "Delete movie", skip(state))]
pub async fn delete_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<Movie>, AppError> {
    let AppState { db, .. } = state;

    let movie = timeout_query(
        sqlx::query_as::<_, Movie>(
            "UPDATE movies SET is_active = FALSE WHERE id = $1 RETURNING *",
        )
        .bind(movie_id)
        .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    Ok(Json(movie))
}

#[tracing::instrument(name = "List movies by year", skip(state))]
pub async fn list_movies_by_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(10).clamp(1, 100);

    let movies = timeout_query(
        sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE year = $1 AND is_active = TRUE ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(year)
        .bind(skip)
        .bind(limit)
        .fetch_all(&db),
    )
    .await?;

    Ok(Json(movies))
}

#[tracing::instrument(name = "List movies by genre", skip(state))]
pub async fn list_movies_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Movie>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 100);

    let movies = timeout_query(
        sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE genre = $1 AND is_active = TRUE ORDER BY id OFFSET $2 LIMIT $3",
        )
        .bind(&genre)
        .bind(skip)
        .bind(limit)
        .fetch_all(&db),
    )
    .await?;

    Ok(Json(movies))
}

#[tracing::instrument(name = "Increment movie views", skip(state))]
pub async fn increment_views(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> Result<Json<ViewsResponse>, AppError> {
    let AppState { db, .. } = state;

    let views = timeout_query(
        sqlx::query_scalar::<_, i64>(
            "UPDATE movies SET views = views + 1 WHERE id = $1 RETURNING views",
        )
        .bind(movie_id)
        .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    Ok(Json(ViewsResponse { views }))
}

/// Fetches the configured channel's latest uploads into the catalog.
#[tracing::instrument(name = "Trigger Rutube scrape", skip(state))]
pub async fn trigger_scrape(
    State(state): State<AppState>,
    Query(params): Query<ScrapeParams>,
) -> Result<Json<ScrapeResponse>, AppError> {
    let limit = params.limit.unwrap_or(100).max(1);
    let scraped = ingest::run_channel_scrape(
        &state.db,
        state.source.as_ref(),
        &state.settings.rutube_channel_id,
        limit,
    )
    .await?;

    Ok(Json(ScrapeResponse {
        status: "ok",
        scraped,
    }))
}
