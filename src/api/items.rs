use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Item, ItemCreate, User, UserCreate};
use crate::AppState;

use super::timeout_query;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/:item_id", get(get_item))
        .route("/users", post(create_user).get(list_users))
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

#[tracing::instrument(name = "Create item", skip(state, payload))]
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemCreate>,
) -> Result<Json<Item>, AppError> {
    let AppState { db, .. } = state;

    let item = timeout_query(
        sqlx::query_as::<_, Item>(
            "INSERT INTO items (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .fetch_one(&db),
    )
    .await?;

    Ok(Json(item))
}

#[tracing::instrument(name = "List items", skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Item>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 500);

    let items = timeout_query(
        sqlx::query_as::<_, Item>("SELECT * FROM items ORDER BY id OFFSET $1 LIMIT $2")
            .bind(skip)
            .bind(limit)
            .fetch_all(&db),
    )
    .await?;

    Ok(Json(items))
}

#[tracing::instrument(name = "Get item", skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    let AppState { db, .. } = state;

    let item = timeout_query(
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(item_id)
            .fetch_optional(&db),
    )
    .await?
    .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

    Ok(Json(item))
}

#[tracing::instrument(name = "Create user", skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserCreate>,
) -> Result<Json<User>, AppError> {
    let AppState { db, .. } = state;

    let user = timeout_query(
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, full_name) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&payload.username)
        .bind(&payload.email)
        .bind(&payload.full_name)
        .fetch_one(&db),
    )
    .await
    .map_err(|err| match err {
        AppError::Conflict(_) => AppError::Conflict("Username or email already taken".to_string()),
        other => other,
    })?;

    Ok(Json(user))
}

#[tracing::instrument(name = "List users", skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<User>>, AppError> {
    let AppState { db, .. } = state;
    let skip = params.skip.unwrap_or(0).max(0);
    let limit = params.limit.unwrap_or(100).clamp(1, 500);

    let users = timeout_query(
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id OFFSET $1 LIMIT $2")
            .bind(skip)
            .bind(limit)
            .fetch_all(&db),
    )
    .await?;

    Ok(Json(users))
}
