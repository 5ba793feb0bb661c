//! HTTP layer: route tables and request handlers.

pub mod channels;
pub mod items;
pub mod movies;
pub mod playlists;
pub mod system;

use std::future::Future;
use std::time::Duration;

use axum::Router;

use crate::errors::AppError;
use crate::AppState;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds a database call so one stuck query cannot hold a request forever.
pub(crate) async fn timeout_query<T, F>(fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(DEFAULT_QUERY_TIMEOUT, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(AppError::from(err)),
        Err(elapsed) => Err(AppError::from(elapsed)),
    }
}

fn api_router() -> Router<AppState> {
    Router::new()
        .merge(system::router())
        .merge(movies::router())
        .merge(channels::router())
        .merge(playlists::router())
        .merge(items::router())
}

/// Full application router. The API surface is mounted both under `/api`
/// and at the root, matching what existing clients expect.
pub fn app_router(state: AppState) -> Router {
    let api = api_router();
    Router::new()
        .nest("/api", api.clone())
        .merge(api)
        .with_state(state)
}
