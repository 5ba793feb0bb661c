//! Backend for the Videoteka catalog: a CRUD API over movies, channels,
//! playlists and users, plus an ingestion pipeline that pulls video metadata
//! from the Rutube API and reconciles it into the catalog.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod models;

use std::sync::Arc;

use deadpool_redis::Pool as RedisPool;
use sqlx::PgPool;

pub use config::Settings;
pub use errors::AppError;

use crate::ingest::VideoSource;

/// Shared state handed to every HTTP handler.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: RedisPool,
    pub source: Arc<dyn VideoSource>,
    pub settings: Arc<Settings>,
}
