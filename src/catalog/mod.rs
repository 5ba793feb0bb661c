//! Storage boundary for the reconciliation engine.
//!
//! A [`CatalogStore`] is a unit of work: every call runs inside one pending
//! transaction, writes become visible to later calls in the same run, and
//! nothing is durable until [`CatalogStore::commit`].

pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

pub use postgres::PgCatalog;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("transaction already finished")]
    Finished,
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ChannelRecord {
    pub id: i64,
    pub rutube_id: String,
    pub title: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct PlaylistRecord {
    pub id: i64,
    pub rutube_id: String,
    pub title: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct MovieRecord {
    pub id: i64,
    pub title: String,
    pub rutube_video_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ChannelFields {
    pub rutube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlaylistFields {
    pub rutube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MovieFields {
    pub title: String,
    pub year: i32,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: i64,
    pub duration: String,
    pub description: Option<String>,
    pub genre: String,
    pub source_url: String,
    pub channel_added_at: Option<DateTime<Utc>>,
    pub channel_id: i64,
    pub rutube_video_id: Option<String>,
}

/// One reconciliation run's view of the catalog.
///
/// `update_movie` refreshes the mutable fields of an existing row; the
/// release year, the local creation timestamp and the active flag keep
/// their stored values.
#[async_trait]
pub trait CatalogStore: Send {
    async fn channel_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<ChannelRecord>, CatalogError>;

    async fn insert_channel(&mut self, fields: &ChannelFields) -> Result<i64, CatalogError>;

    async fn update_channel_meta(
        &mut self,
        id: i64,
        fields: &ChannelFields,
    ) -> Result<(), CatalogError>;

    async fn playlist_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<PlaylistRecord>, CatalogError>;

    async fn insert_playlist(&mut self, fields: &PlaylistFields) -> Result<i64, CatalogError>;

    async fn update_playlist_meta(
        &mut self,
        id: i64,
        fields: &PlaylistFields,
    ) -> Result<(), CatalogError>;

    async fn movie_by_rutube_video_id(
        &mut self,
        rutube_video_id: &str,
    ) -> Result<Option<MovieRecord>, CatalogError>;

    async fn movie_by_source_url(
        &mut self,
        source_url: &str,
    ) -> Result<Option<MovieRecord>, CatalogError>;

    async fn insert_movie(&mut self, fields: &MovieFields) -> Result<i64, CatalogError>;

    async fn update_movie(&mut self, id: i64, fields: &MovieFields) -> Result<(), CatalogError>;

    async fn movie_linked_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<bool, CatalogError>;

    async fn link_movie_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<(), CatalogError>;

    async fn commit(&mut self) -> Result<(), CatalogError>;
}
