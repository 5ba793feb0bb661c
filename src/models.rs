use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub year: i32,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: i64,
    pub added_at: DateTime<Utc>,
    pub channel_added_at: Option<DateTime<Utc>>,
    pub source_url: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub channel_id: i64,
    pub rutube_video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MovieCreate {
    pub title: String,
    pub year: i32,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: Option<i64>,
    pub source_url: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
    pub channel_id: Option<i64>,
    pub rutube_video_id: Option<String>,
}

/// Partial update: absent fields keep their stored values.
#[derive(Debug, Deserialize)]
pub struct MovieUpdate {
    pub title: Option<String>,
    pub year: Option<i32>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub views: Option<i64>,
    pub source_url: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub is_active: Option<bool>,
    pub channel_added_at: Option<DateTime<Utc>>,
    pub channel_id: Option<i64>,
    pub rutube_video_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Channel {
    pub id: i64,
    pub rutube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Reduced shape used by the channel listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChannelSummary {
    pub id: i64,
    pub title: String,
    pub avatar_url: Option<String>,
    pub videos_count: i64,
}

/// Reduced shape used by the playlist listing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlaylistSummary {
    pub id: i64,
    pub title: String,
    pub image_url: Option<String>,
    pub videos_count: i64,
}

/// Full playlist row plus its active video count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PlaylistDetail {
    pub id: i64,
    pub rutube_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub videos_count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ItemCreate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}
