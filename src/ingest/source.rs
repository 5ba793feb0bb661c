//! HTTP client for the public Rutube API.
//!
//! Fetch failures degrade rather than abort: a page that cannot be
//! retrieved ends the walk and whatever was collected so far is returned.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::Result;

pub const RUTUBE_API_BASE: &str = "https://rutube.ru/api";

const PAGE_SIZE: i64 = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_DELAY: Duration = Duration::from_millis(500);

/// One video as fetched from the source, before normalization.
#[derive(Debug, Clone)]
pub struct RawVideo {
    /// Platform identifier; legacy records may lack it.
    pub video_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<i64>,
    pub views: i64,
    pub published_at: Option<String>,
    pub category: String,
    pub video_url: String,
    pub channel_rutube_id: Option<String>,
    pub channel_title: Option<String>,
    pub channel_avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawChannel {
    pub channel_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RawPlaylist {
    pub playlist_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// Read-only view of a video platform.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn channel_videos(&self, channel_id: &str, limit: i64) -> Result<Vec<RawVideo>>;

    async fn playlist_videos(&self, playlist_id: &str, limit: i64) -> Result<Vec<RawVideo>>;

    async fn channel_playlists(&self, channel_id: &str) -> Result<Vec<RawPlaylist>>;

    async fn channel_info(&self, channel_id: &str) -> Result<Option<RawChannel>>;

    async fn playlist_info(&self, playlist_id: &str) -> Result<Option<RawPlaylist>>;
}

pub struct RutubeClient {
    base_url: String,
    http: Client,
}

impl RutubeClient {
    pub fn new() -> Self {
        Self::with_base_url(RUTUBE_API_BASE)
    }

    pub fn with_base_url(base_url: &str) -> Self {
        RutubeClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Walks one listing endpoint page by page until `limit` videos are
    /// collected or a page comes back empty. Returns `None` when the very
    /// first page fails, so the caller can try an alternate endpoint shape.
    async fn collect_video_pages(&self, path: &str, limit: i64) -> Option<Vec<RawVideo>> {
        let mut videos: Vec<RawVideo> = Vec::new();
        let mut page = 1i64;

        while (videos.len() as i64) < limit {
            let url = format!(
                "{}{}?page={}&page_size={}",
                self.base_url, path, page, PAGE_SIZE
            );
            let results = match self.fetch_results_page(&url).await {
                Some(results) => results,
                None if page == 1 => return None,
                None => break,
            };
            if results.is_empty() {
                break;
            }
            for item in &results {
                if videos.len() as i64 >= limit {
                    break;
                }
                videos.push(raw_video_from_json(item));
            }
            page += 1;
            sleep(PAGE_DELAY).await;
        }

        Some(videos)
    }

    /// Fetches one page of a paginated listing and returns its `results`
    /// array, or `None` when the page could not be retrieved.
    async fn fetch_results_page(&self, url: &str) -> Option<Vec<Value>> {
        let response = match self.http.get(url).timeout(REQUEST_TIMEOUT).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Rutube request failed for {}: {}", url, err);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("Rutube API returned {} for {}", response.status(), url);
            return None;
        }
        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(err) => {
                warn!("Failed to decode Rutube response for {}: {}", url, err);
                return None;
            }
        };
        Some(
            data.get("results")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        )
    }

    async fn fetch_json(&self, url: &str) -> Option<Value> {
        let response = match self.http.get(url).timeout(REQUEST_TIMEOUT).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("Rutube request failed for {}: {}", url, err);
                return None;
            }
        };
        if !response.status().is_success() {
            debug!("Rutube API returned {} for {}", response.status(), url);
            return None;
        }
        response.json().await.ok()
    }
}

impl Default for RutubeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VideoSource for RutubeClient {
    async fn channel_videos(&self, channel_id: &str, limit: i64) -> Result<Vec<RawVideo>> {
        let path = format!("/video/person/{}/", channel_id);
        Ok(self
            .collect_video_pages(&path, limit)
            .await
            .unwrap_or_default())
    }

    async fn playlist_videos(&self, playlist_id: &str, limit: i64) -> Result<Vec<RawVideo>> {
        // Playlist listings moved between endpoint shapes over time; try the
        // current one first and fall back to the older one.
        let paths = [
            format!("/playlist/video/{}/", playlist_id),
            format!("/metainfo/playlist/{}/video/", playlist_id),
        ];
        for path in &paths {
            if let Some(videos) = self.collect_video_pages(path, limit).await {
                return Ok(videos);
            }
        }
        Ok(Vec::new())
    }

    async fn channel_playlists(&self, channel_id: &str) -> Result<Vec<RawPlaylist>> {
        let mut playlists = Vec::new();
        let mut page = 1i64;
        loop {
            let url = format!(
                "{}/playlist/person/{}/?page={}&page_size={}",
                self.base_url, channel_id, page, PAGE_SIZE
            );
            let results = match self.fetch_results_page(&url).await {
                Some(results) => results,
                None => break,
            };
            if results.is_empty() {
                break;
            }
            for item in &results {
                playlists.push(raw_playlist_from_json(item));
            }
            page += 1;
            sleep(PAGE_DELAY).await;
        }
        Ok(playlists)
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Option<RawChannel>> {
        let url = format!("{}/profile/user/{}/", self.base_url, channel_id);
        let data = match self.fetch_json(&url).await {
            Some(data) => data,
            None => return Ok(None),
        };
        Ok(Some(RawChannel {
            channel_id: channel_id.to_string(),
            title: string_field(&data, "name"),
            description: string_field(&data, "description"),
            avatar_url: string_field(&data, "avatar_url"),
        }))
    }

    async fn playlist_info(&self, playlist_id: &str) -> Result<Option<RawPlaylist>> {
        let url = format!("{}/playlist/{}/", self.base_url, playlist_id);
        let data = match self.fetch_json(&url).await {
            Some(data) => data,
            None => return Ok(None),
        };
        Ok(Some(RawPlaylist {
            playlist_id: playlist_id.to_string(),
            title: string_field(&data, "title"),
            description: string_field(&data, "description"),
            thumbnail_url: string_field(&data, "thumbnail_url"),
        }))
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn id_field(value: &Value) -> Option<String> {
    match value.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Some(id.clone()),
        Some(Value::Number(id)) => Some(id.to_string()),
        _ => None,
    }
}

fn raw_video_from_json(item: &Value) -> RawVideo {
    let video_id = id_field(item);
    let video_url = match &video_id {
        Some(id) => format!("https://rutube.ru/video/{}/", id),
        None => String::new(),
    };
    let author = item.get("author");
    RawVideo {
        title: string_field(item, "title").unwrap_or_default(),
        description: string_field(item, "description"),
        thumbnail_url: string_field(item, "thumbnail_url"),
        duration_secs: item.get("duration").and_then(Value::as_i64),
        views: item.get("hits").and_then(Value::as_i64).unwrap_or(0),
        published_at: string_field(item, "created_ts"),
        category: item
            .get("category")
            .and_then(|category| category.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("Видео")
            .to_string(),
        video_id,
        video_url,
        channel_rutube_id: author.and_then(id_field),
        channel_title: author.and_then(|a| string_field(a, "name")),
        channel_avatar_url: author.and_then(|a| string_field(a, "avatar_url")),
    }
}

fn raw_playlist_from_json(item: &Value) -> RawPlaylist {
    RawPlaylist {
        playlist_id: id_field(item).unwrap_or_default(),
        title: string_field(item, "title"),
        description: string_field(item, "description"),
        thumbnail_url: string_field(item, "thumbnail_url"),
    }
}
