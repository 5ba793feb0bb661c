#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use api_videoteka::catalog::{
    CatalogError, CatalogStore, ChannelFields, ChannelRecord, MovieFields, MovieRecord,
    PlaylistFields, PlaylistRecord,
};
use api_videoteka::ingest::{IngestError, RawChannel, RawPlaylist, RawVideo, VideoSource};

/// In-memory [`CatalogStore`] mirroring the uniqueness rules of the real
/// schema, so engine tests catch duplicate writes.
#[derive(Default)]
pub struct MemoryCatalog {
    next_id: i64,
    pub channels: HashMap<i64, ChannelFields>,
    pub playlists: HashMap<i64, PlaylistFields>,
    pub movies: HashMap<i64, MovieFields>,
    pub links: HashSet<(i64, i64)>,
    pub committed: bool,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        MemoryCatalog::default()
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn channel_id_by_key(&self, rutube_id: &str) -> Option<i64> {
        self.channels
            .iter()
            .find(|(_, fields)| fields.rutube_id == rutube_id)
            .map(|(id, _)| *id)
    }

    pub fn playlist_id_by_key(&self, rutube_id: &str) -> Option<i64> {
        self.playlists
            .iter()
            .find(|(_, fields)| fields.rutube_id == rutube_id)
            .map(|(id, _)| *id)
    }

    pub fn movie_by_external_id(&self, rutube_video_id: &str) -> Option<&MovieFields> {
        self.movies
            .values()
            .find(|fields| fields.rutube_video_id.as_deref() == Some(rutube_video_id))
    }

    pub fn links_of_playlist(&self, playlist_id: i64) -> usize {
        self.links
            .iter()
            .filter(|(linked_playlist, _)| *linked_playlist == playlist_id)
            .count()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn channel_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<ChannelRecord>, CatalogError> {
        Ok(self.channels.iter().find_map(|(id, fields)| {
            (fields.rutube_id == rutube_id).then(|| ChannelRecord {
                id: *id,
                rutube_id: fields.rutube_id.clone(),
                title: fields.title.clone(),
            })
        }))
    }

    async fn insert_channel(&mut self, fields: &ChannelFields) -> Result<i64, CatalogError> {
        if self.channel_id_by_key(&fields.rutube_id).is_some() {
            return Err(CatalogError::Storage(format!(
                "duplicate channel key {}",
                fields.rutube_id
            )));
        }
        let id = self.next_id();
        self.channels.insert(id, fields.clone());
        Ok(id)
    }

    async fn update_channel_meta(
        &mut self,
        id: i64,
        fields: &ChannelFields,
    ) -> Result<(), CatalogError> {
        let existing = self
            .channels
            .get_mut(&id)
            .ok_or_else(|| CatalogError::Storage(format!("channel {} missing", id)))?;
        *existing = fields.clone();
        Ok(())
    }

    async fn playlist_by_rutube_id(
        &mut self,
        rutube_id: &str,
    ) -> Result<Option<PlaylistRecord>, CatalogError> {
        Ok(self.playlists.iter().find_map(|(id, fields)| {
            (fields.rutube_id == rutube_id).then(|| PlaylistRecord {
                id: *id,
                rutube_id: fields.rutube_id.clone(),
                title: fields.title.clone(),
            })
        }))
    }

    async fn insert_playlist(&mut self, fields: &PlaylistFields) -> Result<i64, CatalogError> {
        if self.playlist_id_by_key(&fields.rutube_id).is_some() {
            return Err(CatalogError::Storage(format!(
                "duplicate playlist key {}",
                fields.rutube_id
            )));
        }
        let id = self.next_id();
        self.playlists.insert(id, fields.clone());
        Ok(id)
    }

    async fn update_playlist_meta(
        &mut self,
        id: i64,
        fields: &PlaylistFields,
    ) -> Result<(), CatalogError> {
        let existing = self
            .playlists
            .get_mut(&id)
            .ok_or_else(|| CatalogError::Storage(format!("playlist {} missing", id)))?;
        *existing = fields.clone();
        Ok(())
    }

    async fn movie_by_rutube_video_id(
        &mut self,
        rutube_video_id: &str,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        Ok(self.movies.iter().find_map(|(id, fields)| {
            (fields.rutube_video_id.as_deref() == Some(rutube_video_id)).then(|| MovieRecord {
                id: *id,
                title: fields.title.clone(),
                rutube_video_id: fields.rutube_video_id.clone(),
            })
        }))
    }

    async fn movie_by_source_url(
        &mut self,
        source_url: &str,
    ) -> Result<Option<MovieRecord>, CatalogError> {
        Ok(self.movies.iter().find_map(|(id, fields)| {
            (fields.source_url == source_url).then(|| MovieRecord {
                id: *id,
                title: fields.title.clone(),
                rutube_video_id: fields.rutube_video_id.clone(),
            })
        }))
    }

    async fn insert_movie(&mut self, fields: &MovieFields) -> Result<i64, CatalogError> {
        if let Some(rutube_video_id) = &fields.rutube_video_id {
            let duplicate = self
                .movies
                .values()
                .any(|existing| existing.rutube_video_id.as_deref() == Some(rutube_video_id));
            if duplicate {
                return Err(CatalogError::Storage(format!(
                    "duplicate movie key {}",
                    rutube_video_id
                )));
            }
        }
        if !self.channels.contains_key(&fields.channel_id) {
            return Err(CatalogError::Storage(format!(
                "channel {} missing for movie {}",
                fields.channel_id, fields.title
            )));
        }
        let id = self.next_id();
        self.movies.insert(id, fields.clone());
        Ok(id)
    }

    async fn update_movie(&mut self, id: i64, fields: &MovieFields) -> Result<(), CatalogError> {
        let existing = self
            .movies
            .get_mut(&id)
            .ok_or_else(|| CatalogError::Storage(format!("movie {} missing", id)))?;
        let year = existing.year;
        *existing = fields.clone();
        existing.year = year;
        Ok(())
    }

    async fn movie_linked_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<bool, CatalogError> {
        Ok(self.links.contains(&(playlist_id, movie_id)))
    }

    async fn link_movie_to_playlist(
        &mut self,
        playlist_id: i64,
        movie_id: i64,
    ) -> Result<(), CatalogError> {
        if !self.links.insert((playlist_id, movie_id)) {
            return Err(CatalogError::Storage(format!(
                "duplicate link {}/{}",
                playlist_id, movie_id
            )));
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), CatalogError> {
        self.committed = true;
        Ok(())
    }
}

/// [`VideoSource`] replaying scripted responses; `Err` entries inject
/// fetch failures.
#[derive(Default)]
pub struct ScriptedSource {
    channel_videos: HashMap<String, Vec<RawVideo>>,
    playlist_videos: HashMap<String, Result<Vec<RawVideo>, String>>,
    channel_playlists: HashMap<String, Vec<RawPlaylist>>,
    channel_infos: HashMap<String, RawChannel>,
    playlist_infos: HashMap<String, RawPlaylist>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        ScriptedSource::default()
    }

    pub fn with_channel_videos(mut self, channel_id: &str, videos: Vec<RawVideo>) -> Self {
        self.channel_videos.insert(channel_id.to_string(), videos);
        self
    }

    pub fn with_playlist(mut self, playlist_id: &str, videos: Vec<RawVideo>) -> Self {
        self.playlist_videos
            .insert(playlist_id.to_string(), Ok(videos));
        self
    }

    pub fn with_failing_playlist(mut self, playlist_id: &str, message: &str) -> Self {
        self.playlist_videos
            .insert(playlist_id.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_channel_playlists(mut self, channel_id: &str, playlists: Vec<RawPlaylist>) -> Self {
        self.channel_playlists
            .insert(channel_id.to_string(), playlists);
        self
    }

    pub fn with_channel_info(mut self, info: RawChannel) -> Self {
        self.channel_infos.insert(info.channel_id.clone(), info);
        self
    }

    pub fn with_playlist_info(mut self, info: RawPlaylist) -> Self {
        self.playlist_infos.insert(info.playlist_id.clone(), info);
        self
    }
}

#[async_trait]
impl VideoSource for ScriptedSource {
    async fn channel_videos(
        &self,
        channel_id: &str,
        limit: i64,
    ) -> Result<Vec<RawVideo>, IngestError> {
        let mut videos = self
            .channel_videos
            .get(channel_id)
            .cloned()
            .unwrap_or_default();
        videos.truncate(limit.max(0) as usize);
        Ok(videos)
    }

    async fn playlist_videos(
        &self,
        playlist_id: &str,
        limit: i64,
    ) -> Result<Vec<RawVideo>, IngestError> {
        match self.playlist_videos.get(playlist_id) {
            Some(Ok(videos)) => {
                let mut videos = videos.clone();
                videos.truncate(limit.max(0) as usize);
                Ok(videos)
            }
            Some(Err(message)) => Err(IngestError::Source(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn channel_playlists(&self, channel_id: &str) -> Result<Vec<RawPlaylist>, IngestError> {
        Ok(self
            .channel_playlists
            .get(channel_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Option<RawChannel>, IngestError> {
        Ok(self.channel_infos.get(channel_id).cloned())
    }

    async fn playlist_info(&self, playlist_id: &str) -> Result<Option<RawPlaylist>, IngestError> {
        Ok(self.playlist_infos.get(playlist_id).cloned())
    }
}

pub fn sample_video(video_id: &str, title: &str) -> RawVideo {
    RawVideo {
        video_id: Some(video_id.to_string()),
        title: title.to_string(),
        description: Some(format!("Описание: {}", title)),
        thumbnail_url: Some(format!("https://pic.rutube.ru/{}.jpg", video_id)),
        duration_secs: Some(300),
        views: 100,
        published_at: Some("2024-03-10T12:00:00Z".to_string()),
        category: "Видео".to_string(),
        video_url: format!("https://rutube.ru/video/{}/", video_id),
        channel_rutube_id: None,
        channel_title: None,
        channel_avatar_url: None,
    }
}

pub fn sample_video_from(video_id: &str, title: &str, channel_rutube_id: &str) -> RawVideo {
    RawVideo {
        channel_rutube_id: Some(channel_rutube_id.to_string()),
        channel_title: Some(format!("Канал {}", channel_rutube_id)),
        ..sample_video(video_id, title)
    }
}

pub fn sample_playlist(playlist_id: &str, title: &str) -> RawPlaylist {
    RawPlaylist {
        playlist_id: playlist_id.to_string(),
        title: Some(title.to_string()),
        description: None,
        thumbnail_url: None,
    }
}
