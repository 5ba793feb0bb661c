//! Reconciliation of fetched video metadata into the catalog.
//!
//! Every entity is keyed by its platform identifier: channels and playlists
//! by their Rutube id, videos by `rutube_video_id`. A run re-fetching data
//! that is already stored updates rows in place instead of duplicating them.
//! All writes of one run share a single transaction and commit together.

use serde::Serialize;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::catalog::{
    CatalogStore, ChannelFields, ChannelRecord, MovieFields, PgCatalog, PlaylistFields,
    PlaylistRecord,
};

use super::normalize;
use super::source::{RawVideo, VideoSource};
use super::{IngestError, Result};

/// Natural key of the channel that adopts videos whose author is unknown.
pub const UNKNOWN_CHANNEL_KEY: &str = "unknown";
pub const UNKNOWN_CHANNEL_TITLE: &str = "Неизвестный канал";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScrapeReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistImportReport {
    pub playlist_id: i64,
    pub playlist_title: String,
    pub imported: usize,
    pub updated: usize,
    pub linked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelImportReport {
    pub channel_id: i64,
    pub channel_rutube_id: String,
    pub title: String,
    pub imported_videos: usize,
    pub playlists_found: usize,
    pub playlists_imported: usize,
}

enum VideoOutcome {
    Created(i64),
    Updated(i64),
    Unchanged(i64),
}

/// Reconciliation engine over one open [`CatalogStore`] run.
pub struct Reconciler<'a, S: CatalogStore> {
    store: &'a mut S,
    source: &'a dyn VideoSource,
}

impl<'a, S: CatalogStore> Reconciler<'a, S> {
    pub fn new(store: &'a mut S, source: &'a dyn VideoSource) -> Self {
        Reconciler { store, source }
    }

    /// Fetches up to `limit` videos from a channel's own listing and
    /// reconciles each against that channel.
    pub async fn scrape_channel(
        &mut self,
        rutube_channel_id: &str,
        limit: i64,
    ) -> Result<ScrapeReport> {
        let videos = self.source.channel_videos(rutube_channel_id, limit).await?;
        if videos.is_empty() {
            return Err(IngestError::EmptyFetch(format!(
                "channel {}",
                rutube_channel_id
            )));
        }
        self.reconcile_channel_batch(rutube_channel_id, &videos)
            .await
    }

    /// Reconciles an already-fetched batch of channel videos.
    pub async fn reconcile_channel_batch(
        &mut self,
        rutube_channel_id: &str,
        videos: &[RawVideo],
    ) -> Result<ScrapeReport> {
        let source_url = format!("https://rutube.ru/channel/{}/", rutube_channel_id);
        let channel = self.ensure_channel(rutube_channel_id, &source_url).await?;

        let mut report = ScrapeReport {
            fetched: videos.len(),
            ..ScrapeReport::default()
        };
        for video in videos {
            match self.reconcile_video(video, channel.id).await? {
                VideoOutcome::Created(_) => report.created += 1,
                VideoOutcome::Updated(_) => report.updated += 1,
                VideoOutcome::Unchanged(_) => {}
            }
        }
        Ok(report)
    }

    /// Imports a playlist's videos and links them to the playlist row.
    ///
    /// Does not commit; a channel import calls this once per discovered
    /// playlist inside its own run.
    pub async fn import_playlist(
        &mut self,
        rutube_playlist_id: &str,
        source_url: &str,
        limit: i64,
    ) -> Result<PlaylistImportReport> {
        let videos = self
            .source
            .playlist_videos(rutube_playlist_id, limit)
            .await?;
        if videos.is_empty() {
            return Err(IngestError::EmptyFetch(format!(
                "playlist {}",
                rutube_playlist_id
            )));
        }

        let playlist = self.ensure_playlist(rutube_playlist_id, source_url).await?;

        let mut report = PlaylistImportReport {
            playlist_id: playlist.id,
            playlist_title: playlist.title.clone(),
            imported: 0,
            updated: 0,
            linked: 0,
        };
        for video in &videos {
            let channel_id = self.channel_for_video(video).await?;
            let movie_id = match self.reconcile_video(video, channel_id).await? {
                VideoOutcome::Created(id) => {
                    report.imported += 1;
                    id
                }
                VideoOutcome::Updated(id) => {
                    report.updated += 1;
                    id
                }
                VideoOutcome::Unchanged(id) => id,
            };
            if !self
                .store
                .movie_linked_to_playlist(playlist.id, movie_id)
                .await?
            {
                self.store
                    .link_movie_to_playlist(playlist.id, movie_id)
                    .await?;
                report.linked += 1;
            }
        }
        Ok(report)
    }

    /// Imports a channel: its metadata, optionally a bounded slice of its
    /// direct uploads, and optionally every playlist it owns.
    ///
    /// A playlist that fails to fetch is logged and skipped; the rest of
    /// the run continues. Storage failures abort the whole run.
    pub async fn import_channel(
        &mut self,
        rutube_channel_id: &str,
        source_url: &str,
        video_limit: Option<i64>,
        scan_playlists: bool,
        per_playlist_limit: i64,
    ) -> Result<ChannelImportReport> {
        let channel = self.ensure_channel(rutube_channel_id, source_url).await?;

        let mut report = ChannelImportReport {
            channel_id: channel.id,
            channel_rutube_id: channel.rutube_id.clone(),
            title: channel.title.clone(),
            imported_videos: 0,
            playlists_found: 0,
            playlists_imported: 0,
        };

        if let Some(limit) = video_limit.filter(|limit| *limit > 0) {
            let videos = self.source.channel_videos(rutube_channel_id, limit).await?;
            for video in &videos {
                if let VideoOutcome::Created(_) = self.reconcile_video(video, channel.id).await? {
                    report.imported_videos += 1;
                }
            }
        }

        if scan_playlists {
            let playlists = self.source.channel_playlists(rutube_channel_id).await?;
            report.playlists_found = playlists.len();
            for playlist in &playlists {
                let playlist_url = format!("https://rutube.ru/plst/{}/", playlist.playlist_id);
                match self
                    .import_playlist(&playlist.playlist_id, &playlist_url, per_playlist_limit)
                    .await
                {
                    Ok(playlist_report) => {
                        report.playlists_imported += 1;
                        report.imported_videos += playlist_report.imported;
                    }
                    Err(IngestError::Storage(err)) => return Err(IngestError::Storage(err)),
                    Err(err) => {
                        error!(
                            "Skipping playlist {} during channel {} import: {}",
                            playlist.playlist_id, rutube_channel_id, err
                        );
                    }
                }
            }
        }

        Ok(report)
    }

    /// Resolves a channel row by its platform id, creating or refreshing it
    /// from the profile endpoint. A failed metadata fetch falls back to a
    /// synthesized title on create and leaves an existing row untouched.
    async fn ensure_channel(
        &mut self,
        rutube_channel_id: &str,
        source_url: &str,
    ) -> Result<ChannelRecord> {
        let info = match self.source.channel_info(rutube_channel_id).await {
            Ok(info) => info,
            Err(err) => {
                warn!(
                    "Channel {} metadata fetch failed: {}",
                    rutube_channel_id, err
                );
                None
            }
        };

        let existing = self.store.channel_by_rutube_id(rutube_channel_id).await?;
        match (existing, info) {
            (Some(record), Some(info)) => {
                let fields = ChannelFields {
                    rutube_id: rutube_channel_id.to_string(),
                    title: info
                        .title
                        .unwrap_or_else(|| format!("Канал {}", rutube_channel_id)),
                    description: info.description,
                    avatar_url: info.avatar_url,
                };
                self.store.update_channel_meta(record.id, &fields).await?;
                Ok(ChannelRecord {
                    id: record.id,
                    rutube_id: fields.rutube_id,
                    title: fields.title,
                })
            }
            (Some(record), None) => Ok(record),
            (None, info) => {
                let (title, description, avatar_url) = match info {
                    Some(info) => (
                        info.title
                            .unwrap_or_else(|| format!("Канал {}", rutube_channel_id)),
                        info.description
                            .or_else(|| Some(format!("Импортировано из {}", source_url))),
                        info.avatar_url,
                    ),
                    None => (
                        format!("Канал {}", rutube_channel_id),
                        Some(format!("Импортировано из {}", source_url)),
                        None,
                    ),
                };
                let fields = ChannelFields {
                    rutube_id: rutube_channel_id.to_string(),
                    title,
                    description,
                    avatar_url,
                };
                let id = self.store.insert_channel(&fields).await?;
                info!("Created channel {} ({})", fields.title, rutube_channel_id);
                Ok(ChannelRecord {
                    id,
                    rutube_id: fields.rutube_id,
                    title: fields.title,
                })
            }
        }
    }

    /// Resolves a playlist row by its platform id, creating a placeholder
    /// when the metadata endpoint gives nothing back.
    async fn ensure_playlist(
        &mut self,
        rutube_playlist_id: &str,
        source_url: &str,
    ) -> Result<PlaylistRecord> {
        let info = match self.source.playlist_info(rutube_playlist_id).await {
            Ok(info) => info,
            Err(err) => {
                warn!(
                    "Playlist {} metadata fetch failed: {}",
                    rutube_playlist_id, err
                );
                None
            }
        };

        let existing = self.store.playlist_by_rutube_id(rutube_playlist_id).await?;
        match (existing, info) {
            (Some(record), Some(info)) => {
                let fields = PlaylistFields {
                    rutube_id: rutube_playlist_id.to_string(),
                    title: info
                        .title
                        .unwrap_or_else(|| format!("Плейлист {}", rutube_playlist_id)),
                    description: info.description,
                    image_url: info.thumbnail_url,
                };
                self.store.update_playlist_meta(record.id, &fields).await?;
                Ok(PlaylistRecord {
                    id: record.id,
                    rutube_id: fields.rutube_id,
                    title: fields.title,
                })
            }
            (Some(record), None) => Ok(record),
            (None, info) => {
                let (title, description, image_url) = match info {
                    Some(info) => (
                        info.title
                            .unwrap_or_else(|| format!("Плейлист {}", rutube_playlist_id)),
                        info.description
                            .or_else(|| Some(format!("Импортировано из {}", source_url))),
                        info.thumbnail_url,
                    ),
                    None => (
                        format!("Плейлист {}", rutube_playlist_id),
                        Some(format!("Импортировано из {}", source_url)),
                        None,
                    ),
                };
                let fields = PlaylistFields {
                    rutube_id: rutube_playlist_id.to_string(),
                    title,
                    description,
                    image_url,
                };
                let id = self.store.insert_playlist(&fields).await?;
                info!("Created playlist {} ({})", fields.title, rutube_playlist_id);
                Ok(PlaylistRecord {
                    id,
                    rutube_id: fields.rutube_id,
                    title: fields.title,
                })
            }
        }
    }

    /// Channel a video belongs to: its author's channel when the record
    /// names one, otherwise the shared placeholder channel.
    async fn channel_for_video(&mut self, video: &RawVideo) -> Result<i64> {
        let rutube_id = match &video.channel_rutube_id {
            Some(rutube_id) => rutube_id,
            None => return Ok(self.ensure_placeholder_channel().await?.id),
        };
        if let Some(existing) = self.store.channel_by_rutube_id(rutube_id).await? {
            return Ok(existing.id);
        }
        // The listing item carries enough author metadata to avoid one
        // profile request per video.
        let fields = ChannelFields {
            rutube_id: rutube_id.clone(),
            title: video
                .channel_title
                .clone()
                .unwrap_or_else(|| format!("Канал {}", rutube_id)),
            description: None,
            avatar_url: video.channel_avatar_url.clone(),
        };
        let id = self.store.insert_channel(&fields).await?;
        Ok(id)
    }

    async fn ensure_placeholder_channel(&mut self) -> Result<ChannelRecord> {
        if let Some(existing) = self.store.channel_by_rutube_id(UNKNOWN_CHANNEL_KEY).await? {
            return Ok(existing);
        }
        let fields = ChannelFields {
            rutube_id: UNKNOWN_CHANNEL_KEY.to_string(),
            title: UNKNOWN_CHANNEL_TITLE.to_string(),
            description: None,
            avatar_url: None,
        };
        let id = self.store.insert_channel(&fields).await?;
        Ok(ChannelRecord {
            id,
            rutube_id: fields.rutube_id,
            title: fields.title,
        })
    }

    /// Creates or updates one movie row from a fetched record.
    ///
    /// Records without a platform id cannot be reconciled by identity and
    /// fall back to source-URL deduplication: present rows are left alone.
    async fn reconcile_video(&mut self, video: &RawVideo, channel_id: i64) -> Result<VideoOutcome> {
        let fields = movie_fields(video, channel_id);
        match &video.video_id {
            Some(rutube_video_id) => {
                match self.store.movie_by_rutube_video_id(rutube_video_id).await? {
                    Some(existing) => {
                        self.store.update_movie(existing.id, &fields).await?;
                        Ok(VideoOutcome::Updated(existing.id))
                    }
                    None => {
                        let id = self.store.insert_movie(&fields).await?;
                        Ok(VideoOutcome::Created(id))
                    }
                }
            }
            None => match self.store.movie_by_source_url(&fields.source_url).await? {
                Some(existing) => Ok(VideoOutcome::Unchanged(existing.id)),
                None => {
                    let id = self.store.insert_movie(&fields).await?;
                    Ok(VideoOutcome::Created(id))
                }
            },
        }
    }
}

fn movie_fields(video: &RawVideo, channel_id: i64) -> MovieFields {
    MovieFields {
        title: video.title.clone(),
        year: normalize::extract_year(video.published_at.as_deref()),
        image_url: video.thumbnail_url.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        views: video.views,
        duration: normalize::format_duration(video.duration_secs),
        description: video.description.clone(),
        genre: video.category.clone(),
        source_url: video.video_url.clone(),
        channel_added_at: normalize::parse_published_at(video.published_at.as_deref()),
        channel_id,
        rutube_video_id: video.video_id.clone(),
    }
}

/// Scrapes the configured channel's listing into the catalog and commits.
/// Returns how many videos the source handed back.
#[tracing::instrument(name = "Run channel scrape", skip(pool, source))]
pub async fn run_channel_scrape(
    pool: &PgPool,
    source: &dyn VideoSource,
    rutube_channel_id: &str,
    limit: i64,
) -> Result<usize> {
    let videos = source.channel_videos(rutube_channel_id, limit).await?;
    if videos.is_empty() {
        return Err(IngestError::EmptyFetch(format!(
            "channel {}",
            rutube_channel_id
        )));
    }

    let mut store = PgCatalog::begin(pool).await?;
    let report = Reconciler::new(&mut store, source)
        .reconcile_channel_batch(rutube_channel_id, &videos)
        .await?;
    store.commit().await?;
    info!(
        "Scraped channel {}: {} fetched, {} new, {} updated",
        rutube_channel_id, report.fetched, report.created, report.updated
    );
    Ok(report.fetched)
}

/// Imports one playlist by its platform id and commits.
#[tracing::instrument(name = "Import playlist", skip(pool, source))]
pub async fn import_playlist(
    pool: &PgPool,
    source: &dyn VideoSource,
    rutube_playlist_id: &str,
    source_url: &str,
    limit: i64,
) -> Result<PlaylistImportReport> {
    let mut store = PgCatalog::begin(pool).await?;
    let report = Reconciler::new(&mut store, source)
        .import_playlist(rutube_playlist_id, source_url, limit)
        .await?;
    store.commit().await?;
    info!(
        "Imported playlist {}: {} new, {} updated, {} linked",
        report.playlist_title, report.imported, report.updated, report.linked
    );
    Ok(report)
}

/// Imports one channel by its platform id and commits.
#[tracing::instrument(name = "Import channel", skip(pool, source))]
pub async fn import_channel(
    pool: &PgPool,
    source: &dyn VideoSource,
    rutube_channel_id: &str,
    source_url: &str,
    video_limit: Option<i64>,
    scan_playlists: bool,
    per_playlist_limit: i64,
) -> Result<ChannelImportReport> {
    let mut store = PgCatalog::begin(pool).await?;
    let report = Reconciler::new(&mut store, source)
        .import_channel(
            rutube_channel_id,
            source_url,
            video_limit,
            scan_playlists,
            per_playlist_limit,
        )
        .await?;
    store.commit().await?;
    info!(
        "Imported channel {}: {} videos, {} of {} playlists",
        report.title, report.imported_videos, report.playlists_imported, report.playlists_found
    );
    Ok(report)
}
