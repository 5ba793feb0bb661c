//! Rutube ingestion: fetching video metadata from the public API and
//! reconciling it into the catalog.

pub mod normalize;
pub mod reconcile;
pub mod scheduler;
pub mod source;
pub mod urls;

use crate::catalog::CatalogError;

pub use reconcile::{
    import_channel, import_playlist, run_channel_scrape, ChannelImportReport,
    PlaylistImportReport, Reconciler, ScrapeReport, UNKNOWN_CHANNEL_KEY, UNKNOWN_CHANNEL_TITLE,
};
pub use scheduler::spawn_daily_scrape;
pub use source::{RawChannel, RawPlaylist, RawVideo, RutubeClient, VideoSource};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Source API error: {0}")]
    Source(String),

    #[error("Source returned no usable records: {0}")]
    EmptyFetch(String),

    #[error("Storage error: {0}")]
    Storage(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, IngestError>;
