use std::sync::Arc;

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::reconcile::run_channel_scrape;
use super::source::VideoSource;

/// Runs the channel scrape immediately and then once per `interval` until
/// the token is cancelled. Failed runs are logged and the loop keeps going;
/// cancellation takes effect between runs, never mid-run.
pub fn spawn_daily_scrape(
    pool: PgPool,
    source: Arc<dyn VideoSource>,
    rutube_channel_id: String,
    interval: Duration,
    limit: i64,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Scheduled scrape started for channel {} (every {:?})",
            rutube_channel_id, interval
        );
        loop {
            match run_channel_scrape(&pool, source.as_ref(), &rutube_channel_id, limit).await {
                Ok(count) => info!("Scheduled scrape processed {} videos", count),
                Err(err) => error!("Scheduled scrape failed: {}", err),
            }
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Scheduled scrape stopped");
                    break;
                }
                _ = sleep(interval) => {}
            }
        }
    })
}
