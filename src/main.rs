use std::error::Error;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::ServiceExt;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api_videoteka::api;
use api_videoteka::config::Settings;
use api_videoteka::db::{init_db, init_redis, run_migrations};
use api_videoteka::ingest::{spawn_daily_scrape, RutubeClient, VideoSource};
use api_videoteka::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_videoteka=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Arc::new(Settings::from_env()?);

    let db = init_db(&settings.database_url).await?;
    run_migrations(&db).await?;
    let redis = init_redis(&settings.redis_url)?;

    let source: Arc<dyn VideoSource> = Arc::new(RutubeClient::new());

    let shutdown = CancellationToken::new();
    let scrape_task = spawn_daily_scrape(
        db.clone(),
        source.clone(),
        settings.rutube_channel_id.clone(),
        Duration::from_secs(settings.scrape_interval_secs),
        settings.scrape_limit,
        shutdown.clone(),
    );

    let state = AppState {
        db,
        redis,
        source,
        settings: settings.clone(),
    };

    let app = api::app_router(state)
        .layer(build_cors(&settings.cors_origins))
        .layer(TraceLayer::new_for_http());
    // Clients are split between `/movies` and `/movies/` forms; trim the
    // trailing slash before routing so both hit the same handler. Must wrap
    // the router, not be layered inside it, to run before route matching.
    let app = NormalizePath::trim_trailing_slash(app);

    let addr = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    let _ = scrape_task.await;

    Ok(())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if parsed.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn shutdown_signal(token: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    token.cancel();
}
