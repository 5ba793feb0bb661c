use std::env;

use anyhow::Context;

/// Runtime configuration, read once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub redis_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Rutube channel scanned by the scheduled scrape.
    pub rutube_channel_id: String,
    pub scrape_interval_secs: u64,
    pub scrape_limit: i64,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

        let redis_url = env::var("REDIS_URL").unwrap_or_else(|_| {
            let host = env::var("REDIS_HOST").unwrap_or_else(|_| "redis".to_string());
            let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
            format!("redis://{}:{}", host, port)
        });

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(8000);

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:4173,http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let rutube_channel_id =
            env::var("RUTUBE_CHANNEL_ID").unwrap_or_else(|_| "32869212".to_string());
        let scrape_interval_secs = env::var("SCRAPE_INTERVAL_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(60 * 60 * 24);
        let scrape_limit = env::var("SCRAPE_LIMIT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(100);

        Ok(Settings {
            database_url,
            redis_url,
            host,
            port,
            cors_origins,
            rutube_channel_id,
            scrape_interval_secs,
            scrape_limit,
        })
    }
}
