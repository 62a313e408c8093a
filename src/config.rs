use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_series_points: usize,
    pub enable_cors: bool,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = std::env::var("STATION_DATABASE_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .context("STATION_DATABASE_URL must be set")?;

        let max_series_points =
            env_u64("STATION_MAX_SERIES_POINTS", 50_000).clamp(1, 10_000_000) as usize;
        let enable_cors = env_bool("STATION_ENABLE_CORS", true);

        Ok(Self {
            database_url,
            max_series_points,
            enable_cors,
        })
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key)
        .ok()
        .map(|value| value.trim().to_lowercase())
    {
        Some(value) if value == "1" || value == "true" || value == "yes" => true,
        Some(value) if value == "0" || value == "false" || value == "no" => false,
        _ => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
