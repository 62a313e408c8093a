use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

// Expected schema:
//   stations(station_num int primary key, name text, kind text,
//            latitude double precision, longitude double precision,
//            sensors jsonb, last_seen_at timestamptz)
//   station_readings(station_num int, recorded_at timestamptz, doc jsonb)
// Both tables are owned by the external ingestion process; this server
// only reads from them.
pub fn connect_lazy(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .with_context(|| format!("Failed to create lazy database pool for {database_url}"))
}
