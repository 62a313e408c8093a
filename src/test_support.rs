use crate::config::ServerConfig;
use crate::db;
use crate::state::AppState;

pub fn test_config() -> ServerConfig {
    ServerConfig {
        database_url: "postgresql://postgres@localhost/postgres".to_string(),
        max_series_points: 50_000,
        enable_cors: false,
    }
}

/// State backed by a lazy pool; no connection is made until a handler
/// actually queries, so routes without database access stay testable
/// offline.
pub fn test_state() -> AppState {
    let config = test_config();
    let db = db::connect_lazy(&config.database_url).expect("lazy pool creation does not connect");
    AppState { config, db }
}
