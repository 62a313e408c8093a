pub mod export;
pub mod health;
pub mod live;
pub mod profiles;
pub mod ranges;
pub mod series;
pub mod stations;

use axum::Router;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(stations::router())
                .merge(series::router())
                .merge(profiles::router())
                .merge(export::router())
                .merge(live::router())
                .merge(ranges::router())
                .merge(crate::openapi::router()),
        )
        .with_state(state)
}
