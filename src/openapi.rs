use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "station-server",
        description = "Read-side API for environmental station time series and depth profiles"
    ),
    paths(
        crate::routes::health::healthz,
        crate::routes::stations::list_stations,
        crate::routes::stations::get_station,
        crate::routes::series::get_series,
        crate::routes::profiles::get_profiles,
        crate::routes::export::export_csv,
        crate::routes::live::get_live,
        crate::routes::ranges::list_ranges,
    ),
    components(schemas(
        crate::routes::health::HealthResponse,
        crate::services::stations::StationResponse,
        crate::routes::series::SeriesPoint,
        crate::routes::series::SeriesResponse,
        crate::routes::profiles::ProfileResponse,
        crate::routes::live::LiveCard,
        crate::routes::live::LiveResponse,
        crate::routes::ranges::RangeOption,
        crate::routes::ranges::RangesResponse,
    ))
)]
pub struct ApiDoc;

pub fn openapi_json() -> String {
    ApiDoc::openapi()
        .to_pretty_json()
        .unwrap_or_else(|_| "{}".to_string())
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}
