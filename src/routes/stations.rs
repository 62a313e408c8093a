use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::error::map_db_error;
use crate::services::stations::{fetch_station, fetch_stations, StationResponse};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/stations",
    tag = "stations",
    responses((status = 200, description = "Stations", body = Vec<StationResponse>))
)]
pub(crate) async fn list_stations(
    State(state): State<AppState>,
) -> Result<Json<Vec<StationResponse>>, (StatusCode, String)> {
    let stations = fetch_stations(&state.db).await.map_err(map_db_error)?;
    Ok(Json(stations.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/stations/{station_num}",
    tag = "stations",
    params(("station_num" = i32, Path, description = "Station number")),
    responses(
        (status = 200, description = "Station", body = StationResponse),
        (status = 404, description = "Station not found")
    )
)]
pub(crate) async fn get_station(
    State(state): State<AppState>,
    Path(station_num): Path<i32>,
) -> Result<Json<StationResponse>, (StatusCode, String)> {
    let station = fetch_station(&state.db, station_num)
        .await
        .map_err(map_db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Station not found".to_string()))?;
    Ok(Json(station.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stations", get(list_stations))
        .route("/stations/{station_num}", get(get_station))
}
