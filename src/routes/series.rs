use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::BTreeMap;

use crate::error::map_db_error;
use crate::range::{parse_aggregation, RangeToken};
use crate::services::series::{load_series, resolve_params, SeriesQuery};
use crate::services::stations::fetch_station;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct SeriesParams {
    /// Range token such as `6H`, `1M`, or `All`.
    pub(crate) range: Option<String>,
    /// Comma-separated parameter names; defaults to the station's schema.
    pub(crate) params: Option<String>,
    /// Explicit aggregation unit (`H`, `D`, `W`, `M`).
    pub(crate) agg: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct SeriesPoint {
    pub(crate) timestamp: String,
    pub(crate) values: BTreeMap<String, Option<f64>>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct SeriesResponse {
    pub(crate) station_num: i32,
    pub(crate) range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) bucket_hours: Option<i64>,
    pub(crate) params: Vec<String>,
    pub(crate) labels: BTreeMap<String, String>,
    pub(crate) points: Vec<SeriesPoint>,
}

#[utoipa::path(
    get,
    path = "/api/stations/{station_num}/series",
    tag = "series",
    params(("station_num" = i32, Path, description = "Station number"), SeriesParams),
    responses(
        (status = 200, description = "Scalar time series", body = SeriesResponse),
        (status = 404, description = "Station not found")
    )
)]
pub(crate) async fn get_series(
    State(state): State<AppState>,
    Path(station_num): Path<i32>,
    Query(query): Query<SeriesParams>,
) -> Result<Json<SeriesResponse>, (StatusCode, String)> {
    let station = fetch_station(&state.db, station_num)
        .await
        .map_err(map_db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Station not found".to_string()))?;
    let kind = station.station_kind();

    let range = RangeToken::parse(query.range.as_deref().unwrap_or(""));
    let agg = parse_aggregation(query.agg.as_deref());
    let params = resolve_params(kind, query.params.as_deref());

    let series_query = SeriesQuery {
        range,
        agg,
        params: params.clone(),
        max_points: state.config.max_series_points,
    };
    let result = load_series(&state.db, &station, &series_query)
        .await
        .map_err(map_db_error)?;

    let labels = params
        .iter()
        .map(|param| (param.clone(), kind.label(param)))
        .collect();
    let points = result
        .readings
        .into_iter()
        .map(|reading| SeriesPoint {
            timestamp: reading.recorded_at.to_rfc3339(),
            values: reading.values,
        })
        .collect();

    Ok(Json(SeriesResponse {
        station_num,
        range: range.as_str().to_string(),
        bucket_hours: result.bucket_hours,
        params,
        labels,
        points,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stations/{station_num}/series", get(get_series))
}
