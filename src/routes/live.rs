use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;

use crate::error::map_db_error;
use crate::range::{Aggregation, RangeToken};
use crate::services::series::{load_series, resolve_params, SeriesQuery};
use crate::services::stations::fetch_station;
use crate::state::AppState;

/// Window the live cards summarize.
const LIVE_RANGE: RangeToken = RangeToken::H6;

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct LiveCard {
    pub(crate) param: String,
    pub(crate) label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) latest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) latest_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max: Option<f64>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct LiveResponse {
    pub(crate) station_num: i32,
    pub(crate) range: String,
    pub(crate) generated_at: String,
    pub(crate) cards: Vec<LiveCard>,
}

#[utoipa::path(
    get,
    path = "/api/stations/{station_num}/live",
    tag = "live",
    params(("station_num" = i32, Path, description = "Station number")),
    responses(
        (status = 200, description = "Latest/min/max cards over the live window", body = LiveResponse),
        (status = 404, description = "Station not found")
    )
)]
pub(crate) async fn get_live(
    State(state): State<AppState>,
    Path(station_num): Path<i32>,
) -> Result<Json<LiveResponse>, (StatusCode, String)> {
    let station = fetch_station(&state.db, station_num)
        .await
        .map_err(map_db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Station not found".to_string()))?;
    let kind = station.station_kind();
    let params = resolve_params(kind, None);

    let series_query = SeriesQuery {
        range: LIVE_RANGE,
        agg: Aggregation::Raw,
        params: params.clone(),
        max_points: state.config.max_series_points,
    };
    let result = load_series(&state.db, &station, &series_query)
        .await
        .map_err(map_db_error)?;

    let cards = params
        .iter()
        .map(|param| {
            let mut latest = None;
            let mut latest_at = None;
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            let mut seen = false;
            for reading in &result.readings {
                let Some(value) = reading.values.get(param).copied().flatten() else {
                    continue;
                };
                seen = true;
                latest = Some(value);
                latest_at = Some(reading.recorded_at.to_rfc3339());
                min = min.min(value);
                max = max.max(value);
            }
            LiveCard {
                param: param.clone(),
                label: kind.label(param),
                latest,
                latest_at,
                min: seen.then_some(min),
                max: seen.then_some(max),
            }
        })
        .collect();

    Ok(Json(LiveResponse {
        station_num,
        range: LIVE_RANGE.as_str().to_string(),
        generated_at: Utc::now().to_rfc3339(),
        cards,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stations/{station_num}/live", get(get_live))
}
