use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::BTreeMap;

use crate::error::map_db_error;
use crate::range::{parse_aggregation, RangeToken};
use crate::services::profiles::{load_profiles, ProfileQuery};
use crate::services::stations::fetch_station;
use crate::state::AppState;

#[derive(Debug, Clone, serde::Deserialize, utoipa::IntoParams)]
pub(crate) struct ProfileParams {
    pub(crate) range: Option<String>,
    /// Comma-separated parameter names; defaults to the station's
    /// profile schema. Derived names (`salinity_practical`,
    /// `salinity_absolute`, `density`) are accepted here too.
    pub(crate) params: Option<String>,
    pub(crate) agg: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
pub(crate) struct ProfileResponse {
    pub(crate) station_num: i32,
    pub(crate) range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) bucket_hours: Option<i64>,
    pub(crate) depths: Vec<f64>,
    pub(crate) buckets: Vec<String>,
    pub(crate) labels: BTreeMap<String, String>,
    /// `values[param][bucket][depth]`, nulls where no measurement exists.
    pub(crate) values: BTreeMap<String, Vec<Vec<Option<f64>>>>,
}

#[utoipa::path(
    get,
    path = "/api/stations/{station_num}/profiles",
    tag = "profiles",
    params(("station_num" = i32, Path, description = "Station number"), ProfileParams),
    responses(
        (status = 200, description = "Depth-profile grid", body = ProfileResponse),
        (status = 404, description = "Station not found"),
        (status = 422, description = "Stored casts lack a depth axis")
    )
)]
pub(crate) async fn get_profiles(
    State(state): State<AppState>,
    Path(station_num): Path<i32>,
    Query(query): Query<ProfileParams>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let station = fetch_station(&state.db, station_num)
        .await
        .map_err(map_db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Station not found".to_string()))?;
    let kind = station.station_kind();

    let range = RangeToken::parse(query.range.as_deref().unwrap_or(""));
    let agg = parse_aggregation(query.agg.as_deref());
    let explicit: Vec<String> = query
        .params
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    let params = if explicit.is_empty() {
        kind.profile_params().iter().map(|p| p.to_string()).collect()
    } else {
        explicit
    };

    let profile_query = ProfileQuery {
        range,
        agg,
        params: params.clone(),
    };
    let result = load_profiles(&state.db, &station, &profile_query)
        .await
        .map_err(map_db_error)?
        .map_err(|msg| (StatusCode::UNPROCESSABLE_ENTITY, msg))?;

    let labels = params
        .iter()
        .map(|param| (param.clone(), kind.label(param)))
        .collect();

    Ok(Json(ProfileResponse {
        station_num,
        range: range.as_str().to_string(),
        bucket_hours: result.bucket_hours,
        depths: result.grid.depths,
        buckets: result
            .grid
            .buckets
            .iter()
            .map(|ts| ts.to_rfc3339())
            .collect(),
        labels,
        values: result.grid.values,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stations/{station_num}/profiles", get(get_profiles))
}
