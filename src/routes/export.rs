use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use crate::error::{internal_error, map_db_error};
use crate::range::{parse_aggregation, RangeToken};
use crate::routes::series::SeriesParams;
use crate::services::series::{load_series, resolve_params, SeriesQuery};
use crate::services::stations::fetch_station;
use crate::state::AppState;

fn write_csv(
    params: &[String],
    readings: &[crate::services::aggregate::Reading],
) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = Vec::with_capacity(params.len() + 1);
    header.push("timestamp".to_string());
    header.extend(params.iter().cloned());
    writer.write_record(&header)?;

    for reading in readings {
        let mut record = Vec::with_capacity(params.len() + 1);
        record.push(reading.recorded_at.to_rfc3339());
        for param in params {
            let cell = reading
                .values
                .get(param)
                .copied()
                .flatten()
                .map(|v| v.to_string())
                .unwrap_or_default();
            record.push(cell);
        }
        writer.write_record(&record)?;
    }

    Ok(writer.into_inner().unwrap_or_default())
}

#[utoipa::path(
    get,
    path = "/api/stations/{station_num}/export.csv",
    tag = "series",
    params(("station_num" = i32, Path, description = "Station number"), SeriesParams),
    responses(
        (status = 200, description = "CSV download of the scalar series"),
        (status = 404, description = "Station not found")
    )
)]
pub(crate) async fn export_csv(
    State(state): State<AppState>,
    Path(station_num): Path<i32>,
    Query(query): Query<SeriesParams>,
) -> Result<Response, (StatusCode, String)> {
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

    let body = write_csv(&params, &result.readings).map_err(internal_error)?;

    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    let filename = format!("station{station_num}_{}.csv", range.as_str().to_lowercase());
    let content_disposition =
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(internal_error)?;
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, content_disposition);
    Ok(response)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stations/{station_num}/export.csv", get(export_csv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::aggregate::Reading;

    #[test]
    fn missing_values_export_as_empty_cells() {
        let params = vec!["air_temp".to_string(), "albedo".to_string()];
        let readings = vec![Reading {
            recorded_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            values: [
                ("air_temp".to_string(), Some(12.5)),
                ("albedo".to_string(), None),
            ]
            .into_iter()
            .collect(),
        }];
        let bytes = write_csv(&params, &readings).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("timestamp,air_temp,albedo\n"));
        assert!(text.contains("2024-01-01T00:00:00+00:00,12.5,\n"));
    }
}
