//! Scalar time-series extraction.
//!
//! Readings are stored as one JSONB document per sample. Most kinds keep
//! params at the top level; IoT boxes nest them one level deep under
//! per-sensor keys, in which case the value reported for a param is the
//! mean across sensors carrying it.

use crate::range::{effective_bucket_hours, Aggregation, RangeToken};
use crate::services::aggregate::{aggregate_readings, downsample, Reading};
use crate::services::stations::{Station, StationKind};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use std::collections::BTreeMap;

#[derive(Debug, sqlx::FromRow)]
pub struct ReadingRow {
    pub recorded_at: DateTime<Utc>,
    pub doc: SqlJson<JsonValue>,
}

pub async fn fetch_rows(
    db: &PgPool,
    station_num: i32,
    cutoff: Option<DateTime<Utc>>,
) -> Result<Vec<ReadingRow>, sqlx::Error> {
    sqlx::query_as::<_, ReadingRow>(
        r#"
        SELECT recorded_at, doc
        FROM station_readings
        WHERE station_num = $1
          AND ($2::timestamptz IS NULL OR recorded_at >= $2)
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(station_num)
    .bind(cutoff)
    .fetch_all(db)
    .await
}

fn as_f64(value: &JsonValue) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

/// Pull one param out of a reading document. Top-level numeric fields win;
/// otherwise every direct child object carrying a numeric field of that
/// name contributes to a mean (nested per-sensor layout).
pub fn extract_param(doc: &JsonValue, param: &str) -> Option<f64> {
    if let Some(value) = doc.get(param).and_then(as_f64) {
        return Some(value);
    }
    let obj = doc.as_object()?;
    let mut sum = 0.0;
    let mut count = 0u64;
    for child in obj.values() {
        if let Some(value) = child.get(param).and_then(as_f64) {
            sum += value;
            count += 1;
        }
    }
    (count > 0).then(|| sum / count as f64)
}

fn decode_rows(rows: &[ReadingRow], params: &[String], zero_is_missing: bool) -> Vec<Reading> {
    rows.iter()
        .map(|row| {
            let values = params
                .iter()
                .map(|param| {
                    let value = extract_param(&row.doc.0, param)
                        .filter(|v| !(zero_is_missing && *v == 0.0));
                    (param.clone(), value)
                })
                .collect::<BTreeMap<_, _>>();
            Reading {
                recorded_at: row.recorded_at,
                values,
            }
        })
        .collect()
}

/// Resolve the requested param list: explicit comma-separated names, or
/// the kind's full scalar schema when absent.
pub fn resolve_params(kind: StationKind, raw: Option<&str>) -> Vec<String> {
    let explicit: Vec<String> = raw
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    if explicit.is_empty() {
        kind.scalar_params().iter().map(|p| p.to_string()).collect()
    } else {
        explicit
    }
}

pub struct SeriesQuery {
    pub range: RangeToken,
    pub agg: Aggregation,
    pub params: Vec<String>,
    pub max_points: usize,
}

pub struct SeriesResult {
    pub bucket_hours: Option<i64>,
    pub readings: Vec<Reading>,
}

/// Full scalar pipeline for one station: fetch within the range cutoff,
/// decode, then either bucket-average or downsample raw samples.
pub async fn load_series(
    db: &PgPool,
    station: &Station,
    query: &SeriesQuery,
) -> Result<SeriesResult, sqlx::Error> {
    let kind = station.station_kind();
    let cutoff = query.range.cutoff(Utc::now());
    let rows = fetch_rows(db, station.station_num, cutoff).await?;
    let readings = decode_rows(&rows, &query.params, kind.zero_is_missing());

    let bucket_hours = effective_bucket_hours(query.range, query.agg);
    let readings = match bucket_hours {
        Some(width) => aggregate_readings(&readings, width, &query.params, kind.zero_is_missing()),
        None => downsample(&readings, query.max_points),
    };
    Ok(SeriesResult {
        bucket_hours,
        readings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn top_level_param_wins() {
        let doc = json!({"air_temp": 12.5, "sensor_1": {"air_temp": 99.0}});
        assert_eq!(extract_param(&doc, "air_temp"), Some(12.5));
    }

    #[test]
    fn nested_sensors_average_across_carriers() {
        let doc = json!({
            "SPS30_1": {"pm10mass": 4.0, "pm1mass": 1.0},
            "SPS30_2": {"pm10mass": 6.0},
            "SCD30_1": {"co2": 420.0}
        });
        assert_eq!(extract_param(&doc, "pm10mass"), Some(5.0));
        assert_eq!(extract_param(&doc, "co2"), Some(420.0));
        assert_eq!(extract_param(&doc, "pm4mass"), None);
    }

    #[test]
    fn non_numeric_fields_are_ignored() {
        let doc = json!({"mode": "scan", "T": 21.0});
        assert_eq!(extract_param(&doc, "mode"), None);
        assert_eq!(extract_param(&doc, "T"), Some(21.0));
    }

    #[test]
    fn params_default_to_kind_schema() {
        let params = resolve_params(StationKind::Buoy, None);
        assert_eq!(params[0], "wind_speed");
        let explicit = resolve_params(StationKind::Buoy, Some(" air_temp , albedo "));
        assert_eq!(explicit, vec!["air_temp", "albedo"]);
        let blank = resolve_params(StationKind::Meteo, Some(" , "));
        assert_eq!(blank.len(), StationKind::Meteo.scalar_params().len());
    }
}
