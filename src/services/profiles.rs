//! Depth-profile extraction for buoy CTD casts.
//!
//! Each stored document carries a `depth` array plus parallel per-param
//! arrays. Documents without a usable depth axis are skipped at decode
//! time. Salinity and density columns are derived per cast from raw
//! conductivity and temperature before any bucketing, so bucket means
//! average the derived quantity rather than deriving from averaged
//! inputs.

use crate::range::{effective_bucket_hours, Aggregation, RangeToken};
use crate::services::aggregate::{aggregate_profiles, profile_grid_raw, ProfileGrid, ProfileRecord};
use crate::services::seawater;
use crate::services::series::fetch_rows;
use crate::services::stations::Station;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::collections::BTreeMap;

const CONDUCTIVITY: &str = "conductivity";
const CTD_TEMPERATURE: &str = "CTD_tmp";

fn decode_array(doc: &JsonValue, key: &str) -> Option<Vec<Option<f64>>> {
    let array = doc.get(key)?.as_array()?;
    Some(
        array
            .iter()
            .map(|v| v.as_f64().filter(|v| v.is_finite()))
            .collect(),
    )
}

/// Decode one stored document into a profile record, or `None` when the
/// document has no non-empty depth axis.
pub fn decode_profile(
    recorded_at: chrono::DateTime<Utc>,
    doc: &JsonValue,
    params: &[String],
) -> Option<ProfileRecord> {
    let depths: Vec<f64> = doc
        .get("depth")?
        .as_array()?
        .iter()
        .filter_map(|v| v.as_f64())
        .collect();
    if depths.is_empty() {
        return None;
    }
    let values = params
        .iter()
        .map(|param| {
            let column = decode_array(doc, param).unwrap_or_default();
            (param.clone(), column)
        })
        .collect::<BTreeMap<_, _>>();
    Some(ProfileRecord {
        recorded_at,
        depths,
        values,
    })
}

fn pad(column: &[Option<f64>], len: usize) -> Vec<Option<f64>> {
    let mut out = column.to_vec();
    out.truncate(len);
    out.resize(len, None);
    out
}

/// Attach derived salinity and density columns to a record, computed
/// from its own raw conductivity and temperature arrays.
pub fn splice_derived(record: &mut ProfileRecord) {
    let len = record.depths.len();
    let conductivity = record
        .values
        .get(CONDUCTIVITY)
        .map(|c| pad(c, len))
        .unwrap_or_else(|| vec![None; len]);
    let temperature = record
        .values
        .get(CTD_TEMPERATURE)
        .map(|c| pad(c, len))
        .unwrap_or_else(|| vec![None; len]);
    let derived = seawater::derive_columns(&record.depths, &conductivity, &temperature);
    record
        .values
        .insert("salinity_practical".to_string(), derived.practical_salinity);
    record
        .values
        .insert("salinity_absolute".to_string(), derived.absolute_salinity);
    record.values.insert("density".to_string(), derived.density);
}

pub struct ProfileQuery {
    pub range: RangeToken,
    pub agg: Aggregation,
    pub params: Vec<String>,
}

pub struct ProfileResult {
    pub bucket_hours: Option<i64>,
    pub grid: ProfileGrid,
}

/// Full profile pipeline for one buoy: fetch within the range cutoff,
/// decode, derive, then bucket-average or pass through raw casts.
pub async fn load_profiles(
    db: &PgPool,
    station: &Station,
    query: &ProfileQuery,
) -> Result<Result<ProfileResult, String>, sqlx::Error> {
    let cutoff = query.range.cutoff(Utc::now());
    let rows = fetch_rows(db, station.station_num, cutoff).await?;

    let derived = station.station_kind().derived_params();
    let wants_derived = query.params.iter().any(|p| derived.contains(&p.as_str()));
    let mut decode_params = query.params.clone();
    if wants_derived {
        for raw in [CONDUCTIVITY, CTD_TEMPERATURE] {
            if !decode_params.iter().any(|p| p == raw) {
                decode_params.push(raw.to_string());
            }
        }
    }
    let decode_params: Vec<String> = decode_params
        .iter()
        .filter(|p| !derived.contains(&p.as_str()))
        .cloned()
        .collect();

    let mut records: Vec<ProfileRecord> = rows
        .iter()
        .filter_map(|row| decode_profile(row.recorded_at, &row.doc.0, &decode_params))
        .collect();
    if wants_derived {
        for record in &mut records {
            splice_derived(record);
        }
    }

    let bucket_hours = effective_bucket_hours(query.range, query.agg);
    let grid = match bucket_hours {
        Some(width) => aggregate_profiles(&records, width, &query.params),
        None => profile_grid_raw(&records, &query.params),
    };
    Ok(grid.map(|grid| ProfileResult { bucket_hours, grid }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn document_without_depth_axis_is_skipped() {
        let ts = "2024-01-01T00:00:00Z".parse().unwrap();
        assert!(decode_profile(ts, &json!({"O2": [8.0]}), &params(&["O2"])).is_none());
        assert!(decode_profile(ts, &json!({"depth": [], "O2": []}), &params(&["O2"])).is_none());
    }

    #[test]
    fn decode_keeps_arrays_as_stored() {
        let ts = "2024-01-01T00:00:00Z".parse().unwrap();
        let doc = json!({"depth": [2.0, 5.0, 10.0], "O2": [8.0, null]});
        let record = decode_profile(ts, &doc, &params(&["O2"])).unwrap();
        assert_eq!(record.depths, vec![2.0, 5.0, 10.0]);
        assert_eq!(record.values["O2"], vec![Some(8.0), None]);
    }

    #[test]
    fn derived_columns_follow_the_depth_axis() {
        let ts = "2024-01-01T00:00:00Z".parse().unwrap();
        let doc = json!({
            "depth": [-0.5, 2.0, 5.0],
            "conductivity": [42.0, 42.0, 0.0],
            "CTD_tmp": [14.0, 14.0, 14.0]
        });
        let mut record = decode_profile(
            ts,
            &doc,
            &params(&["conductivity", "CTD_tmp"]),
        )
        .unwrap();
        splice_derived(&mut record);
        let sp = &record.values["salinity_practical"];
        assert_eq!(sp.len(), 3);
        assert_eq!(sp[0], None);
        assert!(sp[1].is_some());
        assert_eq!(sp[2], None);
        assert!(record.values["density"][1].unwrap() > 1000.0);
    }
}
