//! Time-bucket averaging for scalar and depth-profile records.
//!
//! Buckets are anchored to the Unix epoch so the same record always lands
//! in the same bucket regardless of the queried window. Empty buckets
//! inside the observed span are emitted with null values rather than
//! skipped, so gaps in coverage stay visible downstream.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

/// One scalar record, either raw from storage or a bucket average.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub recorded_at: DateTime<Utc>,
    pub values: BTreeMap<String, Option<f64>>,
}

/// One depth-profile record: parallel arrays indexed by the depth axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    pub recorded_at: DateTime<Utc>,
    pub depths: Vec<f64>,
    pub values: BTreeMap<String, Vec<Option<f64>>>,
}

/// Bucketed profile output: `values[param][bucket][depth]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileGrid {
    pub buckets: Vec<DateTime<Utc>>,
    pub depths: Vec<f64>,
    pub values: BTreeMap<String, Vec<Vec<Option<f64>>>>,
}

/// Floor a timestamp to its epoch-anchored bucket of `width_hours`.
pub fn bucket_floor(ts: DateTime<Utc>, width_hours: i64) -> DateTime<Utc> {
    let width_ms = width_hours.max(1) * 3_600_000;
    let floored = ts.timestamp_millis().div_euclid(width_ms) * width_ms;
    Utc.timestamp_millis_opt(floored).single().unwrap_or(ts)
}

fn is_missing(value: Option<f64>, zero_is_missing: bool) -> bool {
    match value {
        None => true,
        Some(v) => !v.is_finite() || (zero_is_missing && v == 0.0),
    }
}

/// Average scalar records into fixed-width buckets. Every bucket between
/// the earliest and latest observed bucket is present in the output, with
/// `None` for params that had no usable sample in that bucket. When
/// `zero_is_missing` is set, exact zeros are treated as sensor dropouts
/// and excluded from the mean.
pub fn aggregate_readings(
    records: &[Reading],
    width_hours: i64,
    params: &[String],
    zero_is_missing: bool,
) -> Vec<Reading> {
    if records.is_empty() {
        return Vec::new();
    }
    let width = width_hours.max(1);

    let mut sums: BTreeMap<DateTime<Utc>, BTreeMap<&str, (f64, u64)>> = BTreeMap::new();
    for record in records {
        let bucket = bucket_floor(record.recorded_at, width);
        let slot = sums.entry(bucket).or_default();
        for param in params {
            let value = record.values.get(param).copied().flatten();
            if is_missing(value, zero_is_missing) {
                continue;
            }
            let cell = slot.entry(param.as_str()).or_insert((0.0, 0));
            cell.0 += value.unwrap_or(0.0);
            cell.1 += 1;
        }
    }

    let (Some(&first), Some(&last)) = (sums.keys().next(), sums.keys().next_back()) else {
        return Vec::new();
    };
    let step = Duration::hours(width);

    let mut out = Vec::new();
    let mut bucket = first;
    while bucket <= last {
        let slot = sums.get(&bucket);
        let values = params
            .iter()
            .map(|param| {
                let mean = slot
                    .and_then(|s| s.get(param.as_str()))
                    .map(|(sum, count)| sum / *count as f64);
                (param.clone(), mean)
            })
            .collect();
        out.push(Reading {
            recorded_at: bucket,
            values,
        });
        bucket += step;
    }
    out
}

/// Average profile records into fixed-width buckets along a shared depth
/// axis. The axis comes from the first record; later records are padded
/// with `None` or truncated to fit. Zeros always count as missing for
/// profile params. Fails only when the first record carries no depth
/// axis at all.
pub fn aggregate_profiles(
    records: &[ProfileRecord],
    width_hours: i64,
    params: &[String],
) -> Result<ProfileGrid, String> {
    let params = dedup_params(params);
    let params = params.as_slice();
    let Some(first) = records.first() else {
        return Ok(empty_grid(params));
    };
    if first.depths.is_empty() {
        return Err("profile aggregation requires a non-empty depth axis on the first record"
            .to_string());
    }
    let depths = first.depths.clone();
    let depth_count = depths.len();
    let width = width_hours.max(1);

    type Cells = Vec<(f64, u64)>;
    let mut sums: BTreeMap<DateTime<Utc>, BTreeMap<&str, Cells>> = BTreeMap::new();
    for record in records {
        let bucket = bucket_floor(record.recorded_at, width);
        let slot = sums.entry(bucket).or_default();
        for param in params {
            let Some(column) = record.values.get(param) else {
                continue;
            };
            let cells = slot
                .entry(param.as_str())
                .or_insert_with(|| vec![(0.0, 0); depth_count]);
            for (i, cell) in cells.iter_mut().enumerate() {
                let value = column.get(i).copied().flatten();
                if is_missing(value, true) {
                    continue;
                }
                cell.0 += value.unwrap_or(0.0);
                cell.1 += 1;
            }
        }
    }

    let (Some(&first_bucket), Some(&last_bucket)) = (sums.keys().next(), sums.keys().next_back())
    else {
        return Ok(empty_grid(params));
    };
    let step = Duration::hours(width);

    let mut grid = empty_grid(params);
    grid.depths = depths;
    let mut bucket = first_bucket;
    while bucket <= last_bucket {
        grid.buckets.push(bucket);
        let slot = sums.get(&bucket);
        for param in params {
            let row = slot
                .and_then(|s| s.get(param.as_str()))
                .map(|cells| {
                    cells
                        .iter()
                        .map(|(sum, count)| (*count > 0).then(|| sum / *count as f64))
                        .collect()
                })
                .unwrap_or_else(|| vec![None; depth_count]);
            if let Some(rows) = grid.values.get_mut(param) {
                rows.push(row);
            }
        }
        bucket += step;
    }
    Ok(grid)
}

/// Raw passthrough counterpart of [`aggregate_profiles`]: one grid row per
/// record at its original timestamp, zeros mapped to `None`.
pub fn profile_grid_raw(
    records: &[ProfileRecord],
    params: &[String],
) -> Result<ProfileGrid, String> {
    let params = dedup_params(params);
    let params = params.as_slice();
    let Some(first) = records.first() else {
        return Ok(empty_grid(params));
    };
    if first.depths.is_empty() {
        return Err("profile aggregation requires a non-empty depth axis on the first record"
            .to_string());
    }
    let depths = first.depths.clone();
    let depth_count = depths.len();

    let mut grid = empty_grid(params);
    grid.depths = depths;
    for record in records {
        grid.buckets.push(record.recorded_at);
        for param in params {
            let row = (0..depth_count)
                .map(|i| {
                    let value = record
                        .values
                        .get(param)
                        .and_then(|column| column.get(i))
                        .copied()
                        .flatten();
                    if is_missing(value, true) {
                        None
                    } else {
                        value
                    }
                })
                .collect();
            if let Some(rows) = grid.values.get_mut(param) {
                rows.push(row);
            }
        }
    }
    Ok(grid)
}

// A repeated name would push one row per occurrence into the same map
// entry, breaking the one-row-per-bucket shape of the grid.
fn dedup_params(params: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(params.len());
    for param in params {
        if !out.contains(param) {
            out.push(param.clone());
        }
    }
    out
}

fn empty_grid(params: &[String]) -> ProfileGrid {
    ProfileGrid {
        buckets: Vec::new(),
        depths: Vec::new(),
        values: params
            .iter()
            .map(|p| (p.clone(), Vec::new()))
            .collect(),
    }
}

/// Stride-decimate a series down to at most `ceiling` points. The first
/// and last elements of the input always survive.
pub fn downsample<T: Clone>(records: &[T], ceiling: usize) -> Vec<T> {
    let ceiling = ceiling.max(1);
    if records.len() <= ceiling {
        return records.to_vec();
    }
    let stride = records.len().div_ceil(ceiling);
    let mut out: Vec<T> = records.iter().step_by(stride).cloned().collect();
    if let (Some(tail), Some(last)) = (out.last_mut(), records.last()) {
        *tail = last.clone();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ts: &str, values: &[(&str, Option<f64>)]) -> Reading {
        Reading {
            recorded_at: ts.parse().unwrap(),
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn bucket_floor_is_epoch_anchored() {
        let ts = "2024-03-15T14:37:12Z".parse().unwrap();
        let floored = bucket_floor(ts, 3);
        assert_eq!(floored, "2024-03-15T12:00:00Z".parse::<DateTime<Utc>>().unwrap());
        assert_eq!(bucket_floor(floored, 3), floored);
    }

    #[test]
    fn zero_and_null_are_excluded_from_means() {
        let records = vec![
            reading("2024-01-01T00:10:00Z", &[("temp", Some(0.0))]),
            reading("2024-01-01T00:20:00Z", &[("temp", Some(5.0))]),
            reading("2024-01-01T00:30:00Z", &[("temp", None)]),
            reading("2024-01-01T00:40:00Z", &[("temp", Some(10.0))]),
        ];
        let out = aggregate_readings(&records, 1, &params(&["temp"]), true);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].values["temp"], Some(7.5));
    }

    #[test]
    fn zeros_count_when_not_flagged_missing() {
        let records = vec![
            reading("2024-01-01T00:10:00Z", &[("rain", Some(0.0))]),
            reading("2024-01-01T00:20:00Z", &[("rain", Some(4.0))]),
        ];
        let out = aggregate_readings(&records, 1, &params(&["rain"]), false);
        assert_eq!(out[0].values["rain"], Some(2.0));
    }

    #[test]
    fn interior_gap_buckets_are_emitted_as_null() {
        let records = vec![
            reading("2024-01-01T00:00:00Z", &[("temp", Some(1.0))]),
            reading("2024-01-01T06:30:00Z", &[("temp", Some(3.0))]),
        ];
        let out = aggregate_readings(&records, 1, &params(&["temp"]), true);
        assert_eq!(out.len(), 7);
        assert_eq!(out[0].values["temp"], Some(1.0));
        for bucket in &out[1..6] {
            assert_eq!(bucket.values["temp"], None);
        }
        assert_eq!(out[6].values["temp"], Some(3.0));
    }

    #[test]
    fn empty_input_aggregates_to_empty() {
        assert!(aggregate_readings(&[], 6, &params(&["temp"]), true).is_empty());
    }

    #[test]
    fn aggregation_is_idempotent_on_bucket_timestamps() {
        let records = vec![
            reading("2024-01-01T00:14:00Z", &[("temp", Some(2.0))]),
            reading("2024-01-01T02:50:00Z", &[("temp", Some(4.0))]),
            reading("2024-01-01T07:05:00Z", &[("temp", Some(6.0))]),
        ];
        let once = aggregate_readings(&records, 3, &params(&["temp"]), true);
        let twice = aggregate_readings(&once, 3, &params(&["temp"]), true);
        assert_eq!(once, twice);
    }

    #[test]
    fn short_profile_arrays_are_padded_with_null() {
        let record = ProfileRecord {
            recorded_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            depths: vec![2.0, 5.0, 10.0],
            values: [("O2".to_string(), vec![Some(8.0), Some(7.5)])]
                .into_iter()
                .collect(),
        };
        let grid = aggregate_profiles(&[record], 1, &params(&["O2"])).unwrap();
        assert_eq!(grid.depths, vec![2.0, 5.0, 10.0]);
        assert_eq!(grid.values["O2"][0], vec![Some(8.0), Some(7.5), None]);
    }

    #[test]
    fn profile_without_depth_axis_is_an_error() {
        let record = ProfileRecord {
            recorded_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            depths: vec![],
            values: BTreeMap::new(),
        };
        assert!(aggregate_profiles(&[record], 1, &params(&["O2"])).is_err());
    }

    #[test]
    fn profile_gap_buckets_are_all_null_rows() {
        let mk = |ts: &str, v: f64| ProfileRecord {
            recorded_at: ts.parse().unwrap(),
            depths: vec![2.0, 5.0],
            values: [("O2".to_string(), vec![Some(v), Some(v)])]
                .into_iter()
                .collect(),
        };
        let grid = aggregate_profiles(
            &[mk("2024-01-01T00:00:00Z", 8.0), mk("2024-01-01T06:00:00Z", 7.0)],
            3,
            &params(&["O2"]),
        )
        .unwrap();
        assert_eq!(grid.buckets.len(), 3);
        assert_eq!(grid.values["O2"][1], vec![None, None]);
    }

    #[test]
    fn repeated_param_names_keep_one_row_per_bucket() {
        let record = ProfileRecord {
            recorded_at: "2024-01-01T00:00:00Z".parse().unwrap(),
            depths: vec![2.0, 5.0],
            values: [("O2".to_string(), vec![Some(8.0), Some(7.5)])]
                .into_iter()
                .collect(),
        };
        let params = params(&["O2", "O2"]);
        let grid = aggregate_profiles(std::slice::from_ref(&record), 1, &params).unwrap();
        assert_eq!(grid.buckets.len(), 1);
        assert_eq!(grid.values["O2"].len(), grid.buckets.len());

        let raw = profile_grid_raw(&[record], &params).unwrap();
        assert_eq!(raw.buckets.len(), 1);
        assert_eq!(raw.values["O2"].len(), raw.buckets.len());
    }

    #[test]
    fn downsample_preserves_endpoints_and_ceiling() {
        let records: Vec<u64> = (0..120_000).collect();
        let out = downsample(&records, 50_000);
        assert_eq!(out.len(), 40_000);
        assert_eq!(out.first(), Some(&0));
        assert_eq!(out.last(), Some(&119_999));
        assert_eq!(out[1], 3);
    }

    #[test]
    fn downsample_passes_small_series_through() {
        let records: Vec<u64> = (0..100).collect();
        assert_eq!(downsample(&records, 50_000), records);
    }
}
