//! Station metadata and per-kind parameter schemas.
//!
//! Each station kind carries its own scalar parameter set, missing-value
//! convention, and display labels. The shared aggregation path is
//! parameterized by these so adding a kind means adding schema entries,
//! not another pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;
use sqlx::types::Json as SqlJson;
use sqlx::PgPool;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationKind {
    /// Moored ocean buoy with surface scalars and CTD depth profiles.
    Buoy,
    /// Fixed meteorological mast.
    Meteo,
    /// Optical aerosol spectrometer.
    Fidas,
    /// Compact multi-sensor box with nested per-sensor readings.
    IotBox,
}

impl StationKind {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "buoy" => Self::Buoy,
            "meteo" => Self::Meteo,
            "fidas" => Self::Fidas,
            _ => Self::IotBox,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buoy => "buoy",
            Self::Meteo => "meteo",
            Self::Fidas => "fidas",
            Self::IotBox => "iot",
        }
    }

    pub fn scalar_params(self) -> &'static [&'static str] {
        match self {
            Self::Buoy => &[
                "wind_speed",
                "wind_direction",
                "air_temp",
                "barometric_pressure",
                "albedo",
            ],
            Self::Meteo => &[
                "I3_VPOWER",
                "I4_VOUT",
                "S1_RAD",
                "S2_DP[C]",
                "S2_PA",
                "S2_PREC[MM]",
                "S2_RH[%]",
                "S2_TA[C]",
                "S2_WD",
                "S2_WS[M/S]",
            ],
            Self::Fidas => &[
                "PM1", "PM2.5", "PM4", "PM10", "PMtot", "Cn", "rH", "dewT", "T", "p", "Wspeed",
                "Wdir", "Wq", "prec", "ptype", "flowrate", "velocity", "coincidence", "po",
                "IADS_T", "cd", "LED_T", "errors", "mode", "PM1a", "PM2.5a", "PM4a", "PM10a",
                "PMtota", "PM1c", "PM2.5c", "PM4c", "PM10c", "PMtotc", "PMth", "PMal", "PMre",
                "pT", "feelLike", "hIdx_nws", "wbgt",
            ],
            Self::IotBox => &[
                "temperature",
                "humidity",
                "pressure",
                "co2",
                "pm1mass",
                "pm2.5mass",
                "pm10mass",
                "pm1count",
                "pm2.5count",
                "pm10count",
            ],
        }
    }

    /// Depth-profile params; only buoys carry a vertical sensor string.
    pub fn profile_params(self) -> &'static [&'static str] {
        match self {
            Self::Buoy => &["CTD_tmp", "conductivity", "O2", "chlorophyll"],
            _ => &[],
        }
    }

    /// Profile quantities computed per query from conductivity,
    /// temperature, and depth rather than read from storage.
    pub fn derived_params(self) -> &'static [&'static str] {
        match self {
            Self::Buoy => &["salinity_practical", "salinity_absolute", "density"],
            _ => &[],
        }
    }

    /// Whether an exact zero in a scalar field means "no reading" for
    /// this kind. Buoy loggers emit zero on dropout; the other kinds
    /// report real zeros (calm wind, dry spells).
    pub fn zero_is_missing(self) -> bool {
        matches!(self, Self::Buoy)
    }

    pub fn label(self, param: &str) -> String {
        let known = match (self, param) {
            (Self::Buoy, "wind_speed") => Some("Wind Speed (m/s)"),
            (Self::Buoy, "wind_direction") => Some("Wind Direction (°)"),
            (Self::Buoy, "air_temp") => Some("Air Temperature (°C)"),
            (Self::Buoy, "barometric_pressure") => Some("Barometric Pressure (hPa)"),
            (Self::Buoy, "albedo") => Some("Albedo"),
            (Self::Buoy, "CTD_tmp") => Some("CTD Temperature (°C)"),
            (Self::Buoy, "conductivity") => Some("Conductivity (mmho/cm)"),
            (Self::Buoy, "O2") => Some("Oxygen (μM/L)"),
            (Self::Buoy, "chlorophyll") => Some("Chlorophyll (µg/L)"),
            (Self::Buoy, "salinity_practical") => Some("Practical Salinity (PSU)"),
            (Self::Buoy, "salinity_absolute") => Some("Absolute Salinity (g/kg)"),
            (Self::Buoy, "density") => Some("Density (kg/m³)"),
            (Self::Meteo, "I3_VPOWER") => Some("Voltage Power (V)"),
            (Self::Meteo, "I4_VOUT") => Some("Voltage Output (V)"),
            (Self::Meteo, "S1_RAD") => Some("Radiation (W/m²)"),
            (Self::Meteo, "S2_DP[C]") => Some("Dew Point (°C)"),
            (Self::Meteo, "S2_PA") => Some("Atmospheric Pressure (hPa)"),
            (Self::Meteo, "S2_PREC[MM]") => Some("Precipitation (mm)"),
            (Self::Meteo, "S2_RH[%]") => Some("Relative Humidity (%)"),
            (Self::Meteo, "S2_TA[C]") => Some("Temperature (°C)"),
            (Self::Meteo, "S2_WD") => Some("Wind Direction (°)"),
            (Self::Meteo, "S2_WS[M/S]") => Some("Wind Speed (m/s)"),
            (Self::Fidas, "PM1") => Some("PM1 (µg/m³)"),
            (Self::Fidas, "PM2.5") => Some("PM2.5 (µg/m³)"),
            (Self::Fidas, "PM4") => Some("PM4 (µg/m³)"),
            (Self::Fidas, "PM10") => Some("PM10 (µg/m³)"),
            (Self::Fidas, "PMtot") => Some("Total PM (µg/m³)"),
            (Self::Fidas, "Cn") => Some("Count Number (particles/cm³)"),
            (Self::Fidas, "rH") => Some("Relative Humidity (%)"),
            (Self::Fidas, "dewT") => Some("Dew Point (°C)"),
            (Self::Fidas, "T") => Some("Temperature (°C)"),
            (Self::Fidas, "p") => Some("Pressure (hPa)"),
            (Self::Fidas, "Wspeed") => Some("Wind Speed (km/h)"),
            (Self::Fidas, "Wdir") => Some("Wind Direction (°)"),
            (Self::Fidas, "prec") => Some("Precipitation Intensity (l/m²/h)"),
            (Self::Fidas, "flowrate") => Some("Flowrate (l/min)"),
            (Self::IotBox, "temperature") => Some("Temperature (°C)"),
            (Self::IotBox, "humidity") => Some("Humidity (%)"),
            (Self::IotBox, "pressure") => Some("Atmospheric Pressure (hPa)"),
            (Self::IotBox, "co2") => Some("CO2 (ppm)"),
            (Self::IotBox, "pm1mass") => Some("PM1 Mass (µg/m³)"),
            (Self::IotBox, "pm2.5mass") => Some("PM2.5 Mass (µg/m³)"),
            (Self::IotBox, "pm10mass") => Some("PM10 Mass (µg/m³)"),
            (Self::IotBox, "pm1count") => Some("PM1 Count (particles/cm³)"),
            (Self::IotBox, "pm2.5count") => Some("PM2.5 Count (particles/cm³)"),
            (Self::IotBox, "pm10count") => Some("PM10 Count (particles/cm³)"),
            _ => None,
        };
        match known {
            Some(label) => label.to_string(),
            None => param.replace('_', " "),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Station {
    pub station_num: i32,
    pub name: String,
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
    pub sensors: SqlJson<JsonValue>,
    pub last_seen_at: Option<DateTime<Utc>>,
}

impl Station {
    pub fn station_kind(&self) -> StationKind {
        StationKind::parse(&self.kind)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StationResponse {
    pub station_num: i32,
    pub name: String,
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
    pub sensors: JsonValue,
    pub last_seen_at: Option<String>,
    pub scalar_params: Vec<String>,
    pub profile_params: Vec<String>,
    pub derived_params: Vec<String>,
}

impl From<Station> for StationResponse {
    fn from(station: Station) -> Self {
        let kind = station.station_kind();
        Self {
            station_num: station.station_num,
            name: station.name,
            kind: kind.as_str().to_string(),
            latitude: station.latitude,
            longitude: station.longitude,
            sensors: station.sensors.0,
            last_seen_at: station.last_seen_at.map(|ts| ts.to_rfc3339()),
            scalar_params: kind.scalar_params().iter().map(|p| p.to_string()).collect(),
            profile_params: kind
                .profile_params()
                .iter()
                .map(|p| p.to_string())
                .collect(),
            derived_params: kind
                .derived_params()
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

pub async fn fetch_stations(db: &PgPool) -> Result<Vec<Station>, sqlx::Error> {
    sqlx::query_as::<_, Station>(
        r#"
        SELECT station_num, name, kind, latitude, longitude, sensors, last_seen_at
        FROM stations
        ORDER BY station_num
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn fetch_station(
    db: &PgPool,
    station_num: i32,
) -> Result<Option<Station>, sqlx::Error> {
    sqlx::query_as::<_, Station>(
        r#"
        SELECT station_num, name, kind, latitude, longitude, sensors, last_seen_at
        FROM stations
        WHERE station_num = $1
        "#,
    )
    .bind(station_num)
    .fetch_optional(db)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_defaults_to_iot() {
        assert_eq!(StationKind::parse("weatherball"), StationKind::IotBox);
        assert_eq!(StationKind::parse("Buoy"), StationKind::Buoy);
    }

    #[test]
    fn only_buoys_have_profiles_and_zero_sentinel() {
        assert!(!StationKind::Buoy.profile_params().is_empty());
        assert!(StationKind::Fidas.profile_params().is_empty());
        assert!(StationKind::Buoy.zero_is_missing());
        assert!(!StationKind::Meteo.zero_is_missing());
    }

    #[test]
    fn buoy_station_response_lists_derived_params() {
        let station = Station {
            station_num: 1,
            name: "Buoy 01".to_string(),
            kind: "buoy".to_string(),
            latitude: 40.9,
            longitude: 27.5,
            sensors: SqlJson(serde_json::json!({})),
            last_seen_at: None,
        };
        let response = StationResponse::from(station);
        assert_eq!(
            response.derived_params,
            vec!["salinity_practical", "salinity_absolute", "density"]
        );
        assert!(StationKind::Meteo.derived_params().is_empty());
    }

    #[test]
    fn labels_fall_back_to_the_raw_name() {
        assert_eq!(
            StationKind::Buoy.label("wind_speed"),
            "Wind Speed (m/s)"
        );
        assert_eq!(StationKind::Fidas.label("wbgt"), "wbgt");
        assert_eq!(StationKind::IotBox.label("dew_point"), "dew point");
    }
}
