use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use utoipa::ToSchema;

use crate::comfort::ThermalComfort;

/// Format of the `time` column: local wall-clock without a zone suffix.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A row of the `sensor_data` table as returned by the store.
///
/// Passed through untouched: nulls stay null, numbers keep their JSON form
/// (`60` is not rewritten as `60.0`), and columns not named here are carried
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SensorReading {
    pub id: i64,
    /// Local wall-clock time (UTC plus the configured offset), ISO-8601.
    pub time: Option<String>,
    /// Degrees Celsius
    #[schema(value_type = Option<f64>)]
    pub temperature: Option<Number>,
    /// Relative humidity percentage
    #[schema(value_type = Option<f64>)]
    pub humidity: Option<Number>,
    /// Metres per second
    #[schema(value_type = Option<f64>)]
    pub air_flow: Option<Number>,
    /// Mean radiant temperature, degrees Celsius
    #[schema(value_type = Option<f64>)]
    pub mrt: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub pmv: Option<Number>,
    pub thermal_comfort: Option<String>,
    /// Any other column of the table, e.g. `created_at`.
    #[serde(flatten)]
    #[schema(ignore)]
    pub extra: Map<String, Value>,
}

/// Insert payload. The store assigns `id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewSensorReading {
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub air_flow: f64,
    pub mrt: f64,
    pub pmv: f64,
    pub thermal_comfort: ThermalComfort,
}

impl NewSensorReading {
    pub fn into_reading(self, id: i64) -> SensorReading {
        SensorReading {
            id,
            time: Some(self.time),
            temperature: Number::from_f64(self.temperature),
            humidity: Number::from_f64(self.humidity),
            air_flow: Number::from_f64(self.air_flow),
            mrt: Number::from_f64(self.mrt),
            pmv: Number::from_f64(self.pmv),
            thermal_comfort: Some(self.thermal_comfort.to_string()),
            extra: Map::new(),
        }
    }
}

/// Render `now` shifted by `offset_hours` as a zone-less local timestamp.
pub fn local_timestamp(now: DateTime<Utc>, offset_hours: i32) -> String {
    (now.naive_utc() + Duration::hours(offset_hours.into()))
        .format(TIME_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn local_timestamp_applies_offset() {
        let now = Utc.with_ymd_and_hms(2025, 5, 14, 3, 20, 30).unwrap();
        assert_eq!(local_timestamp(now, 7), "2025-05-14T10:20:30.000000");
    }

    #[test]
    fn local_timestamp_rolls_over_midnight() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 20, 0, 0).unwrap()
            + Duration::microseconds(1234);
        assert_eq!(local_timestamp(now, 7), "2026-01-01T03:00:00.001234");
    }

    #[test]
    fn local_timestamp_negative_offset() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
        assert_eq!(local_timestamp(now, -5), "2024-12-31T21:00:00.000000");
    }

    #[test]
    fn insert_payload_has_no_id_and_verbatim_label() {
        let reading = NewSensorReading {
            time: "2025-05-14T10:20:30.000000".into(),
            temperature: 26.5,
            humidity: 60.0,
            air_flow: 0.1,
            mrt: 27.0,
            pmv: 1.2,
            thermal_comfort: ThermalComfort::ABitWarm,
        };
        let json = serde_json::to_value(&reading).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["thermal_comfort"], "A bit Warm");
        assert_eq!(json["air_flow"], 0.1);
    }

    #[test]
    fn row_round_trips_extra_columns_and_integers() {
        let stored = json!({
            "id": 3,
            "created_at": "2025-05-14T03:20:30+00:00",
            "time": "2025-05-14T10:20:30.000000",
            "temperature": 26.5,
            "humidity": 60,
            "air_flow": 0.1,
            "mrt": 27,
            "pmv": 1.2,
            "thermal_comfort": "A bit Warm"
        });
        let row: SensorReading = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(row.id, 3);
        assert_eq!(row.extra["created_at"], "2025-05-14T03:20:30+00:00");

        let out = serde_json::to_value(&row).unwrap();
        assert_eq!(out, stored);
        assert_eq!(serde_json::to_string(&out["humidity"]).unwrap(), "60");
    }

    #[test]
    fn row_with_null_columns_is_kept() {
        let stored = json!({
            "id": 4,
            "time": "2025-05-14T10:20:30.000000",
            "temperature": 26.5,
            "humidity": 60,
            "air_flow": null,
            "mrt": 27,
            "pmv": null,
            "thermal_comfort": null
        });
        let row: SensorReading = serde_json::from_value(stored.clone()).unwrap();
        assert!(row.air_flow.is_none());
        assert!(row.thermal_comfort.is_none());
        assert!(row.extra.is_empty());
        assert_eq!(serde_json::to_value(&row).unwrap(), stored);
    }

    #[test]
    fn stored_insert_keeps_float_values() {
        let row = NewSensorReading {
            time: "2025-05-14T10:20:30.000000".into(),
            temperature: 26.5,
            humidity: 60.0,
            air_flow: 0.1,
            mrt: 27.0,
            pmv: -1.01,
            thermal_comfort: ThermalComfort::ABitCool,
        }
        .into_reading(9);
        assert_eq!(row.id, 9);
        assert_eq!(row.humidity.as_ref().and_then(Number::as_f64), Some(60.0));
        assert_eq!(row.thermal_comfort.as_deref(), Some("A Bit Cool"));
    }
}
