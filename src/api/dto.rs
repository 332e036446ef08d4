use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use super::errors::ApiError;
use crate::{comfort::ThermalComfort, model::FEATURE_COUNT};

/// Body keys for `POST /predict`, in model input order.
pub const REQUIRED_FIELDS: [&str; FEATURE_COUNT] = ["temperature", "humidity", "air_flow", "mrt"];

/// Request body for `POST /predict`.
///
/// Each field may be a number, a numeric string or a boolean.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PredictRequest {
    /// Air temperature, degrees Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Air velocity, metres per second
    pub air_flow: f64,
    /// Mean radiant temperature, degrees Celsius
    pub mrt: f64,
}

impl PredictRequest {
    /// Presence of all four keys is checked before any value is converted,
    /// so a body with one key missing and another malformed reports the
    /// missing key.
    pub fn from_json(body: &Value) -> Result<Self, ApiError> {
        let obj = body.as_object().ok_or(ApiError::MissingFields)?;
        if !REQUIRED_FIELDS.iter().all(|f| obj.contains_key(*f)) {
            return Err(ApiError::MissingFields);
        }

        let mut values = [0.0; FEATURE_COUNT];
        for (slot, field) in values.iter_mut().zip(REQUIRED_FIELDS) {
            *slot = coerce_f64(&obj[field]).ok_or(ApiError::InvalidValues)?;
        }
        let [temperature, humidity, air_flow, mrt] = values;
        Ok(Self { temperature, humidity, air_flow, mrt })
    }

    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.temperature, self.humidity, self.air_flow, self.mrt]
    }
}

/// Finite floats only; NaN and infinities are rejected.
fn coerce_f64(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => return None,
    };
    v.is_finite().then_some(v)
}

/// Response for `POST /predict`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PredictResponse {
    /// Clamped to [-3, 3] and rounded to two decimals
    pub pmv: f64,
    pub thermal_comfort: ThermalComfort,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Body of every non-2xx JSON response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
