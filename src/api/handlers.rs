use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::info;
use utoipa::OpenApi;

use super::{
    dto::{ErrorResponse, MessageResponse, PredictRequest, PredictResponse},
    errors::ApiError,
    AppState,
};
use crate::{
    comfort::{classify, ThermalComfort},
    export::{readings_to_csv, CSV_ATTACHMENT},
    store::{models::local_timestamp, NewSensorReading, SensorReading, SortOrder},
};

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Liveness message.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running", body = MessageResponse),
    ),
    tag = "system"
)]
pub async fn home() -> Json<MessageResponse> {
    Json(MessageResponse::new("PMV Prediction API is running!"))
}

/// Predict PMV from four environmental readings, classify it, and store the
/// reading. Only the derived values are returned.
#[utoipa::path(
    post,
    path = "/predict",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Predicted PMV and comfort label", body = PredictResponse),
        (status = 400, description = "Missing or non-numeric fields", body = ErrorResponse),
        (status = 500, description = "Model not loaded or store insert failed", body = ErrorResponse),
    ),
    tag = "prediction"
)]
pub async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let model = state.model.get().ok_or(ApiError::ModelNotLoaded)?;
    let Json(body) =
        body.map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))?;
    let request = PredictRequest::from_json(&body)?;

    let raw = model.predict_raw(&request.features())?;
    let (pmv, thermal_comfort) = classify(raw);

    let reading = NewSensorReading {
        time: local_timestamp(Utc::now(), state.utc_offset_hours),
        temperature: request.temperature,
        humidity: request.humidity,
        air_flow: request.air_flow,
        mrt: request.mrt,
        pmv,
        thermal_comfort,
    };
    state.store.insert(&reading).await?;

    info!(raw, pmv, thermal_comfort = %thermal_comfort, time = %reading.time, "Prediction stored");
    Ok(Json(PredictResponse { pmv, thermal_comfort }))
}

/// Fetch the most recent reading.
#[utoipa::path(
    get,
    path = "/sensor-data",
    responses(
        (status = 200, description = "Latest sensor reading", body = SensorReading),
        (status = 404, description = "No readings stored", body = ErrorResponse),
        (status = 500, description = "Store request failed", body = ErrorResponse),
    ),
    tag = "sensor-data"
)]
pub async fn get_latest(State(state): State<AppState>) -> Result<Json<SensorReading>, ApiError> {
    let latest = state
        .store
        .select_ordered(SortOrder::Descending, Some(1))
        .await?
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("No data found!"))?;
    Ok(Json(latest))
}

/// Fetch every reading, newest first.
#[utoipa::path(
    get,
    path = "/sensor-data/history",
    responses(
        (status = 200, description = "All sensor readings, newest first", body = Vec<SensorReading>),
        (status = 500, description = "Store request failed", body = ErrorResponse),
    ),
    tag = "sensor-data"
)]
pub async fn get_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<SensorReading>>, ApiError> {
    let rows = state.store.select_ordered(SortOrder::Descending, None).await?;
    Ok(Json(rows))
}

/// Delete a reading by id.
#[utoipa::path(
    delete,
    path = "/sensor-data/{id}",
    params(
        ("id" = i64, Path, description = "Reading id"),
    ),
    responses(
        (status = 200, description = "Reading deleted", body = MessageResponse),
        (status = 404, description = "No reading with this id", body = ErrorResponse),
        (status = 500, description = "Store request failed", body = ErrorResponse),
    ),
    tag = "sensor-data"
)]
pub async fn delete_reading(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state.store.delete_by_id(id).await?;
    if deleted == 0 {
        return Err(ApiError::NotFound("Data not found!"));
    }
    info!(id, deleted, "Sensor reading deleted");
    Ok(Json(MessageResponse::new("Data deleted!")))
}

/// Download every reading as CSV, newest first.
#[utoipa::path(
    get,
    path = "/export-csv",
    responses(
        (status = 200, description = "CSV attachment", content_type = "text/csv", body = String),
        (status = 500, description = "Store request failed", body = ErrorResponse),
    ),
    tag = "sensor-data"
)]
pub async fn export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let rows = state.store.select_ordered(SortOrder::Descending, None).await?;
    let body = readings_to_csv(&rows)?;
    info!(rows = rows.len(), "CSV export generated");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, CSV_ATTACHMENT),
        ],
        body,
    ))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(home, predict, get_latest, get_history, delete_reading, export_csv),
    components(schemas(
        PredictRequest,
        PredictResponse,
        MessageResponse,
        ErrorResponse,
        SensorReading,
        ThermalComfort
    )),
    tags(
        (name = "prediction",  description = "PMV inference"),
        (name = "sensor-data", description = "Stored sensor readings"),
        (name = "system",      description = "System endpoints"),
    ),
    info(
        title = "PMV Prediction API",
        version = "0.1.0",
        description = "Thermal comfort prediction and sensor history"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
