pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use handlers::ApiDoc;

use crate::{model::ModelState, store::DynStore};

/// Shared by every handler. The model is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub model: ModelState,
    pub store: DynStore,
    /// Hours added to UTC when stamping new readings.
    pub utc_offset_hours: i32,
}

impl AppState {
    pub fn new(model: ModelState, store: DynStore, utc_offset_hours: i32) -> Self {
        Self { model, store, utc_offset_hours }
    }
}

pub fn router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route("/", get(handlers::home))
        .route("/predict", post(handlers::predict))
        .route("/sensor-data", get(handlers::get_latest))
        .route("/sensor-data/history", get(handlers::get_history))
        .route("/sensor-data/{id}", delete(handlers::delete_reading))
        .route("/export-csv", get(handlers::export_csv))
        .with_state(state)
        .split_for_parts();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
