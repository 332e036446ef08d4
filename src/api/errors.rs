use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Every failure a handler can return. Rendered as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Artifacts failed to load at startup.
    #[error("Model or Scaler not loaded")]
    ModelNotLoaded,
    #[error("Missing required fields!")]
    MissingFields,
    #[error("Invalid input values!")]
    InvalidValues,
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(&'static str),
    /// Store or inference failure, surfaced with its raw message.
    #[error("{0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ModelNotLoaded | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingFields | ApiError::InvalidValues | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Upstream(e) => error!(error = %format!("{e:#}"), "Request failed"),
            ApiError::ModelNotLoaded => warn!("Prediction requested but model is not loaded"),
            _ => {}
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::ModelNotLoaded.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::MissingFields.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidValues.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn upstream_message_includes_cause_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("connection refused"));
        let err = ApiError::from(err.context("Supabase insert request failed").unwrap_err());
        assert_eq!(err.to_string(), "Supabase insert request failed: connection refused");
    }
}
