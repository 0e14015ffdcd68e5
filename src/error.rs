use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures surfaced to API callers.
///
/// Language-detection problems never appear here; they are folded into the
/// default language by the identifier.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidRequest(String),

    /// Normalization, tokenization, engine or decoding failure
    #[error("{0:#}")]
    Pipeline(#[from] anyhow::Error),

    /// The blocking worker running the engine panicked or was cancelled
    #[error("Translation worker failed: {0}")]
    EngineTask(String),

    #[error("Translation service is shutting down")]
    GateClosed,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::Pipeline(_) | GatewayError::EngineTask(_) | GatewayError::GateClosed => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        (status, body).into_response()
    }
}
