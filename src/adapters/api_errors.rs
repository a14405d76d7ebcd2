use crate::domain::error::ReconError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Adapter wrapper mapping hard reconciliation failures onto HTTP. Only
/// gateway fetches and durable writes are allowed to reach this; every
/// soft condition is acknowledged upstream with a 200.
pub struct ApiError(pub ReconError);

impl From<ReconError> for ApiError {
    fn from(err: ReconError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            ReconError::Gateway(err) => {
                tracing::error!(error = %err, "gateway fetch failed, asking provider to retry");
                (StatusCode::BAD_GATEWAY, "gateway_error")
            }
            ReconError::Store(err) => {
                tracing::error!(error = %err, "durable write failed, asking provider to retry");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
            ReconError::Validation(msg) => {
                tracing::error!(error = %msg, "validation failure escaped to the edge");
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error")
            }
        };

        let body = serde_json::json!({
            "error_code": error_code,
            "message": "reconciliation failed, delivery will be retried",
        });

        (status, Json(body)).into_response()
    }
}
