use crate::api::response::ApiResponse;
use crate::services::staging::StagingError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures of the upload and delete handlers.
///
/// Every variant is rendered as `{"error": "<message>"}` with status 200.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    FormParse(String),

    #[error("{0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("Error uploading file to S3: {0}")]
    BackendUpload(String),

    #[error("Error deleting file from S3: {0}")]
    BackendDelete(String),

    #[error("Error initializing S3 client: {0}")]
    BackendClientInit(String),
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match &self {
            GatewayError::Staging(StagingError::IoFailure(e)) => {
                tracing::error!("Staging error: {:?}", e);
            }
            GatewayError::BackendUpload(msg) => tracing::error!("Error uploading file: {}", msg),
            GatewayError::BackendDelete(msg) => tracing::error!("Error deleting file: {}", msg),
            GatewayError::BackendClientInit(msg) => {
                tracing::error!("Error initializing client: {}", msg)
            }
            other => tracing::debug!("Rejected request: {}", other),
        }

        let body = Json(ApiResponse::failure(self.to_string()));

        // Outcome is carried by the body shape only.
        (StatusCode::OK, body).into_response()
    }
}
