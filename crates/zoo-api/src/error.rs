//! HTTP error mapping. Internal error text is logged, never returned.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use zoo_query::QueryError;
use zoo_types::{ErrorResponse, RegistryError};

pub const NOT_FOUND: &str = "NOT_FOUND";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error_code: NOT_FOUND.to_string(),
                    message: msg.clone(),
                },
            ),
            ApiError::Query(e) if e.is_validation() => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error_code: e.code().to_string(),
                    message: e.public_message(),
                },
            ),
            ApiError::Query(e) => {
                tracing::error!(error = %e, "query request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: e.code().to_string(),
                        message: e.public_message(),
                    },
                )
            }
            ApiError::Registry(e) => {
                tracing::error!(error = %e, "registry request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error_code: zoo_query::INTERNAL_FAILURE.to_string(),
                        message: "An internal error occurred while processing the request"
                            .to_string(),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
