//! HTTP error mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kisan_core::{KisanError, Language};
use thiserror::Error;

/// Error returned by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Core failure with its raw message
    #[error(transparent)]
    Core(#[from] KisanError),

    /// Advisory failure shown to the farmer as a localized generic message
    #[error("{message}")]
    Advisory {
        message: &'static str,
        source: KisanError,
    },
}

impl ApiError {
    pub fn advisory(language: Language, source: KisanError) -> Self {
        ApiError::Advisory {
            message: language.failure_message(),
            source,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(err) => core_status(err),
            ApiError::Advisory { source, .. } => match source {
                KisanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            },
        }
    }
}

fn core_status(err: &KisanError) -> StatusCode {
    match err {
        KisanError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        KisanError::NotFound(_) => StatusCode::NOT_FOUND,
        KisanError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        KisanError::Llm(_) | KisanError::Schema { .. } => StatusCode::BAD_GATEWAY,
        KisanError::Gateway(_) | KisanError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Core(err) => serde_json::json!({
                "success": false,
                "error": err.to_string(),
            }),
            ApiError::Advisory { message, source } => {
                tracing::warn!(error = %source, "advisory failed");
                let message = match source {
                    KisanError::InvalidRequest(detail) => detail.clone(),
                    _ => message.to_string(),
                };
                serde_json::json!({
                    "success": false,
                    "error": message,
                })
            }
        };
        (status, Json(body)).into_response()
    }
}
