use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recall_core::CoreError;
use recall_gen::GenError;
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let status = match e {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            CoreError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, e.to_string())
    }
}

impl From<GenError> for ApiError {
    fn from(e: GenError) -> Self {
        let status = match e {
            GenError::EmptyInput => StatusCode::BAD_REQUEST,
            GenError::MissingKey => StatusCode::SERVICE_UNAVAILABLE,
            GenError::Http(_) | GenError::Api { .. } | GenError::Parse(_) => StatusCode::BAD_GATEWAY,
        };
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.status.canonical_reason().unwrap_or("error"),
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}
