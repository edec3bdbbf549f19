//! HTTP error responses for web adapter.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::error::CrossoverError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

pub fn status_from_error(err: &CrossoverError) -> StatusCode {
    match err {
        CrossoverError::Validation { .. } | CrossoverError::InvalidParameter { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        CrossoverError::Duplicate { .. } => StatusCode::CONFLICT,
        CrossoverError::ConfigMissing { .. }
        | CrossoverError::ConfigInvalid { .. }
        | CrossoverError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
        CrossoverError::Fetch { .. } => StatusCode::BAD_GATEWAY,
        CrossoverError::Database { .. }
        | CrossoverError::DatabaseQuery { .. }
        | CrossoverError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CrossoverError> for WebError {
    fn from(err: CrossoverError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl From<JsonRejection> for WebError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for WebError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_maps_to_conflict() {
        let err = CrossoverError::Duplicate {
            instrument: "HINDALCO".into(),
            timestamp: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        assert_eq!(status_from_error(&err), StatusCode::CONFLICT);
    }

    #[test]
    fn parameter_and_validation_map_to_unprocessable() {
        assert_eq!(
            status_from_error(&CrossoverError::invalid_parameter("short_window", "bad")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_from_error(&CrossoverError::validation("volume", "bad")),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn storage_failures_are_internal() {
        let web: WebError = CrossoverError::Database {
            reason: "pool exhausted".into(),
        }
        .into();
        assert_eq!(web.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(web.message, "database error: pool exhausted");
    }
}
