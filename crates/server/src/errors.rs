use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ApiResponse;
use models::errors::ModelError;
use service::auth::errors::AuthError;
use service::errors::ServiceError;
use thiserror::Error;
use tracing::{error, warn};

/// Failure envelope `{success: false, message, error?, errors?}` with its status.
#[derive(Debug)]
pub struct JsonApiError {
    pub status: StatusCode,
    pub body: ApiResponse<()>,
}

impl JsonApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, error: Option<String>) -> Self {
        let mut body = ApiResponse::failure(message);
        body.error = error;
        Self { status, body }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, None)
    }

    /// Body that is not valid JSON or does not match the expected shape.
    pub fn bad_body(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body", Some(rejection.body_text()))
    }

    /// Map a service failure, using `internal_message` for the 500 case.
    pub fn service(err: ServiceError, internal_message: &str) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg, None),
            ServiceError::InvalidBatch => Self::new(StatusCode::BAD_REQUEST, err.to_string(), None),
            ServiceError::Forbidden => Self::new(StatusCode::FORBIDDEN, "Unauthorized", None),
            ServiceError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg, None),
            ServiceError::Model(ModelError::Schema(errs)) => Self {
                status: StatusCode::BAD_REQUEST,
                body: ApiResponse::failure("Validation failed").with_errors(errs),
            },
            ServiceError::Model(ModelError::Validation(msg)) => Self::new(StatusCode::BAD_REQUEST, msg, None),
            ServiceError::Model(ModelError::Db(detail)) | ServiceError::Db(detail) | ServiceError::Export(detail) => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, internal_message, Some(detail))
            }
        }
    }
}

impl From<ServiceError> for JsonApiError {
    fn from(err: ServiceError) -> Self { Self::service(err, "Internal server error") }
}

impl From<AuthError> for JsonApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg, None),
            AuthError::Conflict => Self::new(StatusCode::CONFLICT, "User already exists", None),
            AuthError::NotFound => Self::new(StatusCode::NOT_FOUND, "User not found", None),
            AuthError::Unauthorized => Self::unauthorized("Invalid email or password"),
            AuthError::Forbidden => Self::new(StatusCode::FORBIDDEN, "Admin signup is disabled", None),
            AuthError::HashError(_) | AuthError::TokenError(_) | AuthError::Repository(_) => {
                let code = err.code();
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", Some(format!("{code}: {err}")))
            }
        }
    }
}

impl IntoResponse for JsonApiError {
    fn into_response(self) -> Response {
        let message = self.body.message.as_deref().unwrap_or_default();
        if self.status.is_server_error() {
            error!(status = %self.status, msg = message, detail = ?self.body.error, "request failed");
        } else {
            warn!(status = %self.status, msg = message, "request rejected");
        }
        (self.status, Json(self.body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_maps_to_403_unauthorized() {
        let e = JsonApiError::from(ServiceError::Forbidden);
        assert_eq!(e.status, StatusCode::FORBIDDEN);
        assert_eq!(e.body.message.as_deref(), Some("Unauthorized"));
    }

    #[test]
    fn schema_errors_are_listed() {
        let e = JsonApiError::from(ServiceError::from(ModelError::Schema(vec!["City is required".into()])));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        assert_eq!(e.body.message.as_deref(), Some("Validation failed"));
        assert_eq!(e.body.errors, Some(vec!["City is required".to_string()]));
    }

    #[test]
    fn internal_detail_is_echoed() {
        let e = JsonApiError::service(ServiceError::Db("connection reset".into()), "Failed to fetch entries");
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.body.message.as_deref(), Some("Failed to fetch entries"));
        assert_eq!(e.body.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn auth_errors_keep_status() {
        assert_eq!(JsonApiError::from(AuthError::Conflict).status, StatusCode::CONFLICT);
        assert_eq!(JsonApiError::from(AuthError::Unauthorized).status, StatusCode::UNAUTHORIZED);
    }
}
