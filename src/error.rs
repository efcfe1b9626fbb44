// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::authz::AuthzError;
use crate::database::DatabaseError;
use crate::services::{CascadeStep, GuardError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    NoRole(String),
    PolicyDenied(String),
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    CascadeFailed { step: CascadeStep },
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NoRole(_) => StatusCode::FORBIDDEN,
            ApiError::PolicyDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::CascadeFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::ValidationError { message, .. } => message.clone(),
            ApiError::Unauthorized(msg) => msg.clone(),
            ApiError::NoRole(msg) => msg.clone(),
            ApiError::PolicyDenied(msg) => msg.clone(),
            ApiError::Forbidden(msg) => msg.clone(),
            ApiError::NotFound(msg) => msg.clone(),
            ApiError::CascadeFailed { step } => {
                format!("Failed to delete mission: the {} step failed, please retry", step)
            }
            ApiError::InternalServerError(msg) => msg.clone(),
            ApiError::ServiceUnavailable(msg) => msg.clone(),
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NoRole(_) => "NO_ROLE",
            ApiError::PolicyDenied(_) => "POLICY_DENIED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::CascadeFailed { .. } => "CASCADE_STEP_FAILURE",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError {
                message,
                field_errors: Some(field_errors),
            } => json!({
                "error": true,
                "message": message,
                "code": self.error_code(),
                "field_errors": field_errors
            }),
            ApiError::CascadeFailed { step } => json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code(),
                "step": step
            }),
            _ => json!({
                "error": true,
                "message": self.message(),
                "code": self.error_code()
            }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Unauthenticated => ApiError::unauthorized("Authentication required"),
            AuthzError::NoRole => ApiError::NoRole("No role is assigned to this account".to_string()),
            AuthzError::PolicyDenied { .. } => {
                ApiError::PolicyDenied("Your role does not grant access to this resource".to_string())
            }
            AuthzError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            AuthzError::Forbidden(msg) => ApiError::forbidden(msg),
            AuthzError::CascadeStepFailure { step, .. } => ApiError::CascadeFailed { step },
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConnectionError(msg) => {
                tracing::error!("Database connection error: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                // Don't expose internal SQL errors to clients
                tracing::error!("Database query error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
            DatabaseError::ConfigMissing(name) => {
                tracing::error!("Database configuration missing: {}", name);
                ApiError::service_unavailable("Database is not configured")
            }
        }
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::Denied(e) => e.into(),
            GuardError::Database(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authz_errors_map_to_boundary_statuses() {
        let cases = vec![
            (AuthzError::Unauthenticated, StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (AuthzError::NoRole, StatusCode::FORBIDDEN, "NO_ROLE"),
            (
                AuthzError::PolicyDenied {
                    role: "FREELANCER".to_string(),
                    path: "/api/admin/users".to_string(),
                },
                StatusCode::FORBIDDEN,
                "POLICY_DENIED",
            ),
            (AuthzError::NotFound("mission x".to_string()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (AuthzError::Forbidden("nope".to_string()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (
                AuthzError::CascadeStepFailure {
                    step: CascadeStep::Contract,
                    cause: "deadlock detected".to_string(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "CASCADE_STEP_FAILURE",
            ),
        ];

        for (err, status, code) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status_code(), status);
            assert_eq!(api.error_code(), code);
        }
    }

    #[test]
    fn cascade_failure_names_the_step_but_not_the_cause() {
        let api: ApiError = AuthzError::CascadeStepFailure {
            step: CascadeStep::Contract,
            cause: "relation \"contracts\" is locked".to_string(),
        }
        .into();
        let body = api.to_json();
        assert_eq!(body["step"], "contract");
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("contract"));
        assert!(!message.contains("locked"));
    }

    #[test]
    fn policy_denial_does_not_echo_the_path() {
        let api: ApiError = AuthzError::PolicyDenied {
            role: "CLIENT".to_string(),
            path: "/api/admin/secret".to_string(),
        }
        .into();
        assert!(!api.message().contains("/api/admin/secret"));
    }
}
