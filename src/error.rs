use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum StratusError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("upstream error with status: {status}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("upstream request timed out")]
    UpstreamTimeout,

    #[error("upstream payload malformed: {0}")]
    UpstreamPayload(#[from] serde_json::Error),

    #[error("upstream payload unusable: {0}")]
    UpstreamInvalid(String),

    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("internal error: {0}")]
    Internal(String),
}

impl StratusError {
    /// Map constraint violations on writes: a unique violation is a conflict, a missing
    /// owning row (e.g. a token for a deleted account) is unauthorized.
    pub fn from_constraint(err: SqlxError, conflict: impl Into<String>) -> Self {
        match &err {
            SqlxError::Database(db_err) if db_err.is_unique_violation() => {
                StratusError::Conflict(conflict.into())
            }
            SqlxError::Database(db_err) if db_err.is_foreign_key_violation() => {
                StratusError::Unauthorized("account no longer exists".to_string())
            }
            _ => StratusError::DatabaseError(err),
        }
    }

    /// Transport failures are classified here so timeouts stay distinguishable.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StratusError::UpstreamTimeout
        } else {
            StratusError::Reqwest(err)
        }
    }
}

impl From<JsonRejection> for StratusError {
    fn from(rejection: JsonRejection) -> Self {
        StratusError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for StratusError {
    fn from(rejection: QueryRejection) -> Self {
        StratusError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for StratusError {
    fn from(rejection: PathRejection) -> Self {
        StratusError::Validation(rejection.body_text())
    }
}

impl IntoResponse for StratusError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            StratusError::Validation(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody::new("VALIDATION_ERROR", reason),
            ),
            StratusError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", "invalid credentials"),
            ),
            StratusError::Unauthorized(reason) => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody::new("UNAUTHORIZED", reason),
            ),
            StratusError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody::new("FORBIDDEN", "insufficient role"),
            ),
            StratusError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody::new("NOT_FOUND", format!("{what} not found")),
            ),
            StratusError::Conflict(reason) => {
                (StatusCode::CONFLICT, ApiErrorBody::new("CONFLICT", reason))
            }
            StratusError::UpstreamStatus { status, body } => {
                tracing::warn!(%status, body = %body, "weather provider returned an error");
                let message = match status {
                    StatusCode::TOO_MANY_REQUESTS => "Upstream rate limit exceeded.",
                    StatusCode::UNAUTHORIZED => "Upstream authentication failed.",
                    StatusCode::NOT_FOUND => "Upstream resource not found.",
                    _ => "An upstream error occurred.",
                };
                (status, ApiErrorBody::new("UPSTREAM_ERROR", message))
            }
            StratusError::UpstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                ApiErrorBody::new("UPSTREAM_TIMEOUT", "Upstream service timed out."),
            ),
            err @ (StratusError::Reqwest(_)
            | StratusError::UpstreamPayload(_)
            | StratusError::UpstreamInvalid(_)) => {
                error!(error = %err, "weather provider unavailable");
                (
                    StatusCode::BAD_GATEWAY,
                    ApiErrorBody::new("BAD_GATEWAY", "Upstream service is unavailable."),
                )
            }
            err @ (StratusError::DatabaseError(_)
            | StratusError::PasswordHash(_)
            | StratusError::Jwt(_)
            | StratusError::UrlParse(_)
            | StratusError::Config(_)
            | StratusError::Figment(_)
            | StratusError::Internal(_)) => {
                error!(error = ?err, "internal failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorBody::new("INTERNAL_ERROR", "An internal server error occurred."),
                )
            }
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiErrorBody {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
