/// Error Handling Module
///
/// Every failure in the service is one of the domain error types below and
/// converges on [`AppError`], which knows its HTTP status and renders a
/// structured JSON body. Nothing leaves a handler untagged: anything that is
/// not explicitly classified ends up as an internal error.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::ser::SerializeStruct;
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// A single violated input field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(&'static str),
    TooShort(&'static str, usize),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField(field)
            | ValidationError::TooShort(field, _)
            | ValidationError::TooLong(field, _)
            | ValidationError::InvalidFormat(field)
            | ValidationError::SuspiciousContent(field) => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField(field) => write!(f, "{} is empty", field),
            ValidationError::TooShort(field, min) => {
                write!(f, "{} is too short (minimum {} characters)", field, min)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
        }
    }
}

impl StdError for ValidationError {}

impl serde::Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 2)?;
        state.serialize_field("field", self.field())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Store operation errors
#[derive(Debug)]
pub enum DatabaseError {
    UniqueConstraintViolation(String),
    ConnectionPool(String),
    QueryExecution(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::UniqueConstraintViolation(msg) => {
                write!(f, "Duplicate entry: {}", msg)
            }
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                DatabaseError::UniqueConstraintViolation(db.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionPool(err.to_string())
            }
            _ => DatabaseError::QueryExecution(err.to_string()),
        }
    }
}

/// Token codec errors
///
/// `Expired` and `Malformed` are kept apart so that the gate can tell a
/// client to refresh rather than log in again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    Signing(String),
    Expired,
    Malformed(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::Signing(msg) => write!(f, "Token signing failed: {}", msg),
            TokenError::Expired => write!(f, "Token has expired"),
            TokenError::Malformed(msg) => write!(f, "Malformed token: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No bearer credential on a protected request
    MissingToken,
    /// Access or refresh token past its `exp`
    TokenExpired,
    /// Signature, structure or claims rejected
    TokenInvalid,
    UnknownEmail,
    WrongPassword,
    /// Token subject no longer resolves to a record
    UnknownUser,
    /// Refresh token verifies but is not the one currently stored
    RefreshTokenMismatch,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingToken => write!(f, "Not Authenticated"),
            AuthError::TokenExpired => {
                write!(f, "Not Authenticated. Access token might have expired!")
            }
            AuthError::TokenInvalid => write!(f, "Not Authenticated. Invalid token"),
            AuthError::UnknownEmail => write!(f, "This email could not be found!"),
            AuthError::WrongPassword => write!(f, "Wrong Password!"),
            AuthError::UnknownUser => write!(f, "No such User found!"),
            AuthError::RefreshTokenMismatch => write!(f, "Not Authenticated!"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(Vec<ValidationError>),
    Conflict(String),
    Auth(AuthError),
    NotFound(String),
    Forbidden(String),
    BadRequest(String),
    Database(DatabaseError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(errors) => {
                write!(f, "Validation failed!")?;
                for e in errors {
                    write!(f, " {};", e)?;
                }
                Ok(())
            }
            AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::Forbidden(msg)
            | AppError::BadRequest(msg) => write!(f, "{}", msg),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(vec![err])
    }
}

impl From<Vec<ValidationError>> for AppError {
    fn from(errors: Vec<ValidationError>) -> Self {
        AppError::Validation(errors)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => AppError::Internal(msg),
            TokenError::Expired => AppError::Auth(AuthError::TokenExpired),
            TokenError::Malformed(_) => AppError::Auth(AuthError::TokenInvalid),
        }
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for tracking
    pub error_id: String,
    pub message: String,
    /// Error code for client-side handling
    pub code: String,
    pub status: u16,
    pub timestamp: String,
    /// Violated fields, for validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ValidationError>>,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Vec<ValidationError>) -> Self {
        self.data = Some(data);
        self
    }
}

impl AppError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Auth(e) => match e {
                AuthError::MissingToken => "MISSING_TOKEN",
                AuthError::TokenExpired => "TOKEN_EXPIRED",
                AuthError::TokenInvalid => "TOKEN_INVALID",
                AuthError::UnknownEmail | AuthError::WrongPassword => "INVALID_CREDENTIALS",
                AuthError::UnknownUser => "UNKNOWN_USER",
                AuthError::RefreshTokenMismatch => "REFRESH_TOKEN_MISMATCH",
            },
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => "CONFLICT",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show the caller; internals are never echoed.
    fn public_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Validation failed!".to_string(),
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                "Duplicate entry".to_string()
            }
            AppError::Database(_) | AppError::Internal(_) => "Internal Server Error!".to_string(),
            other => other.to_string(),
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                tracing::warn!(error_id = error_id, error = %self, "Duplicate entry attempt");
            }
            AppError::Database(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            _ => {
                tracing::info!(error_id = error_id, error = %self, "Request rejected");
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::RefreshTokenMismatch) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(DatabaseError::UniqueConstraintViolation(_)) => {
                StatusCode::CONFLICT
            }
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        let status = self.status_code();
        let mut body = ErrorResponse::new(
            error_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );
        if let AppError::Validation(errors) = self {
            body = body.with_data(errors.clone());
        }

        HttpResponse::build(status).json(body)
    }
}
