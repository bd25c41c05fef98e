/// Service error taxonomy
///
/// Every failure raised by the Identity and Task services is an [`AppError`].
/// The variants form a closed set; each one carries a human-readable message
/// and a structured `details` object that is safe to return to clients.
///
/// The mapping from failure kind to stable error code and HTTP status lives
/// in exactly two places: [`AppError::code`] and [`ErrorCode::status`].
/// Transport code never picks a status on its own.
///
/// | Kind            | Status | Code                      |
/// |-----------------|--------|---------------------------|
/// | Validation      | 400    | `VALIDATION_ERROR`        |
/// | Authentication  | 401    | `INVALID_CREDENTIALS`     |
/// | Authorization   | 403    | `UNAUTHORIZED_ACCESS`     |
/// | NotFound        | 404    | `RESOURCE_NOT_FOUND`      |
/// | AlreadyExists   | 409    | `RESOURCE_ALREADY_EXISTS` |
/// | MethodNotAllowed| 405    | `METHOD_NOT_ALLOWED`      |
/// | RateLimited     | 429    | `RATE_LIMIT_EXCEEDED`     |
/// | Database        | 500    | `DATABASE_ERROR`          |
/// | Internal        | 500    | `INTERNAL_SERVER_ERROR`   |
///
/// # Example
///
/// ```
/// use tasklane_shared::error::{AppError, ErrorCode};
///
/// let err = AppError::not_found("Task").with_detail("task_id", 42);
/// assert_eq!(err.code(), ErrorCode::ResourceNotFound);
/// assert_eq!(err.code().status().as_u16(), 404);
/// assert_eq!(err.details()["task_id"], 42);
/// ```

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

/// Structured, client-safe error context
pub type Details = Map<String, Value>;

/// Result alias used by the service layer
pub type AppResult<T> = Result<T, AppError>;

/// Stable, machine-readable error code
///
/// Only this value is a contract with API clients; messages may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    InvalidCredentials,
    UnauthorizedAccess,
    ResourceNotFound,
    ResourceAlreadyExists,
    MethodNotAllowed,
    RateLimitExceeded,
    DatabaseError,
    InternalServerError,
}

impl ErrorCode {
    /// Gets the code as it appears on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::UnauthorizedAccess => "UNAUTHORIZED_ACCESS",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            ErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status paired with this code
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::UnauthorizedAccess => StatusCode::FORBIDDEN,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::ResourceAlreadyExists => StatusCode::CONFLICT,
            ErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Failure raised by the service layer
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    /// Client payload is malformed
    #[error("{message}")]
    Validation { message: String, details: Details },

    /// Missing or invalid credentials
    #[error("{message}")]
    Authentication { message: String, details: Details },

    /// Authenticated, but not entitled to the resource
    #[error("{message}")]
    Authorization { message: String, details: Details },

    /// Resource does not exist
    #[error("{message}")]
    NotFound { message: String, details: Details },

    /// Resource collides with an existing one
    #[error("{message}")]
    AlreadyExists { message: String, details: Details },

    /// Route exists but not for this HTTP method
    #[error("{message}")]
    MethodNotAllowed { message: String, details: Details },

    /// Client exceeded its request budget
    #[error("{message}")]
    RateLimited { message: String, details: Details },

    /// Storage failure; the transaction has been rolled back
    #[error("{message}")]
    Database { message: String, details: Details },

    /// Programming or infrastructure fault
    #[error("{message}")]
    Internal { message: String, details: Details },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
            details: Details::new(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        AppError::Authentication {
            message: message.into(),
            details: Details::new(),
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        AppError::Authorization {
            message: message.into(),
            details: Details::new(),
        }
    }

    /// `"<resource> not found"`
    pub fn not_found(resource: &str) -> Self {
        AppError::NotFound {
            message: format!("{} not found", resource),
            details: Details::new(),
        }
    }

    /// `"<resource> already exists"`
    pub fn already_exists(resource: &str) -> Self {
        AppError::AlreadyExists {
            message: format!("{} already exists", resource),
            details: Details::new(),
        }
    }

    pub fn method_not_allowed() -> Self {
        AppError::MethodNotAllowed {
            message: "Method not allowed".to_string(),
            details: Details::new(),
        }
    }

    /// Request budget exhausted; `retry_after` is in seconds
    pub fn rate_limited(retry_after: u64) -> Self {
        AppError::RateLimited {
            message: "Rate limit exceeded".to_string(),
            details: Details::new(),
        }
        .with_detail("retry_after", retry_after)
    }

    /// Storage failure with the underlying cause kept in `details.error`
    ///
    /// The cause never becomes the message itself.
    pub fn database(message: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        let mut details = Details::new();
        details.insert("error".to_string(), Value::String(cause.to_string()));
        AppError::Database {
            message: message.into(),
            details,
        }
    }

    pub fn internal() -> Self {
        AppError::Internal {
            message: "Internal server error".to_string(),
            details: Details::new(),
        }
    }

    /// Adds one entry to the details map
    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details_mut().insert(key.to_string(), value.into());
        self
    }

    /// Stable code for this failure kind
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::Authentication { .. } => ErrorCode::InvalidCredentials,
            AppError::Authorization { .. } => ErrorCode::UnauthorizedAccess,
            AppError::NotFound { .. } => ErrorCode::ResourceNotFound,
            AppError::AlreadyExists { .. } => ErrorCode::ResourceAlreadyExists,
            AppError::MethodNotAllowed { .. } => ErrorCode::MethodNotAllowed,
            AppError::RateLimited { .. } => ErrorCode::RateLimitExceeded,
            AppError::Database { .. } => ErrorCode::DatabaseError,
            AppError::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Authentication { message, .. }
            | AppError::Authorization { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::AlreadyExists { message, .. }
            | AppError::MethodNotAllowed { message, .. }
            | AppError::RateLimited { message, .. }
            | AppError::Database { message, .. }
            | AppError::Internal { message, .. } => message,
        }
    }

    pub fn details(&self) -> &Details {
        match self {
            AppError::Validation { details, .. }
            | AppError::Authentication { details, .. }
            | AppError::Authorization { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::AlreadyExists { details, .. }
            | AppError::MethodNotAllowed { details, .. }
            | AppError::RateLimited { details, .. }
            | AppError::Database { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    fn details_mut(&mut self) -> &mut Details {
        match self {
            AppError::Validation { details, .. }
            | AppError::Authentication { details, .. }
            | AppError::Authorization { details, .. }
            | AppError::NotFound { details, .. }
            | AppError::AlreadyExists { details, .. }
            | AppError::MethodNotAllowed { details, .. }
            | AppError::RateLimited { details, .. }
            | AppError::Database { details, .. }
            | AppError::Internal { details, .. } => details,
        }
    }

    /// Splits the error into `(message, details)`
    pub fn into_parts(self) -> (String, Details) {
        match self {
            AppError::Validation { message, details }
            | AppError::Authentication { message, details }
            | AppError::Authorization { message, details }
            | AppError::NotFound { message, details }
            | AppError::AlreadyExists { message, details }
            | AppError::MethodNotAllowed { message, details }
            | AppError::RateLimited { message, details }
            | AppError::Database { message, details }
            | AppError::Internal { message, details } => (message, details),
        }
    }
}
