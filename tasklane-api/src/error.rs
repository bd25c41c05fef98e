/// Error handling for the API server
///
/// Every failure leaves a handler as an [`ApiError`], a thin wrapper over the
/// service taxonomy [`AppError`]. Conversion to an HTTP response happens in
/// one place, [`IntoResponse for ApiError`](ApiError), using the code and
/// status mapping defined on the taxonomy itself.
///
/// # Response Format
///
/// ```json
/// {
///   "message": "Task not found",
///   "error_code": "RESOURCE_NOT_FOUND",
///   "status_code": 404,
///   "details": { "task_id": 42 }
/// }
/// ```
///
/// # Example
///
/// ```
/// use tasklane_api::error::{ApiError, ApiResult};
/// use tasklane_shared::error::AppError;
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<serde_json::Value>> {
///     Err(AppError::not_found("Task").into())
/// }
/// ```

use axum::{
    extract::rejection::JsonRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tasklane_shared::{
    auth::bearer::AuthError,
    error::{AppError, Details, ErrorCode},
    validation,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure returned by a handler
#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .0.code().as_str(), .0.message())]
pub struct ApiError(AppError);

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message; may change between versions
    pub message: String,

    /// Stable code clients can branch on
    pub error_code: String,

    /// HTTP status, repeated in the body
    pub status_code: u16,

    /// Failure-specific context, empty by default
    pub details: Details,
}

impl ApiError {
    /// Unknown route, or a path parameter that does not fit the route
    pub fn route_not_found() -> Self {
        ApiError(AppError::not_found("Route"))
    }

    pub fn inner(&self) -> &AppError {
        &self.0
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code()
    }

    pub fn status(&self) -> StatusCode {
        self.0.code().status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.code();
        let status = code.status();

        if status.is_server_error() {
            tracing::error!(error_code = code.as_str(), details = ?self.0.details(), "{}", self.0.message());
        } else {
            tracing::debug!(error_code = code.as_str(), "{}", self.0.message());
        }

        let (message, details) = self.0.into_parts();

        let body = Json(ErrorResponse {
            message,
            error_code: code.as_str().to_string(),
            status_code: status.as_u16(),
            details,
        });

        (status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err.into())
    }
}

/// Unparseable body, wrong content type or mistyped field
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(validation::body_error(rejection.body_text()))
    }
}

/// Response for a panic caught by `CatchPanicLayer`
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };

    tracing::error!(panic = detail, "Handler panicked");

    ApiError(AppError::internal()).into_response()
}

/// Router fallback
pub async fn route_not_found() -> ApiError {
    ApiError::route_not_found()
}

/// Replaces axum's empty 405 with the error envelope, keeping `Allow`
pub async fn method_not_allowed(response: Response) -> Response {
    if response.status() != StatusCode::METHOD_NOT_ALLOWED {
        return response;
    }

    let allow = response.headers().get(header::ALLOW).cloned();
    let mut enveloped = ApiError(AppError::method_not_allowed()).into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}
