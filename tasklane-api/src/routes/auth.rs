/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register new user
/// - `POST /api/auth/login` - Login and get an access token

use crate::{app::AppState, error::ApiResult, extract::Validated};
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tasklane_shared::{
    models::user::UserView,
    validation::{LoginRequest, RegisterRequest},
};

/// Register response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserView,
}

/// Login response
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub access_token: String,
    pub token_type: String,
    pub user: UserView,
}

/// Registration endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@x.com",
///   "password": "pw123456"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `409 Conflict`: Username or email already exists
/// - `500 Internal Server Error`: Storage failure
pub async fn register(
    State(state): State<AppState>,
    Validated(registration): Validated<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<RegisterResponse>)> {
    let user = state.identity.register(registration).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user,
        }),
    ))
}

/// Login endpoint
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "password": "pw123456"
/// }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "message": "Login successful",
///   "access_token": "eyJ...",
///   "token_type": "bearer",
///   "user": { "id": 1, "username": "alice", "email": "alice@x.com", "created_at": "..." }
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    Validated(credentials): Validated<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let session = state.identity.authenticate(credentials).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        access_token: session.access_token,
        token_type: session.token_type,
        user: session.user,
    }))
}
