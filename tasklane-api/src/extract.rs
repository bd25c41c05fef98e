/// Request extractors
///
/// - [`Validated`]: JSON body, checked and normalized by the validation
///   layer; any failure is a `VALIDATION_ERROR`
/// - [`TaskId`]: numeric task id from the path; anything else is treated as
///   an unknown route
///
/// Authentication is not an extractor. Handlers call
/// [`AppState::authenticate`](crate::app::AppState::authenticate) after the
/// body has been validated, so a malformed request is rejected before its
/// credentials are looked at.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tasklane_shared::validation::{check, Payload};

use crate::error::ApiError;

/// Validated request body
///
/// Holds the service input produced by `P`, not `P` itself.
pub struct Validated<P: Payload>(pub P::Output);

#[async_trait]
impl<S, P> FromRequest<S> for Validated<P>
where
    S: Send + Sync,
    P: Payload + DeserializeOwned + Send,
    P::Output: Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<P>::from_request(req, state).await?;
        Ok(Validated(check(payload)?))
    }
}

/// Task id path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for TaskId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| TaskId(id))
            .map_err(|_| ApiError::route_not_found())
    }
}
