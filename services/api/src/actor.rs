use axum::http::HeaderMap;
use domain::policy::{Actor, Role};

use crate::error::ApiError;

/// Pulls the authenticated caller out of the identity headers set by
/// the upstream gateway.
pub fn require_actor(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = headers
        .get("x-actor-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(ApiError::unauthorized)?;

    let role: Role = headers
        .get("x-actor-role")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(ApiError::unauthorized)?
        .parse()
        .map_err(|_| ApiError::unauthorized())?;

    Ok(Actor::new(id.to_string(), role))
}
