//! API key extraction.
//!
//! The opaque player key arrives in the `X-Api-Key` header (or as a
//! bearer token). Extraction does not validate the key -- the action
//! processor authenticates it against the player table -- so read-only
//! handlers share the same extractor without double lookups.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use burnrate_core::ActionError;

/// The presented API key, unvalidated.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

impl<S> FromRequestParts<S> for ApiKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let from_bearer = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_owned);

        from_header
            .or(from_bearer)
            .filter(|k| !k.is_empty())
            .map(Self)
            .ok_or(ApiError::Action(ActionError::Unauthorized))
    }
}

/// The presented admin key, unvalidated.
#[derive(Debug, Clone)]
pub struct AdminKey(pub Option<String>);

impl<S> FromRequestParts<S> for AdminKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        Ok(Self(key))
    }
}
