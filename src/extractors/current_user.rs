//! Authenticated principal, placed in request extensions by host middleware.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

/// The authenticated principal. Its shape is up to the host.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentUser(pub Value);

/// Extractor for the optional principal; never rejects.
#[derive(Clone, Debug, Default)]
pub struct MaybeUser(pub Option<CurrentUser>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<CurrentUser>().cloned()))
    }
}
