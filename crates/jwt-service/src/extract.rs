//! Handler-level token extraction.
//!
//! [`Authenticated<T>`] verifies the bearer token as a handler argument, for
//! routers that prefer extractors over a middleware layer. It reuses a
//! payload already injected by [`require_auth`](crate::middleware::require_auth).

use crate::error::TokenError;
use crate::payload::Payload;
use crate::service::TokenService;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::sync::Arc;

/// A verified inbound payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Authenticated<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Authenticated<T>
where
    T: Payload + Clone + Send + Sync + 'static,
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TokenError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(payload) = parts.extensions.get::<T>() {
            return Ok(Self(payload.clone()));
        }

        let service = Arc::<TokenService>::from_ref(state);
        service.decode(&*parts).map(Self)
    }
}
