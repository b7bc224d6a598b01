//! Authentication middleware for protected routes.
//!
//! `require_auth::<T>` decodes the bearer token as payload type `T` and
//! injects it into request extensions. Failures short-circuit with the
//! masked [`TokenError`] response.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/internal/jobs", post(create_job))
//!     .layer(middleware::from_fn_with_state(
//!         service.clone(),
//!         require_auth::<ServiceToken>,
//!     ));
//! ```

use crate::error::TokenError;
use crate::payload::Payload;
use crate::service::TokenService;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::instrument;

/// Authentication middleware for service tokens.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing or rejected
/// - Continues to the next handler with `T` in extensions otherwise
///
/// # Errors
///
/// Returns `TokenError::Unauthorized` when [`TokenService::decode`] fails.
#[instrument(skip_all, name = "jwt_service.middleware.auth")]
pub async fn require_auth<T>(
    State(service): State<Arc<TokenService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, TokenError>
where
    T: Payload + Clone + Send + Sync + 'static,
{
    let payload: T = service.decode(&req)?;
    req.extensions_mut().insert(payload);

    Ok(next.run(req).await)
}

/// Handler access to the payload injected by [`require_auth`].
pub trait PayloadExt {
    /// Returns `None` if auth middleware was not applied to this request.
    fn payload<T: Payload + Send + Sync + 'static>(&self) -> Option<&T>;
}

impl<B> PayloadExt for Request<B> {
    fn payload<T: Payload + Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions().get::<T>()
    }
}
