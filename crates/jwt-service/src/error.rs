//! Token service error types.
//!
//! Callers only ever see [`TokenError`]. Inbound failures are classified
//! internally as a [`Rejection`] so the reason can be logged and counted,
//! then collapsed to `TokenError::Unauthorized` in a single place.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Response
//! bodies are generic and never say which check failed.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by [`TokenService`](crate::TokenService).
///
/// Maps to HTTP status codes:
/// - Unauthorized: 401 Unauthorized
/// - Forbidden: 403 Forbidden
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Inbound token missing, malformed, unverifiable, misaddressed, or from
    /// an untrusted sender.
    #[error("The access token is invalid or expired")]
    Unauthorized,

    /// No usable key to issue a token for the requested recipient.
    #[error("Not permitted to issue a token for this recipient")]
    Forbidden,
}

impl TokenError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            TokenError::Unauthorized => 401,
            TokenError::Forbidden => 403,
        }
    }
}

/// Why an inbound token was rejected.
///
/// Never returned to callers; see [`Rejection::into_token_error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    MissingHeader,
    NotBearer,
    InvalidToken,
    InvalidPayload,
    WrongAudience,
    UntrustedSender,
}

impl Rejection {
    /// Bounded metric label.
    pub(crate) fn as_label(self) -> &'static str {
        match self {
            Rejection::MissingHeader => "missing_header",
            Rejection::NotBearer => "not_bearer",
            Rejection::InvalidToken => "invalid_token",
            Rejection::InvalidPayload => "invalid_payload",
            Rejection::WrongAudience => "wrong_audience",
            Rejection::UntrustedSender => "untrusted_sender",
        }
    }

    /// Log and count the rejection, then mask it.
    pub(crate) fn into_token_error(self) -> TokenError {
        tracing::debug!(
            target: "jwt_service.decode",
            reason = self.as_label(),
            "Inbound token rejected"
        );
        crate::observability::metrics::record_decode("error", Some(self.as_label()));
        TokenError::Unauthorized
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let (status, code) = match self {
            TokenError::Unauthorized => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            TokenError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.to_string(),
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        // Add WWW-Authenticate header for 401 responses
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer error=\"invalid_token\""),
            );
        }

        response
    }
}
