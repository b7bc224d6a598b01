//! Token payload contract and the built-in service token claims.
//!
//! Every token exchanged between services carries a sender (`from`) and a
//! recipient (`to`). Callers define their own claim structs and implement
//! [`Payload`] for them; [`ServiceToken`] covers the common case of a
//! short-lived token with scopes.
//!
//! # Security
//!
//! - `Payload::verify` runs AFTER signature verification and BEFORE the
//!   audience and sender checks
//! - Expiry and issued-at are checked here rather than by `jsonwebtoken`, so
//!   payload types without time claims remain valid
//! - Error messages are generic; [`PayloadError`] never leaves the crate
//!   boundary through `TokenService`

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// Tokens larger than this are rejected BEFORE any base64 decoding or
/// signature verification. Typical service tokens are 200-500 bytes.
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default clock skew tolerance for `iat` validation (5 minutes).
#[allow(unknown_lints, clippy::duration_suboptimal_units)]
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

// =============================================================================
// Error Types
// =============================================================================

/// Self-consistency failures of a decoded payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    /// A required identifier is empty.
    #[error("Required claim is empty: {0}")]
    EmptyClaim(&'static str),

    /// Token `exp` claim is in the past.
    #[error("Token has expired")]
    Expired,

    /// Token `iat` claim is too far in the future.
    #[error("Token issued-at is too far in the future")]
    IatTooFarInFuture,
}

// =============================================================================
// Payload Contract
// =============================================================================

/// Claims carried by a service-to-service token.
///
/// Implementors serialize their sender and recipient as the `from` and `to`
/// claims. `verify` is the self-consistency check (expiry, required fields)
/// and is independent of cryptographic verification.
///
/// # Example
///
/// ```rust
/// use jwt_service::Payload;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Ping {
///     from: String,
///     to: String,
///     nonce: u64,
/// }
///
/// impl Payload for Ping {
///     fn sender(&self) -> &str {
///         &self.from
///     }
///
///     fn recipient(&self) -> &str {
///         &self.to
///     }
/// }
/// ```
pub trait Payload: Serialize + DeserializeOwned + PartialEq {
    /// The `from` claim: identifier of the issuing service.
    fn sender(&self) -> &str;

    /// The `to` claim: identifier of the intended recipient (audience).
    fn recipient(&self) -> &str;

    /// Check the payload is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns a [`PayloadError`] describing the first failed check.
    fn verify(&self) -> Result<(), PayloadError> {
        Ok(())
    }
}

// =============================================================================
// Claims Types
// =============================================================================

/// Built-in service token claims.
///
/// # Fields
///
/// - `from`: Issuing service identifier
/// - `to`: Recipient service identifier
/// - `iat`: Issued-at timestamp (Unix epoch seconds)
/// - `exp`: Expiration timestamp (Unix epoch seconds)
/// - `scope`: Space-separated permissions, omitted when empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceToken {
    pub from: String,
    pub to: String,
    pub iat: i64,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,
}

impl ServiceToken {
    /// Creates a token issued now that expires after `ttl`.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>, ttl: Duration) -> Self {
        let now = chrono::Utc::now().timestamp();
        // Saturating: a ttl beyond i64 seconds is "never" for practical purposes
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            from: from.into(),
            to: to.into(),
            iat: now,
            exp: now.saturating_add(ttl_secs),
            scope: String::new(),
        }
    }

    /// Replace the scope string.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Check if the token has a specific scope.
    ///
    /// Scopes are space-separated; partial matches do not count.
    #[must_use]
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.split_whitespace().any(|s| s == scope)
    }

    /// Get all scopes as a vector.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scope.split_whitespace().collect()
    }

    /// Deterministic variant of [`Payload::verify`] against an explicit `now`.
    pub(crate) fn verify_at(&self, now: i64) -> Result<(), PayloadError> {
        if self.from.is_empty() {
            return Err(PayloadError::EmptyClaim("from"));
        }
        if self.to.is_empty() {
            return Err(PayloadError::EmptyClaim("to"));
        }
        validate_exp_at(self.exp, now)?;
        validate_iat_at(self.iat, DEFAULT_CLOCK_SKEW, now)
    }
}

impl Payload for ServiceToken {
    fn sender(&self) -> &str {
        &self.from
    }

    fn recipient(&self) -> &str {
        &self.to
    }

    fn verify(&self) -> Result<(), PayloadError> {
        self.verify_at(chrono::Utc::now().timestamp())
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Validate the `exp` (expiration) claim.
///
/// # Errors
///
/// Returns `PayloadError::Expired` if `exp` is in the past.
pub fn validate_exp(exp: i64) -> Result<(), PayloadError> {
    validate_exp_at(exp, chrono::Utc::now().timestamp())
}

pub(crate) fn validate_exp_at(exp: i64, now: i64) -> Result<(), PayloadError> {
    if exp < now {
        tracing::debug!(
            target: "jwt_service.payload",
            exp = exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(PayloadError::Expired);
    }
    Ok(())
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// Rejects tokens issued more than `clock_skew` in the future, which points
/// at pre-generated tokens or badly drifted clocks.
///
/// # Errors
///
/// Returns `PayloadError::IatTooFarInFuture` if `iat` is beyond
/// `now + clock_skew`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), PayloadError> {
    validate_iat_at(iat, clock_skew, chrono::Utc::now().timestamp())
}

pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), PayloadError> {
    let clock_skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "jwt_service.payload",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(PayloadError::IatTooFarInFuture);
    }

    Ok(())
}
