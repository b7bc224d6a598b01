//! Inbound token verification and outbound token issuance.
//!
//! # Decode
//!
//! 1. Collect `authorization` header values
//! 2. Select the first `Bearer` value (opaque values included)
//! 3. Verify the token with this service's own signer (size check first)
//! 4. Run the payload's self-consistency check
//! 5. Require `to` == this service's identifier (exact, case-sensitive)
//! 6. Ask the trust policy whether `from` is trusted
//!
//! Every failure returns the same `TokenError::Unauthorized`. The reason is
//! classified once in `authenticate` and only surfaces in debug logs and the
//! `jwt_service_decode_total` counter.
//!
//! # Encode
//!
//! The caller's factory receives this service's identifier as the sender.
//! The trust policy supplies the signer for the payload's recipient; an
//! unknown recipient is `TokenError::Forbidden`, never a default key.

use crate::error::{Rejection, TokenError};
use crate::headers::{extract_bearer_token, HeaderSource, AUTHORIZATION};
use crate::observability::metrics::{record_decode, record_encode};
use crate::payload::Payload;
use crate::policy::TrustPolicy;
use crate::signer::JwtSigner;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Service-to-service token authority for one service identity.
///
/// Immutable after construction; share it as `Arc<TokenService>`.
pub struct TokenService {
    /// Verifies every inbound token.
    verifier: JwtSigner,

    /// Delegated trust decisions.
    policy: Arc<dyn TrustPolicy>,

    /// Audience value for inbound tokens and `from` for outbound ones.
    identifier: String,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("verifier", &self.verifier)
            .field("policy", &"<dyn TrustPolicy>")
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl TokenService {
    /// Create a token service.
    ///
    /// # Arguments
    ///
    /// * `verifier` - Signer used to verify inbound tokens addressed to us
    /// * `policy` - Recipient keys and sender trust
    /// * `identifier` - This service's identifier
    pub fn new(
        verifier: JwtSigner,
        policy: Arc<dyn TrustPolicy>,
        identifier: impl Into<String>,
    ) -> Self {
        let identifier = identifier.into();
        if !verifier.can_verify() {
            tracing::warn!(
                target: "jwt_service.service",
                algorithm = ?verifier.algorithm(),
                "Verifier has no verification key: every inbound token will be rejected"
            );
        }

        Self {
            verifier,
            policy,
            identifier,
        }
    }

    /// Identifier stamped as the sender of outbound tokens.
    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn policy(&self) -> &Arc<dyn TrustPolicy> {
        &self.policy
    }

    /// Verify the bearer token on an inbound request.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Unauthorized` for every failure.
    #[instrument(skip_all, name = "jwt_service.decode")]
    pub fn decode<T: Payload>(
        &self,
        request: &(impl HeaderSource + ?Sized),
    ) -> Result<T, TokenError> {
        Self::finish_decode(self.authenticate_request(request))
    }

    /// Verify a raw token already extracted from its transport.
    ///
    /// Runs every check of [`decode`](Self::decode) after header parsing.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Unauthorized` for every failure.
    #[instrument(skip_all, name = "jwt_service.decode_token")]
    pub fn decode_token<T: Payload>(&self, token: &str) -> Result<T, TokenError> {
        Self::finish_decode(self.authenticate(token))
    }

    /// Issue a token signed for the recipient the factory chooses.
    ///
    /// `factory` receives this service's identifier as the sender.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Forbidden` when the trust policy has no usable
    /// key for the payload's recipient.
    #[instrument(skip_all, name = "jwt_service.encode")]
    pub fn encode<T, F>(&self, factory: F) -> Result<Vec<u8>, TokenError>
    where
        T: Payload,
        F: FnOnce(&str) -> T,
    {
        let payload = factory(&self.identifier);

        let Some(signer) = self.policy.key(payload.recipient()) else {
            tracing::debug!(target: "jwt_service.encode", "No key for recipient");
            record_encode("error", Some("missing_key"));
            return Err(TokenError::Forbidden);
        };

        let token = signer.sign(&payload).map_err(|e| {
            tracing::debug!(target: "jwt_service.encode", error = %e, "Token signing failed");
            record_encode("error", Some("signing_failed"));
            TokenError::Forbidden
        })?;

        record_encode("success", None);
        Ok(token.into_bytes())
    }

    fn finish_decode<T>(outcome: Result<T, Rejection>) -> Result<T, TokenError> {
        match outcome {
            Ok(payload) => {
                record_decode("success", None);
                tracing::debug!(target: "jwt_service.decode", "Token validated successfully");
                Ok(payload)
            }
            Err(rejection) => Err(rejection.into_token_error()),
        }
    }

    fn authenticate_request<T: Payload>(
        &self,
        request: &(impl HeaderSource + ?Sized),
    ) -> Result<T, Rejection> {
        let values = request.header_values(AUTHORIZATION);
        if values.is_empty() {
            return Err(Rejection::MissingHeader);
        }

        let token = extract_bearer_token(&values).ok_or(Rejection::NotBearer)?;
        let token = std::str::from_utf8(token).map_err(|_| Rejection::InvalidToken)?;
        self.authenticate(token)
    }

    fn authenticate<T: Payload>(&self, token: &str) -> Result<T, Rejection> {
        let payload: T = self.verifier.verify(token).map_err(|e| {
            tracing::debug!(target: "jwt_service.decode", error = %e, "Token verification failed");
            Rejection::InvalidToken
        })?;

        payload.verify().map_err(|e| {
            tracing::debug!(target: "jwt_service.decode", error = %e, "Token payload invalid");
            Rejection::InvalidPayload
        })?;

        if payload.recipient() != self.identifier {
            return Err(Rejection::WrongAudience);
        }

        if !self.policy.validate(payload.sender()) {
            return Err(Rejection::UntrustedSender);
        }

        Ok(payload)
    }
}
