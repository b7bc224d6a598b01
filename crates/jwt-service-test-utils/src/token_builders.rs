//! Builder patterns for test data construction
//!
//! Provides fluent APIs for creating service tokens in any state, including
//! ones a real issuer would never produce.

use chrono::{Duration, Utc};
use jwt_service::{JwtSigner, ServiceToken};

/// Builder for test service tokens
///
/// # Example
/// ```rust,ignore
/// let jwt = TestTokenBuilder::new()
///     .from("billing")
///     .to("test")
///     .with_scope("jobs:write")
///     .expires_in(60)
///     .sign(&test_hs256_signer());
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    from: String,
    to: String,
    scope: String,
    exp: i64,
    iat: i64,
}

impl TestTokenBuilder {
    /// Token from `test-sender` to `test`, valid for an hour.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            from: "test-sender".to_string(),
            to: "test".to_string(),
            scope: String::new(),
            exp: (now + Duration::seconds(3600)).timestamp(),
            iat: now.timestamp(),
        }
    }

    /// Set the issuing service
    pub fn from(mut self, sender: &str) -> Self {
        self.from = sender.to_string();
        self
    }

    /// Set the recipient service
    pub fn to(mut self, recipient: &str) -> Self {
        self.to = recipient.to_string();
        self
    }

    /// Set the scope (space-separated)
    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    /// Set expiration in seconds from now (negative for the past)
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
        self
    }

    /// Expired an hour ago
    pub fn expired(self) -> Self {
        self.expires_in(-3600)
    }

    /// Set issued-at timestamp
    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = timestamp;
        self
    }

    /// Build the claims
    pub fn build(self) -> ServiceToken {
        ServiceToken {
            from: self.from,
            to: self.to,
            iat: self.iat,
            exp: self.exp,
            scope: self.scope,
        }
    }

    /// Build and sign the claims
    pub fn sign(self, signer: &JwtSigner) -> String {
        signer
            .sign(&self.build())
            .expect("Failed to sign test token")
    }

    /// Build, sign, and format as an `Authorization` header value
    pub fn bearer(self, signer: &JwtSigner) -> String {
        format!("Bearer {}", self.sign(signer))
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
