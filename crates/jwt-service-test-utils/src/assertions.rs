//! Custom test assertions for expressive tests
//!
//! Inspect issued tokens without verifying their signature.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
    #[serde(default)]
    kid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwtClaims {
    from: String,
    to: String,
    #[serde(default)]
    exp: Option<i64>,
    #[serde(default)]
    scope: String,
}

fn segment<T: DeserializeOwned>(token: &str, index: usize, what: &str) -> T {
    let part = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no {what} segment"));
    let bytes = URL_SAFE_NO_PAD
        .decode(part)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT {what}: {e}"));
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("Failed to parse JWT {what}: {e}"))
}

/// Custom assertions for issued tokens
///
/// # Example
/// ```rust,ignore
/// jwt.assert_valid_jwt("HS256")
///     .assert_from("test")
///     .assert_to("billing")
///     .assert_has_scope("jobs:write");
/// ```
pub trait TokenAssertions {
    /// Assert three segments, a `JWT` typ, the given `alg`, and from/to claims
    fn assert_valid_jwt(&self, alg: &str) -> &Self;

    /// Assert the `from` claim
    fn assert_from(&self, sender: &str) -> &Self;

    /// Assert the `to` claim
    fn assert_to(&self, recipient: &str) -> &Self;

    /// Assert that the token contains the specified scope
    fn assert_has_scope(&self, scope: &str) -> &Self;

    /// Assert the `kid` header
    fn assert_signed_by(&self, key_id: &str) -> &Self;

    /// Assert that the token expires within the specified seconds
    fn assert_expires_in(&self, seconds: i64) -> &Self;
}

impl TokenAssertions for str {
    fn assert_valid_jwt(&self, alg: &str) -> &Self {
        let parts = self.split('.').count();
        assert_eq!(
            parts, 3,
            "JWT must have 3 parts (header.payload.signature), got {parts}"
        );

        let header: JwtHeader = segment(self, 0, "header");
        assert_eq!(header.alg, alg, "Unexpected JWT algorithm");
        assert_eq!(header.typ, "JWT", "Expected JWT type");

        let _: JwtClaims = segment(self, 1, "payload");
        self
    }

    fn assert_from(&self, sender: &str) -> &Self {
        let claims: JwtClaims = segment(self, 1, "payload");
        assert_eq!(claims.from, sender, "Unexpected sender");
        self
    }

    fn assert_to(&self, recipient: &str) -> &Self {
        let claims: JwtClaims = segment(self, 1, "payload");
        assert_eq!(claims.to, recipient, "Unexpected recipient");
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        let claims: JwtClaims = segment(self, 1, "payload");
        assert!(
            claims.scope.split_whitespace().any(|s| s == scope),
            "Token does not contain scope '{}'. Available scopes: {}",
            scope,
            claims.scope
        );
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        let header: JwtHeader = segment(self, 0, "header");
        assert_eq!(
            header.kid.as_deref(),
            Some(key_id),
            "Expected key_id '{}', got {:?}",
            key_id,
            header.kid
        );
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        let claims: JwtClaims = segment(self, 1, "payload");
        let exp = claims.exp.expect("Token has no exp claim");
        let expires_in = exp - chrono::Utc::now().timestamp();

        // Allow 5-second tolerance for clock skew
        assert!(
            (expires_in - seconds).abs() <= 5,
            "Expected token to expire in {seconds} seconds, but expires in {expires_in} seconds"
        );
        self
    }
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self, alg: &str) -> &Self {
        self.as_str().assert_valid_jwt(alg);
        self
    }

    fn assert_from(&self, sender: &str) -> &Self {
        self.as_str().assert_from(sender);
        self
    }

    fn assert_to(&self, recipient: &str) -> &Self {
        self.as_str().assert_to(recipient);
        self
    }

    fn assert_has_scope(&self, scope: &str) -> &Self {
        self.as_str().assert_has_scope(scope);
        self
    }

    fn assert_signed_by(&self, key_id: &str) -> &Self {
        self.as_str().assert_signed_by(key_id);
        self
    }

    fn assert_expires_in(&self, seconds: i64) -> &Self {
        self.as_str().assert_expires_in(seconds);
        self
    }
}
