//! JWT signing and verification keys.
//!
//! A [`JwtSigner`] pairs one algorithm with an encoding key, a decoding key,
//! or both. Symmetric (HMAC) signers always hold both halves; asymmetric
//! signers hold whichever halves were provisioned.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (denial-of-service guard)
//! - Only the signer's own algorithm is accepted on verification
//! - Registered time claims are NOT enforced here; that is the payload's job
//! - Key material never appears in `Debug` output

use crate::payload::MAX_JWT_SIZE_BYTES;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by [`JwtSigner`].
#[derive(Error, Debug)]
pub enum SignerError {
    /// Key material could not be parsed.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    /// This signer has no private/secret half.
    #[error("Signer cannot sign: no signing key")]
    MissingSigningKey,

    /// This signer has no public/secret half.
    #[error("Signer cannot verify: no verification key")]
    MissingVerificationKey,

    /// Token size exceeds `MAX_JWT_SIZE_BYTES`.
    #[error("Token exceeds maximum size")]
    TokenTooLarge,

    /// Signing, parsing or signature verification failed.
    #[error("JWT operation failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// A static signing/verification capability for one algorithm.
#[derive(Clone)]
pub struct JwtSigner {
    algorithm: Algorithm,
    encoding_key: Option<EncodingKey>,
    decoding_key: Option<DecodingKey>,
    validation: Validation,
    key_id: Option<String>,
}

/// Redacts all key material.
impl fmt::Debug for JwtSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSigner")
            .field("algorithm", &self.algorithm)
            .field("encoding_key", &self.encoding_key.as_ref().map(|_| "[REDACTED]"))
            .field("decoding_key", &self.decoding_key.as_ref().map(|_| "[REDACTED]"))
            .field("key_id", &self.key_id)
            .finish()
    }
}

impl JwtSigner {
    fn new(
        algorithm: Algorithm,
        encoding_key: Option<EncodingKey>,
        decoding_key: Option<DecodingKey>,
    ) -> Self {
        let mut validation = Validation::new(algorithm);
        // exp/iat/aud are payload concerns; the signer only checks the signature
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
            key_id: None,
        }
    }

    fn hmac(algorithm: Algorithm, secret: &[u8]) -> Self {
        Self::new(
            algorithm,
            Some(EncodingKey::from_secret(secret)),
            Some(DecodingKey::from_secret(secret)),
        )
    }

    /// HMAC-SHA256 signer from a shared secret.
    #[must_use]
    pub fn hs256(secret: &[u8]) -> Self {
        Self::hmac(Algorithm::HS256, secret)
    }

    /// HMAC-SHA384 signer from a shared secret.
    #[must_use]
    pub fn hs384(secret: &[u8]) -> Self {
        Self::hmac(Algorithm::HS384, secret)
    }

    /// HMAC-SHA512 signer from a shared secret.
    #[must_use]
    pub fn hs512(secret: &[u8]) -> Self {
        Self::hmac(Algorithm::HS512, secret)
    }

    /// RS256 signer that can only sign (PEM-encoded RSA private key).
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the PEM cannot be parsed.
    pub fn rs256_private_pem(pem: &[u8]) -> Result<Self, SignerError> {
        let key = EncodingKey::from_rsa_pem(pem).map_err(|e| invalid_key(&e))?;
        Ok(Self::new(Algorithm::RS256, Some(key), None))
    }

    /// RS256 signer that can only verify (PEM-encoded RSA public key).
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the PEM cannot be parsed.
    pub fn rs256_public_pem(pem: &[u8]) -> Result<Self, SignerError> {
        let key = DecodingKey::from_rsa_pem(pem).map_err(|e| invalid_key(&e))?;
        Ok(Self::new(Algorithm::RS256, None, Some(key)))
    }

    /// RS256 signer holding both halves of a key pair.
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if either PEM cannot be parsed.
    pub fn rs256_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Self, SignerError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_pem).map_err(|e| invalid_key(&e))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem).map_err(|e| invalid_key(&e))?;
        Ok(Self::new(
            Algorithm::RS256,
            Some(encoding_key),
            Some(decoding_key),
        ))
    }

    /// `EdDSA` signer that can only sign (PKCS#8 DER private key).
    #[must_use]
    pub fn ed25519_private_der(pkcs8: &[u8]) -> Self {
        Self::new(Algorithm::EdDSA, Some(EncodingKey::from_ed_der(pkcs8)), None)
    }

    /// `EdDSA` signer that can only verify (raw 32-byte public key).
    #[must_use]
    pub fn ed25519_public_der(public_key: &[u8]) -> Self {
        Self::new(
            Algorithm::EdDSA,
            None,
            Some(DecodingKey::from_ed_der(public_key)),
        )
    }

    /// `EdDSA` signer holding both halves of a key pair.
    #[must_use]
    pub fn ed25519_der(pkcs8: &[u8], public_key: &[u8]) -> Self {
        Self::new(
            Algorithm::EdDSA,
            Some(EncodingKey::from_ed_der(pkcs8)),
            Some(DecodingKey::from_ed_der(public_key)),
        )
    }

    /// `EdDSA` signer that can only sign (PEM-encoded PKCS#8 private key).
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the PEM cannot be parsed.
    pub fn ed25519_private_pem(pem: &[u8]) -> Result<Self, SignerError> {
        let key = EncodingKey::from_ed_pem(pem).map_err(|e| invalid_key(&e))?;
        Ok(Self::new(Algorithm::EdDSA, Some(key), None))
    }

    /// `EdDSA` signer that can only verify (PEM-encoded public key).
    ///
    /// # Errors
    ///
    /// Returns `SignerError::InvalidKey` if the PEM cannot be parsed.
    pub fn ed25519_public_pem(pem: &[u8]) -> Result<Self, SignerError> {
        let key = DecodingKey::from_ed_pem(pem).map_err(|e| invalid_key(&e))?;
        Ok(Self::new(Algorithm::EdDSA, None, Some(key)))
    }

    /// Stamp a `kid` header on every token this signer produces.
    #[must_use]
    pub fn with_key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = Some(key_id.into());
        self
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    #[must_use]
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    #[must_use]
    pub fn can_verify(&self) -> bool {
        self.decoding_key.is_some()
    }

    /// Sign `claims` and return the compact JWT.
    ///
    /// # Errors
    ///
    /// - `MissingSigningKey` - this signer is verification-only
    /// - `Jwt` - serialization or the signing primitive failed
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, SignerError> {
        let encoding_key = self
            .encoding_key
            .as_ref()
            .ok_or(SignerError::MissingSigningKey)?;

        let mut header = Header::new(self.algorithm);
        header.typ = Some("JWT".to_string());
        header.kid.clone_from(&self.key_id);

        Ok(encode(&header, claims, encoding_key)?)
    }

    /// Verify a compact JWT against this signer and deserialize its claims.
    ///
    /// The size check happens BEFORE any parsing.
    ///
    /// # Errors
    ///
    /// - `TokenTooLarge` - token exceeds `MAX_JWT_SIZE_BYTES`
    /// - `MissingVerificationKey` - this signer is signing-only
    /// - `Jwt` - malformed token, wrong algorithm, bad signature, or claims
    ///   that do not deserialize into `T`
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, SignerError> {
        if token.len() > MAX_JWT_SIZE_BYTES {
            tracing::debug!(
                target: "jwt_service.signer",
                token_size = token.len(),
                max_size = MAX_JWT_SIZE_BYTES,
                "Token rejected: size exceeds maximum allowed"
            );
            return Err(SignerError::TokenTooLarge);
        }

        let decoding_key = self
            .decoding_key
            .as_ref()
            .ok_or(SignerError::MissingVerificationKey)?;

        let token_data = decode::<T>(token, decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

fn invalid_key(e: &jsonwebtoken::errors::Error) -> SignerError {
    SignerError::InvalidKey(e.to_string())
}
