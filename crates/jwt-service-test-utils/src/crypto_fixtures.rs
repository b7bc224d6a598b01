//! Deterministic cryptographic fixtures for testing
//!
//! Provides reproducible Ed25519 keypairs, a checked-in RSA keypair and HMAC
//! secrets. All fixtures are deterministic.

use base64::engine::general_purpose;
use base64::Engine;
use jwt_service::JwtSigner;
use ring::signature::{Ed25519KeyPair, KeyPair};
use thiserror::Error;

/// Shared HMAC secret used across tests.
pub const TEST_SECRET: &[u8] = b"secret";

/// 2048-bit RSA private key (PKCS#1 PEM). Test use only.
pub const TEST_RSA_PRIVATE_PEM: &str = include_str!("../fixtures/rsa_test_private.pem");

/// Public half of [`TEST_RSA_PRIVATE_PEM`] (PKCS#1 PEM).
pub const TEST_RSA_PUBLIC_PEM: &str = include_str!("../fixtures/rsa_test_public.pem");

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Cryptographic operation failed: {0}")]
    Crypto(String),
}

/// Ed25519 key material in the encodings the signer accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestKeyPair {
    /// Raw 32-byte public key.
    pub public_key: Vec<u8>,
    /// PKCS#8 v1 DER private key.
    pub pkcs8: Vec<u8>,
}

impl TestKeyPair {
    /// Private key as a `PRIVATE KEY` PEM document.
    pub fn private_pem(&self) -> String {
        pem("PRIVATE KEY", &self.pkcs8)
    }

    /// Public key as a `PUBLIC KEY` (SubjectPublicKeyInfo) PEM document.
    pub fn public_pem(&self) -> String {
        // SEQUENCE { SEQUENCE { OID 1.3.101.112 }, BIT STRING (0 unused bits) }
        let mut spki = vec![
            0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
        ];
        spki.extend_from_slice(&self.public_key);
        pem("PUBLIC KEY", &spki)
    }
}

/// Generate a deterministic Ed25519 keypair for testing.
///
/// The same seed always produces the same keypair.
///
/// # Example
/// ```rust,ignore
/// let keys = test_keypair(1)?;
/// assert_eq!(keys, test_keypair(1)?);
/// ```
pub fn test_keypair(seed: u8) -> Result<TestKeyPair, FixtureError> {
    let mut seed_bytes = [0u8; 32];
    seed_bytes[0] = seed;
    for (i, byte) in seed_bytes.iter_mut().enumerate().skip(1) {
        *byte = seed.wrapping_mul(i as u8).wrapping_add(i as u8);
    }

    let key_pair = Ed25519KeyPair::from_seed_unchecked(&seed_bytes)
        .map_err(|e| FixtureError::Crypto(format!("Failed to generate test keypair: {:?}", e)))?;

    Ok(TestKeyPair {
        public_key: key_pair.public_key().as_ref().to_vec(),
        pkcs8: build_pkcs8_from_seed(&seed_bytes),
    })
}

/// EdDSA signer holding both halves of the seeded keypair.
pub fn test_ed25519_signer(seed: u8) -> Result<JwtSigner, FixtureError> {
    let keys = test_keypair(seed)?;
    Ok(JwtSigner::ed25519_der(&keys.pkcs8, &keys.public_key))
}

/// EdDSA signer that can only verify tokens from the seeded keypair.
pub fn test_ed25519_verifier(seed: u8) -> Result<JwtSigner, FixtureError> {
    let keys = test_keypair(seed)?;
    Ok(JwtSigner::ed25519_public_der(&keys.public_key))
}

/// RS256 signer holding both halves of the test RSA keypair.
pub fn test_rs256_signer() -> Result<JwtSigner, FixtureError> {
    JwtSigner::rs256_pem(
        TEST_RSA_PRIVATE_PEM.as_bytes(),
        TEST_RSA_PUBLIC_PEM.as_bytes(),
    )
    .map_err(|e| FixtureError::Crypto(format!("Failed to load test RSA keypair: {e}")))
}

/// RS256 signer that can only verify tokens from the test RSA keypair.
pub fn test_rs256_verifier() -> Result<JwtSigner, FixtureError> {
    JwtSigner::rs256_public_pem(TEST_RSA_PUBLIC_PEM.as_bytes())
        .map_err(|e| FixtureError::Crypto(format!("Failed to load test RSA public key: {e}")))
}

/// HS256 signer over [`TEST_SECRET`].
pub fn test_hs256_signer() -> JwtSigner {
    JwtSigner::hs256(TEST_SECRET)
}

/// Build PKCS#8 v1 document from Ed25519 seed
///
/// This is a test-only utility. Production keys come from real key files.
fn build_pkcs8_from_seed(seed: &[u8; 32]) -> Vec<u8> {
    // SEQUENCE {
    //   version         INTEGER (0),
    //   algorithm       AlgorithmIdentifier (1.3.101.112),
    //   privateKey      OCTET STRING { OCTET STRING <seed> }
    // }
    let mut pkcs8 = vec![
        0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04,
        0x20,
    ];
    pkcs8.extend_from_slice(seed);
    pkcs8
}

fn pem(label: &str, der: &[u8]) -> String {
    let body = general_purpose::STANDARD.encode(der);
    format!("-----BEGIN {label}-----\n{body}\n-----END {label}-----\n")
}
