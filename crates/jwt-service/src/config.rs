//! Token service configuration.
//!
//! Configuration is loaded from environment variables. Key material is held
//! in `SecretString` and redacted in Debug output.
//!
//! | Variable | Required | Meaning |
//! |---|---|---|
//! | `SERVICE_IDENTIFIER` | yes | this service's identifier |
//! | `SERVICE_KEY` | yes | key spec verifying inbound tokens |
//! | `RECIPIENT_KEYS` | no | `name=spec` pairs separated by `;` |
//! | `TRUSTED_SENDERS` | no | comma-separated allow-list; unset means open trust |
//!
//! Key specs are `hs256:<secret>`, `hs384:<secret>`, `hs512:<secret>`,
//! `rs256:<pem-file>` or `eddsa:<pem-file>`. A PEM file containing a
//! `PRIVATE KEY` block yields a signing key, anything else a verification key.

use crate::policy::{SenderPolicy, StaticTrustPolicy};
use crate::service::TokenService;
use crate::signer::JwtSigner;
use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, SecretString};
use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid key spec for {0}: expected <algorithm>:<material>")]
    InvalidKeySpec(String),

    #[error("Unsupported key algorithm for {0}: {1}")]
    UnsupportedAlgorithm(String, String),

    #[error("Invalid RECIPIENT_KEYS entry: {0}")]
    InvalidRecipientKeys(String),

    #[error("Failed to load key for {0}: {1}")]
    KeyLoad(String, String),
}

/// Where a signer's key material comes from.
#[derive(Debug, Clone)]
pub enum KeySpec {
    /// Shared HMAC secret given inline.
    Hmac {
        algorithm: Algorithm,
        secret: SecretString,
    },
    /// PEM file for an asymmetric algorithm.
    PemFile { algorithm: Algorithm, path: PathBuf },
}

impl KeySpec {
    /// Parse `<algorithm>:<material>`.
    ///
    /// `owner` names the variable or recipient in error messages; the
    /// material itself is never echoed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeySpec` for malformed specs and
    /// `UnsupportedAlgorithm` for unknown algorithm names.
    pub fn parse(owner: &str, spec: &str) -> Result<Self, ConfigError> {
        let (algorithm, material) = spec
            .split_once(':')
            .filter(|(_, material)| !material.is_empty())
            .ok_or_else(|| ConfigError::InvalidKeySpec(owner.to_string()))?;

        match algorithm.to_ascii_lowercase().as_str() {
            "hs256" => Ok(Self::hmac(Algorithm::HS256, material)),
            "hs384" => Ok(Self::hmac(Algorithm::HS384, material)),
            "hs512" => Ok(Self::hmac(Algorithm::HS512, material)),
            "rs256" => Ok(Self::PemFile {
                algorithm: Algorithm::RS256,
                path: PathBuf::from(material),
            }),
            "eddsa" => Ok(Self::PemFile {
                algorithm: Algorithm::EdDSA,
                path: PathBuf::from(material),
            }),
            other => Err(ConfigError::UnsupportedAlgorithm(
                owner.to_string(),
                other.to_string(),
            )),
        }
    }

    fn hmac(algorithm: Algorithm, secret: &str) -> Self {
        Self::Hmac {
            algorithm,
            secret: SecretString::from(secret),
        }
    }

    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Hmac { algorithm, .. } | Self::PemFile { algorithm, .. } => *algorithm,
        }
    }

    /// Materialize the signer, reading PEM files from disk.
    ///
    /// # Errors
    ///
    /// Returns `KeyLoad` if the file cannot be read or parsed.
    pub fn load(&self, owner: &str) -> Result<JwtSigner, ConfigError> {
        match self {
            Self::Hmac { algorithm, secret } => {
                let secret = secret.expose_secret().as_bytes();
                match algorithm {
                    Algorithm::HS384 => Ok(JwtSigner::hs384(secret)),
                    Algorithm::HS512 => Ok(JwtSigner::hs512(secret)),
                    _ => Ok(JwtSigner::hs256(secret)),
                }
            }
            Self::PemFile { algorithm, path } => {
                let pem = std::fs::read(path)
                    .map_err(|e| ConfigError::KeyLoad(owner.to_string(), e.to_string()))?;
                let is_private = String::from_utf8_lossy(&pem).contains("PRIVATE KEY");

                let signer = match (algorithm, is_private) {
                    (Algorithm::EdDSA, true) => JwtSigner::ed25519_private_pem(&pem),
                    (Algorithm::EdDSA, false) => JwtSigner::ed25519_public_pem(&pem),
                    (_, true) => JwtSigner::rs256_private_pem(&pem),
                    (_, false) => JwtSigner::rs256_public_pem(&pem),
                };
                signer.map_err(|e| ConfigError::KeyLoad(owner.to_string(), e.to_string()))
            }
        }
    }
}

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// This service's identifier.
    pub identifier: String,

    /// Key verifying inbound tokens.
    pub service_key: KeySpec,

    /// Keys for signing outbound tokens, by recipient.
    pub recipient_keys: Vec<(String, KeySpec)>,

    /// Which senders are trusted.
    pub trusted_senders: SenderPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`Config::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a key spec
    /// or recipient entry is malformed.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let identifier = vars
            .get("SERVICE_IDENTIFIER")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("SERVICE_IDENTIFIER".to_string()))?;

        let service_key = vars
            .get("SERVICE_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("SERVICE_KEY".to_string()))
            .and_then(|spec| KeySpec::parse("SERVICE_KEY", spec))?;

        let recipient_keys = match vars.get("RECIPIENT_KEYS") {
            Some(value) => parse_recipient_keys(value)?,
            None => Vec::new(),
        };

        let trusted_senders = match vars.get("TRUSTED_SENDERS") {
            Some(value) => SenderPolicy::AllowList(parse_senders(value)),
            None => {
                tracing::warn!(
                    target: "jwt_service.config",
                    "TRUSTED_SENDERS not set: configuring open trust mode"
                );
                SenderPolicy::Open
            }
        };

        Ok(Config {
            identifier,
            service_key,
            recipient_keys,
            trusted_senders,
        })
    }

    /// Build the trust policy described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `KeyLoad` if a recipient key cannot be loaded.
    pub fn build_policy(&self) -> Result<StaticTrustPolicy, ConfigError> {
        let keys = self
            .recipient_keys
            .iter()
            .map(|(recipient, spec)| Ok((recipient.clone(), spec.load(recipient)?)))
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(StaticTrustPolicy::new(keys, self.trusted_senders.clone()))
    }

    /// Build the token service described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `KeyLoad` if any key cannot be loaded.
    pub fn build_service(&self) -> Result<TokenService, ConfigError> {
        let verifier = self.service_key.load("SERVICE_KEY")?;
        let policy = self.build_policy()?;

        tracing::info!(
            target: "jwt_service.config",
            algorithm = ?self.service_key.algorithm(),
            recipients = self.recipient_keys.len(),
            open_trust = self.trusted_senders.is_open(),
            "Token service configured"
        );

        Ok(TokenService::new(
            verifier,
            Arc::new(policy),
            self.identifier.clone(),
        ))
    }
}

fn parse_recipient_keys(value: &str) -> Result<Vec<(String, KeySpec)>, ConfigError> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for entry in value.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (recipient, spec) = entry
            .split_once('=')
            .map(|(recipient, spec)| (recipient.trim(), spec.trim()))
            .filter(|(recipient, _)| !recipient.is_empty())
            .ok_or_else(|| {
                ConfigError::InvalidRecipientKeys("expected <recipient>=<key spec>".to_string())
            })?;

        if !seen.insert(recipient.to_string()) {
            return Err(ConfigError::InvalidRecipientKeys(format!(
                "duplicate recipient '{recipient}'"
            )));
        }

        keys.push((recipient.to_string(), KeySpec::parse(recipient, spec)?));
    }

    Ok(keys)
}

fn parse_senders(value: &str) -> HashSet<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|sender| !sender.is_empty())
        .map(ToString::to_string)
        .collect()
}
