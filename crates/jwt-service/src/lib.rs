//! Service-to-service JWT authentication.
//!
//! A [`TokenService`] holds one service identity. It verifies inbound bearer
//! tokens addressed to that identity and issues outbound tokens signed with
//! the key its [`TrustPolicy`] supplies for each recipient.
//!
//! ```rust,ignore
//! use jwt_service::{Config, ServiceToken};
//! use std::time::Duration;
//!
//! let service = Config::from_env()?.build_service()?;
//!
//! // Inbound
//! let token: ServiceToken = service.decode(&headers)?;
//!
//! // Outbound
//! let jwt = service.encode(|from| ServiceToken::new(from, "billing", Duration::from_secs(60)))?;
//! ```

#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod extract;
pub mod headers;
pub mod middleware;
pub mod observability;
pub mod payload;
pub mod policy;
pub mod service;
pub mod signer;

pub use config::{Config, ConfigError, KeySpec};
pub use error::TokenError;
pub use extract::Authenticated;
pub use headers::{HeaderSource, AUTHORIZATION};
pub use middleware::{require_auth, PayloadExt};
pub use payload::{Payload, PayloadError, ServiceToken, DEFAULT_CLOCK_SKEW, MAX_JWT_SIZE_BYTES};
pub use policy::{SenderPolicy, StaticTrustPolicy, TrustPolicy};
pub use service::TokenService;
pub use signer::{JwtSigner, SignerError};
