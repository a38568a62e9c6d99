//! Bearer token validation against the issuer's published key set.
//!
//! # Purpose
//! Turn a raw `Authorization` header into a verified [`ClaimSet`] or a typed
//! [`AuthError`]. This is the only place tokens are parsed or verified.
//!
//! # Key invariants
//! - The header must be exactly `Bearer <token>`; the scheme is case-sensitive.
//! - The token must have three segments and a `kid` in its header.
//! - Only the configured asymmetric algorithms are accepted. Shared-secret
//!   algorithms are rejected before any key lookup.
//! - The resolved key's `alg` and `kty` must agree with the header algorithm.
//! - `exp`, `nbf`, `iss` and `aud` are validated with the configured leeway.
//!
//! # Security notes
//! Claims are never trusted before the signature check. Token contents are not
//! logged and never appear in error descriptions.
use crate::auth::claims::ClaimSet;
use crate::auth::error::AuthError;
use crate::auth::jwks::JwksCache;
use crate::config::AuthConfig;
use anyhow::Context;
use axum::http::HeaderValue;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, EllipticCurve, Jwk, KeyAlgorithm};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Validates bearer tokens for a single issuer and audience.
///
/// # Example
/// ```rust,no_run
/// use rentals::auth::validator::TokenValidator;
/// use rentals::config::AuthConfig;
///
/// async fn check(config: AuthConfig, header: &str) {
///     let validator = TokenValidator::new(&config).expect("validator");
///     let _ = validator.validate_header_str(header).await;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TokenValidator {
    cache: JwksCache,
    jwks_url: Arc<str>,
    issuer: Arc<str>,
    audience: Arc<str>,
    algorithms: Arc<[Algorithm]>,
    leeway_secs: u64,
}

impl TokenValidator {
    /// Build a validator that fetches keys over HTTP with a bounded timeout.
    ///
    /// # Errors
    /// - The HTTP client cannot be constructed.
    pub fn new(config: &AuthConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.jwks_timeout_ms))
            .build()
            .context("build jwks http client")?;
        let cache = JwksCache::new(
            client,
            Duration::from_secs(config.jwks_ttl_secs),
            Duration::from_secs(config.jwks_min_refresh_secs),
        );
        Ok(Self::with_cache(config, cache))
    }

    /// Build a validator around an existing cache, e.g. [`JwksCache::seeded`].
    pub fn with_cache(config: &AuthConfig, cache: JwksCache) -> Self {
        Self {
            cache,
            jwks_url: Arc::from(config.jwks_url.as_str()),
            issuer: Arc::from(config.issuer.as_str()),
            audience: Arc::from(config.audience.as_str()),
            algorithms: Arc::from(config.algorithms.as_slice()),
            leeway_secs: config.leeway_secs,
        }
    }

    /// Validate the `Authorization` header of a request, if any.
    pub async fn validate_header(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<ClaimSet, AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let value = header
            .to_str()
            .map_err(|_| AuthError::MalformedHeader("Authorization header is not valid text."))?;
        self.validate_header_str(value).await
    }

    pub async fn validate_header_str(&self, header: &str) -> Result<ClaimSet, AuthError> {
        let token = parse_bearer(header)?;
        self.validate(token).await
    }

    /// Verify a raw token and return its claims.
    ///
    /// # Errors
    /// - [`AuthError::MalformedToken`] for structural problems or a disallowed algorithm.
    /// - [`AuthError::InvalidKey`] when no usable key matches the `kid`.
    /// - [`AuthError::InvalidSignature`], [`AuthError::ExpiredToken`] or
    ///   [`AuthError::InvalidClaims`] from verification.
    pub async fn validate(&self, token: &str) -> Result<ClaimSet, AuthError> {
        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken("Token must have three segments."));
        }
        let header = decode_header(token)
            .map_err(|_| AuthError::MalformedToken("Unable to parse authentication token."))?;
        // Reject before fetching keys so forged headers cost nothing.
        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::MalformedToken("Unsupported token algorithm."));
        }
        let kid = header
            .kid
            .as_deref()
            .ok_or(AuthError::MalformedToken("Token header is missing a key id."))?;

        let jwk = self.cache.find_key(&self.jwks_url, kid).await?;
        ensure_jwk_matches_algorithm(&jwk, header.alg)?;
        let decoding_key = DecodingKey::from_jwk(&jwk)
            .map_err(|_| AuthError::InvalidKey("Unable to find the appropriate key."))?;

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.as_ref()]);
        validation.set_audience(&[self.audience.as_ref()]);
        validation.validate_nbf = true;
        validation
            .required_spec_claims
            .extend(["iss".to_string(), "aud".to_string()]);
        validation.leeway = self.leeway_secs;

        let data = decode::<Value>(token, &decoding_key, &validation).map_err(map_jwt_error)?;
        serde_json::from_value(data.claims).map_err(|_| {
            AuthError::InvalidClaims("Incorrect claims. Please, check the audience and issuer.")
        })
    }
}

/// Split `Bearer <token>` and return the token.
///
/// The literal `Bearer` with nothing after it is malformed, not an empty token.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let mut parts = header.split(' ');
    let scheme = parts.next().unwrap_or_default();
    if scheme != "Bearer" {
        return Err(AuthError::MalformedHeader("Authorization header must start with \"Bearer\"."));
    }
    let token = match parts.next() {
        Some(token) if !token.is_empty() => token,
        _ => return Err(AuthError::MalformedHeader("Token not found.")),
    };
    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader("Authorization header must be bearer token."));
    }
    Ok(token)
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidSignature => AuthError::InvalidSignature,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_) => {
            AuthError::InvalidClaims("Incorrect claims. Please, check the audience and issuer.")
        }
        _ => AuthError::MalformedToken("Unable to parse authentication token."),
    }
}

/// Symmetric algorithms have no public key and are never acceptable here.
pub fn is_asymmetric(alg: Algorithm) -> bool {
    !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn key_algorithm_for(alg: Algorithm) -> Option<KeyAlgorithm> {
    Some(match alg {
        Algorithm::RS256 => KeyAlgorithm::RS256,
        Algorithm::RS384 => KeyAlgorithm::RS384,
        Algorithm::RS512 => KeyAlgorithm::RS512,
        Algorithm::PS256 => KeyAlgorithm::PS256,
        Algorithm::PS384 => KeyAlgorithm::PS384,
        Algorithm::PS512 => KeyAlgorithm::PS512,
        Algorithm::ES256 => KeyAlgorithm::ES256,
        Algorithm::ES384 => KeyAlgorithm::ES384,
        Algorithm::EdDSA => KeyAlgorithm::EdDSA,
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => return None,
    })
}

fn ensure_jwk_matches_algorithm(jwk: &Jwk, alg: Algorithm) -> Result<(), AuthError> {
    const MISMATCH: AuthError = AuthError::InvalidKey("Unable to find the appropriate key.");

    // Issuers may omit `alg` on a key; `kty` is then the only constraint.
    if let Some(key_alg) = jwk.common.key_algorithm
        && Some(key_alg) != key_algorithm_for(alg)
    {
        return Err(MISMATCH);
    }
    let matches = match (&jwk.algorithm, alg) {
        (
            AlgorithmParameters::RSA(_),
            Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512,
        ) => true,
        (AlgorithmParameters::EllipticCurve(params), Algorithm::ES256) => {
            params.curve == EllipticCurve::P256
        }
        (AlgorithmParameters::EllipticCurve(params), Algorithm::ES384) => {
            params.curve == EllipticCurve::P384
        }
        (AlgorithmParameters::OctetKeyPair(params), Algorithm::EdDSA) => {
            params.curve == EllipticCurve::Ed25519
        }
        _ => false,
    };
    if matches { Ok(()) } else { Err(MISMATCH) }
}
