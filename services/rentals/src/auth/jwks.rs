//! Cached retrieval of the issuer's published key set.
//!
//! # Purpose
//! Resolve a token's `kid` to a public JWK, fetching the issuer's JWKS over HTTP
//! only when the cached copy has expired or does not know the key.
//!
//! # Key invariants
//! - A key set is replaced wholesale on refresh; it is never patched in place.
//! - A lookup miss triggers at most one refresh, and refreshes driven by misses
//!   are spaced by `min_refresh_interval` so unknown `kid`s cannot flood the issuer.
//! - Any fetch failure (timeout, transport, bad JSON) becomes
//!   [`AuthError::InvalidKey`]; callers never wait longer than the client timeout.
//! - Seeded key sets are pinned: they never expire and are never refetched.
//!
//! # Concurrency model
//! Entries live in a `DashMap` shared by every clone of the cache. Concurrent
//! misses may fetch in parallel; the last writer wins, which is harmless because
//! all writers store a complete key set.
use crate::auth::error::AuthError;
use dashmap::DashMap;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct JwksCache {
    client: reqwest::Client,
    entries: Arc<DashMap<String, CachedJwks>>,
    ttl: Duration,
    min_refresh_interval: Duration,
}

#[derive(Debug, Clone)]
struct CachedJwks {
    jwks: Arc<JwkSet>,
    fetched_at: Instant,
    pinned: bool,
}

impl JwksCache {
    pub fn new(client: reqwest::Client, ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            client,
            entries: Arc::new(DashMap::new()),
            ttl,
            min_refresh_interval,
        }
    }

    /// Pin a static key set for `url`. Lookups against it never touch the network.
    pub fn seeded(url: &str, jwks: JwkSet) -> Self {
        let cache = Self::new(reqwest::Client::new(), Duration::ZERO, Duration::ZERO);
        cache.entries.insert(
            url.to_string(),
            CachedJwks {
                jwks: Arc::new(jwks),
                fetched_at: Instant::now(),
                pinned: true,
            },
        );
        cache
    }

    /// Find the JWK with `kid` in the key set published at `url`.
    ///
    /// # Errors
    /// - [`AuthError::InvalidKey`] if the key is unknown after a refresh, or the
    ///   key set cannot be fetched.
    pub async fn find_key(&self, url: &str, kid: &str) -> Result<Jwk, AuthError> {
        // Copy the entry out so no map guard is held across the fetch below.
        let cached = self.entries.get(url).map(|entry| entry.clone());
        if let Some(entry) = &cached {
            let fresh = entry.pinned || entry.fetched_at.elapsed() < self.ttl;
            if fresh {
                if let Some(key) = find_jwk(&entry.jwks, kid) {
                    return Ok(key.clone());
                }
                if entry.pinned || entry.fetched_at.elapsed() < self.min_refresh_interval {
                    return Err(AuthError::InvalidKey("Unable to find the appropriate key."));
                }
            }
        }

        let jwks = self.refresh(url).await?;
        find_jwk(&jwks, kid)
            .cloned()
            .ok_or(AuthError::InvalidKey("Unable to find the appropriate key."))
    }

    async fn refresh(&self, url: &str) -> Result<Arc<JwkSet>, AuthError> {
        let jwks = match self.fetch(url).await {
            Ok(jwks) => Arc::new(jwks),
            Err(err) => {
                metrics::counter!("rentals_jwks_fetches_total", "outcome" => "error").increment(1);
                tracing::warn!(error = %err, "failed to fetch signing key set");
                return Err(AuthError::InvalidKey("Unable to fetch signing keys."));
            }
        };
        metrics::counter!("rentals_jwks_fetches_total", "outcome" => "ok").increment(1);
        tracing::debug!(keys = jwks.keys.len(), "refreshed signing key set");
        self.entries.insert(
            url.to_string(),
            CachedJwks {
                jwks: jwks.clone(),
                fetched_at: Instant::now(),
                pinned: false,
            },
        );
        Ok(jwks)
    }

    async fn fetch(&self, url: &str) -> Result<JwkSet, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

fn find_jwk<'a>(jwks: &'a JwkSet, kid: &str) -> Option<&'a Jwk> {
    jwks.keys
        .iter()
        .find(|key| key.common.key_id.as_deref() == Some(kid))
}
