//! Decoded claim set of a verified bearer token.
//!
//! # Purpose
//! A closed struct holding only the claims this service consumes. Any other
//! claim in the token payload is ignored during deserialization.
//!
//! # Lifecycle
//! Built per request by [`crate::auth::validator::TokenValidator`], handed to
//! handlers through request extensions, and dropped with the request.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// `aud` may be a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

impl Audience {
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Audience::One(value) => value == audience,
            Audience::Many(values) => values.iter().any(|value| value == audience),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    pub iss: String,
    pub aud: Audience,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// `None` when the token carries no `permissions` claim at all, which is
    /// distinct from an empty set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeSet<String>>,
}

impl ClaimSet {
    /// Exact, case-sensitive membership. `false` when the claim is absent.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions
            .as_ref()
            .is_some_and(|perms| perms.contains(permission))
    }
}
