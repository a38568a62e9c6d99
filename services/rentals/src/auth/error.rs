//! Authorization failure taxonomy.
//!
//! # Purpose
//! Every way the bearer-token pipeline can reject a request, each carrying a
//! stable machine-readable code and the HTTP status it maps to.
//!
//! # Key invariants
//! - Header, token, key, signature and claim failures are 401.
//! - Only [`AuthError::Unauthorized`] (permission absent from a present claim) is 403.
//! - Descriptions never include token contents.
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("malformed authorization header: {0}")]
    MalformedHeader(&'static str),
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid claims: {0}")]
    InvalidClaims(&'static str),
    #[error("permissions claim missing")]
    PermissionsClaimMissing,
    #[error("permission not granted")]
    Unauthorized,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader(_)
            | AuthError::MalformedToken(_)
            | AuthError::InvalidKey(_)
            | AuthError::InvalidSignature => "invalid_header",
            AuthError::ExpiredToken => "token_expired",
            AuthError::InvalidClaims(_) | AuthError::PermissionsClaimMissing => "invalid_claims",
            AuthError::Unauthorized => "unauthorized",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "Authorization header is expected.",
            AuthError::MalformedHeader(reason)
            | AuthError::MalformedToken(reason)
            | AuthError::InvalidKey(reason)
            | AuthError::InvalidClaims(reason) => *reason,
            AuthError::InvalidSignature => "Token signature could not be verified.",
            AuthError::ExpiredToken => "Token expired.",
            AuthError::PermissionsClaimMissing => "Permissions not included in JWT.",
            AuthError::Unauthorized => "Permission not found.",
        }
    }

    pub fn body(&self) -> AuthErrorResponse {
        AuthErrorResponse {
            code: self.code().to_string(),
            description: self.description().to_string(),
        }
    }
}

/// Wire shape of an authorization failure.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuthErrorResponse {
    pub code: String,
    pub description: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unauthorized_is_forbidden() {
        let errors = [
            AuthError::MissingHeader,
            AuthError::MalformedHeader("x"),
            AuthError::MalformedToken("x"),
            AuthError::InvalidKey("x"),
            AuthError::InvalidSignature,
            AuthError::ExpiredToken,
            AuthError::InvalidClaims("x"),
            AuthError::PermissionsClaimMissing,
        ];
        for err in errors {
            assert_eq!(err.status(), StatusCode::UNAUTHORIZED, "{err}");
        }
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AuthError::MissingHeader.code(), "authorization_header_missing");
        assert_eq!(AuthError::MalformedHeader("x").code(), "invalid_header");
        assert_eq!(AuthError::ExpiredToken.code(), "token_expired");
        assert_eq!(AuthError::PermissionsClaimMissing.code(), "invalid_claims");
        assert_eq!(AuthError::Unauthorized.code(), "unauthorized");
    }

    #[test]
    fn body_uses_reason_as_description() {
        let body = AuthError::InvalidKey("Unable to find the appropriate key.").body();
        assert_eq!(body.code, "invalid_header");
        assert_eq!(body.description, "Unable to find the appropriate key.");
    }
}
