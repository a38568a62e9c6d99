//! Route guard that composes token validation with a permission check.
//!
//! Each guarded handler gets its own [`RequirePermission`] value and is wrapped
//! with `axum::middleware::from_fn_with_state(guard, authorize)`. On success the
//! verified [`ClaimSet`] is placed in request extensions; on failure the handler
//! never runs.
use crate::auth::claims::ClaimSet;
use crate::auth::error::AuthError;
use crate::auth::permissions::require_permission;
use crate::auth::validator::TokenValidator;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Guard state for one protected route.
#[derive(Debug, Clone)]
pub struct RequirePermission {
    pub validator: TokenValidator,
    pub permission: &'static str,
}

impl RequirePermission {
    pub fn new(validator: TokenValidator, permission: &'static str) -> Self {
        Self {
            validator,
            permission,
        }
    }

    async fn check(&self, authorization: Option<&HeaderValue>) -> Result<ClaimSet, AuthError> {
        let claims = self.validator.validate_header(authorization).await?;
        require_permission(&claims, self.permission)?;
        Ok(claims)
    }
}

pub async fn authorize(
    State(guard): State<RequirePermission>,
    mut request: Request,
    next: Next,
) -> Response {
    // The body is not `Sync`, so only the header is held across the await.
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();
    match guard.check(authorization.as_ref()).await {
        Ok(claims) => {
            tracing::debug!(
                permission = guard.permission,
                subject = claims.sub.as_deref().unwrap_or("-"),
                "request authorized"
            );
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            metrics::counter!("rentals_auth_failures_total", "code" => err.code()).increment(1);
            match err {
                AuthError::Unauthorized => tracing::warn!(
                    permission = guard.permission,
                    "request lacks required permission"
                ),
                _ => tracing::debug!(
                    permission = guard.permission,
                    code = err.code(),
                    error = %err,
                    "request rejected"
                ),
            }
            err.into_response()
        }
    }
}
