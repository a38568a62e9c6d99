//! Permission names and the gate that checks them.
//!
//! A permission is an opaque string granted through the token's `permissions`
//! claim. Matching is exact set membership with no wildcard or prefix rules.
use crate::auth::claims::ClaimSet;
use crate::auth::error::AuthError;

pub const CREATE_MOVIE: &str = "create:movie";
pub const UPDATE_MOVIE: &str = "update:movie";
pub const DELETE_MOVIE: &str = "delete:movie";
pub const RENT_MOVIE: &str = "rent:movie";

/// Check that `claims` grant `permission`.
///
/// # Errors
/// - [`AuthError::PermissionsClaimMissing`] (401) when the token has no
///   `permissions` claim at all.
/// - [`AuthError::Unauthorized`] (403) when the claim is present but lacks
///   `permission`.
pub fn require_permission(claims: &ClaimSet, permission: &str) -> Result<(), AuthError> {
    if claims.permissions.is_none() {
        return Err(AuthError::PermissionsClaimMissing);
    }
    if !claims.has_permission(permission) {
        return Err(AuthError::Unauthorized);
    }
    Ok(())
}
