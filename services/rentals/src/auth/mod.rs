//! Bearer-token authorization.
//!
//! # Purpose
//! Groups token validation, the cached key set, the decoded claim set, the
//! permission gate, and the route guard that composes them.
pub mod claims;
pub mod error;
pub mod jwks;
pub mod middleware;
pub mod permissions;
pub mod validator;

pub use claims::ClaimSet;
pub use error::AuthError;
pub use validator::TokenValidator;
